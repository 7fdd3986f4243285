//! 导入任务批处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责任务文件的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、打开存储、组装 `PortalApi`
//! 2. **批量加载**：扫描并加载所有待处理的导入任务（`Vec<ImportJob>`）
//! 3. **顺序处理**：任务之间、题目之间都不并发
//! 4. **警告记录**：写入失败 / 默认答案的题目写入 warn.txt
//! 5. **文件清理**：完全成功的任务文件删除
//! 6. **全局统计**：汇总所有任务的处理结果
//!
//! Ctrl-C 触发取消：当前题目写完后停止，后续任务不再执行。

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api::PortalApi;
use crate::config::Config;
use crate::infrastructure::{JsonFileStore, SystemClock};
use crate::models::ImportJob;
use crate::orchestrator::import_processor::{BatchOutcome, ImportRequest};
use crate::services::{WarnKind, WarnWriter};
use crate::utils::logging::{self, RunStats};

/// 应用主结构
pub struct App {
    config: Config,
    api: PortalApi,
    warn_writer: WarnWriter,
    cancel: CancellationToken,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);

        let store = JsonFileStore::open(&config.store_path)
            .await
            .with_context(|| format!("无法打开存储文件: {}", config.store_path))?;
        let api = PortalApi::new(Arc::new(store), Arc::new(SystemClock), &config);

        Ok(Self {
            warn_writer: WarnWriter::with_path(config.warn_file.clone()),
            config,
            api,
            cancel: CancellationToken::new(),
        })
    }

    pub fn api(&self) -> &PortalApi {
        &self.api
    }

    /// 取消令牌，可交给外部触发
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        let jobs = self.load_jobs().await?;

        if jobs.is_empty() {
            warn!("⚠️ 没有找到待处理的TOML文件，程序结束");
            return Ok(RunStats::default());
        }

        logging::log_jobs_loaded(jobs.len());

        let token = self.cancel.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("🛑 收到中断信号，当前题目完成后停止");
                token.cancel();
            }
        });

        let stats = self.process_all_jobs(&jobs).await;
        ctrl_c.abort();

        logging::print_final_stats(&stats, &self.config.output_log_file);
        Ok(stats)
    }

    async fn load_jobs(&self) -> Result<Vec<ImportJob>> {
        info!("\n📁 正在扫描待处理的导入任务...");
        crate::models::load_all_import_jobs(&self.config.import_folder)
            .await
            .context("无法加载导入任务")
    }

    /// 按顺序处理所有任务
    pub async fn process_all_jobs(&self, jobs: &[ImportJob]) -> RunStats {
        let mut stats = RunStats {
            jobs_total: jobs.len(),
            ..Default::default()
        };

        for (idx, job) in jobs.iter().enumerate() {
            if self.cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            let job_index = idx + 1;
            logging::log_job_start(job_index, jobs.len(), &job.display_name(), &job.exam_id);

            let request = ImportRequest::from(job);
            match self.api.bulk_import(&request, &self.cancel).await {
                Ok(outcome) => {
                    stats.questions_saved += outcome.saved.len();
                    stats.questions_failed += outcome.failures.len();
                    stats.fallbacks += outcome.fallbacks.len();
                    stats.cancelled |= outcome.cancelled;

                    if let Err(e) = self.record_warnings(&outcome).await {
                        error!("[任务 {}] 写入警告文件失败: {}", job_index, e);
                    }

                    if outcome.is_complete() {
                        stats.jobs_succeeded += 1;
                        self.cleanup_file(job, job_index).await;
                    } else {
                        warn!(
                            "[任务 {}] ⚠️ 未完全成功 (保存 {}/{})，保留任务文件",
                            job_index,
                            outcome.saved.len(),
                            outcome.total
                        );
                    }
                }
                Err(e) => {
                    error!("[任务 {}] ❌ 导入被拒绝: {}", job_index, e);
                }
            }
        }

        stats
    }

    /// 失败和默认答案的题目写入 warn.txt
    async fn record_warnings(&self, outcome: &BatchOutcome) -> Result<()> {
        for failure in &outcome.failures {
            self.warn_writer
                .write(
                    WarnKind::WriteFailed,
                    &outcome.exam_id,
                    failure.index + 1,
                    &failure.stem,
                    &failure.reason,
                )
                .await?;
        }
        for fallback in &outcome.fallbacks {
            let stem = self
                .api
                .get_question_by_id(&fallback.question_id)
                .await?
                .map(|q| q.stem_text())
                .unwrap_or_default();
            self.warn_writer
                .write(
                    WarnKind::AnswerFallback,
                    &outcome.exam_id,
                    fallback.index + 1,
                    &stem,
                    &fallback.raw_answer,
                )
                .await?;
        }
        Ok(())
    }

    /// 清理已完全导入的任务文件
    async fn cleanup_file(&self, job: &ImportJob, job_index: usize) {
        if !self.config.delete_imported_files {
            return;
        }
        let Some(file_path) = job.file_path.as_deref() else {
            warn!("[任务 {}] ⚠️ 文件路径未设置", job_index);
            return;
        };

        match tokio::fs::remove_file(file_path).await {
            Ok(()) => info!(
                "[任务 {}] 🗑️ 文件已删除: {}",
                job_index,
                Path::new(file_path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
            Err(e) => warn!("[任务 {}] ⚠️ 无法删除文件 {}: {}", job_index, file_path, e),
        }
    }
}

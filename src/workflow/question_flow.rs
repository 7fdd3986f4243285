//! 单题保存流程 - 流程层
//!
//! 核心职责：定义"一道题"的保存流程
//!
//! 流程顺序：
//! 1. 打印题干预览
//! 2. RetryingWriter 包裹 upsert_question（失败等待后重试一次）
//! 3. 返回结果，是否跳过由调用方决定

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::AppResult;
use crate::models::Question;
use crate::services::{QuestionRepository, RetryingWriter};
use crate::utils::truncate_text;
use crate::workflow::question_ctx::ImportCtx;

/// 题干预览长度
const STEM_PREVIEW_CHARS: usize = 40;

/// 单题保存结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// 第一次加入试卷
    Added,
    /// 题目已在试卷中，只更新了题目记录
    Updated,
}

/// 单题保存流程
///
/// - 不持有任何资源，只依赖仓储和重试能力
/// - 不决定失败策略：批量导入跳过，手动保存中止
pub struct QuestionFlow {
    repository: Arc<QuestionRepository>,
    writer: RetryingWriter,
    verbose_logging: bool,
}

impl QuestionFlow {
    pub fn new(
        repository: Arc<QuestionRepository>,
        writer: RetryingWriter,
        verbose_logging: bool,
    ) -> Self {
        Self {
            repository,
            writer,
            verbose_logging,
        }
    }

    pub async fn run(&self, question: &Question, ctx: &ImportCtx) -> AppResult<SaveResult> {
        if self.verbose_logging {
            debug!(
                "{} 题干: {}",
                ctx,
                truncate_text(&question.stem_text(), STEM_PREVIEW_CHARS)
            );
        }

        info!("{} 📤 正在保存题目 {} ...", ctx, question.id);

        let operation = format!("保存题目 {}", question.id);
        let repository: &QuestionRepository = &self.repository;
        let exam_id = ctx.exam_id.as_str();

        match self
            .writer
            .execute(&operation, move || repository.upsert_question(exam_id, question))
            .await
        {
            Ok(outcome) if outcome.newly_added => {
                info!(
                    "{} ✓ 已加入试卷 (试卷题目数: {})",
                    ctx, outcome.question_count
                );
                Ok(SaveResult::Added)
            }
            Ok(_) => {
                info!("{} ✓ 题目已存在，已更新内容", ctx);
                Ok(SaveResult::Updated)
            }
            Err(e) => {
                error!("{} ❌ 保存失败: {}", ctx, e);
                Err(e)
            }
        }
    }
}

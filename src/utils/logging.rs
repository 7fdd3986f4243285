use anyhow::{Context, Result};
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 安装全局 tracing 订阅器
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 `debug` 或 `info`。重复调用无副作用。
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件（覆盖上一次运行的内容）
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n题目导入日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法初始化日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量题目导入模式");
    info!("💾 存储文件: {}", config.store_path);
    info!(
        "⏱️ 题目间隔: {} ms | 重试等待: {} ms",
        config.bulk_item_delay_ms, config.retry_backoff_ms
    );
    info!("{}", "=".repeat(60));
}

/// 记录导入任务加载信息
pub fn log_jobs_loaded(total: usize) {
    info!("✓ 找到 {} 个待处理的导入任务", total);
    info!("💡 任务按顺序逐个执行，每道题之间保持固定间隔\n");
}

/// 记录单个任务开始
pub fn log_job_start(job_index: usize, total_jobs: usize, name: &str, exam_id: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 个任务: {}", job_index, total_jobs, name);
    info!("📄 目标试卷: {}", exam_id);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 完整成功的任务: {}/{}", stats.jobs_succeeded, stats.jobs_total);
    info!("📝 已保存题目: {}", stats.questions_saved);
    info!("❌ 写入失败题目: {}", stats.questions_failed);
    info!("⚠️ 使用默认答案: {}", stats.fallbacks);
    if stats.cancelled {
        info!("🛑 运行被中断，剩余任务未执行");
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 整次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub jobs_total: usize,
    pub jobs_succeeded: usize,
    pub questions_saved: usize,
    pub questions_failed: usize,
    pub fallbacks: usize,
    pub cancelled: bool,
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数（按 char 计算，不会切坏中文）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

//! 写入重试 - 业务能力层
//!
//! 只负责"执行一次逻辑写入，失败后等待再重试一次"，不关心写的是什么。
//! 两次都失败时返回 `AppError::WriteFailure`，由调用方决定跳过还是中止。

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// 最多执行两次：首次 + 一次重试
const MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct RetryingWriter {
    backoff: Duration,
}

impl RetryingWriter {
    /// # 参数
    /// - `backoff`: 第一次失败后、重试前的等待时间
    pub fn new(backoff: Duration) -> Self {
        Self { backoff }
    }

    /// 执行一次逻辑写入
    ///
    /// `op` 每次调用都要重新发起完整的写入。不值得重试的错误（记录不存在等）直接返回。
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let first_error = match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => e,
        };

        warn!(
            "⚠️ {} 失败: {}，{} 毫秒后重试...",
            operation,
            first_error,
            self.backoff.as_millis()
        );
        sleep(self.backoff).await;

        match op().await {
            Ok(value) => {
                info!("✓ {} 重试成功", operation);
                Ok(value)
            }
            Err(e) => Err(AppError::WriteFailure {
                operation: operation.to_string(),
                attempts: MAX_ATTEMPTS,
                source: Box::new(e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_wait() {
        let writer = RetryingWriter::new(Duration::from_secs(1));
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let start = Instant::now();

        let value = writer
            .execute("写入", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AppError>(7)
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_once_after_backoff() {
        let writer = RetryingWriter::new(Duration::from_millis(1000));
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let start = Instant::now();

        let result = writer
            .execute("写入", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AppError::store_unavailable("put", "throttled"))
                } else {
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_failure_is_terminal() {
        let writer = RetryingWriter::new(Duration::from_millis(10));
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let err = writer
            .execute("保存题目 q1", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AppError::store_unavailable("put", "throttled"))
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match err {
            AppError::WriteFailure {
                operation,
                attempts,
                ..
            } => {
                assert_eq!(operation, "保存题目 q1");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let writer = RetryingWriter::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let err = writer
            .execute("保存题目", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AppError::not_found("Exam", "missing"))
            })
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

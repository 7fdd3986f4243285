#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use exam_question_import::error::AppResult;
use exam_question_import::infrastructure::{
    keys, Index, ItemKey, KvStore, ManualClock, MemoryStore, StoredItem, Table,
};
use exam_question_import::{Config, PortalApi};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 固定起点的手动时钟
pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
    ))
}

/// 测试用配置：间隔 500 ms，重试等待 1000 ms
pub fn test_config() -> Config {
    Config {
        bulk_item_delay_ms: 500,
        retry_backoff_ms: 1000,
        ..Config::default()
    }
}

pub fn portal(store: Arc<dyn KvStore>, clock: Arc<ManualClock>) -> PortalApi {
    PortalApi::new(store, clock, &test_config())
}

/// 对题目表写入失败的存储
///
/// 前 `fail_first` 次题目写入失败；id 以 `fail_suffixes` 中任一后缀结尾的题目永远失败。
/// 知识点表的覆盖写入（计数递增）前 `fail_topic_puts` 次失败。
pub struct FlakyStore {
    inner: MemoryStore,
    fail_first: AtomicUsize,
    fail_suffixes: Vec<String>,
    fail_topic_puts: AtomicUsize,
    pub question_puts: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_first(n: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_first: AtomicUsize::new(n),
            fail_suffixes: Vec::new(),
            fail_topic_puts: AtomicUsize::new(0),
            question_puts: AtomicUsize::new(0),
        }
    }

    pub fn always_failing(suffixes: &[&str]) -> Self {
        Self {
            fail_suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            ..Self::failing_first(0)
        }
    }

    pub fn failing_topic_puts(n: usize) -> Self {
        Self {
            fail_topic_puts: AtomicUsize::new(n),
            ..Self::failing_first(0)
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl KvStore for FlakyStore {
    async fn put(&self, table: Table, item: StoredItem) -> AppResult<()> {
        if table == Table::Topics {
            let remaining = self.fail_topic_puts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_topic_puts.store(remaining - 1, Ordering::SeqCst);
                return Err(exam_question_import::AppError::store_unavailable(
                    "put",
                    "throughput exceeded",
                ));
            }
        }
        if table == Table::ExamQuestions {
            self.question_puts.fetch_add(1, Ordering::SeqCst);
            let id = keys::strip_entity(&item.key.pk);
            if self.fail_suffixes.iter().any(|f| id.ends_with(f.as_str())) {
                return Err(exam_question_import::AppError::store_unavailable(
                    "put",
                    "permanent failure",
                ));
            }
            let remaining = self.fail_first.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_first.store(remaining - 1, Ordering::SeqCst);
                return Err(exam_question_import::AppError::store_unavailable(
                    "put",
                    "throughput exceeded",
                ));
            }
        }
        self.inner.put(table, item).await
    }

    async fn put_if_absent(&self, table: Table, item: StoredItem) -> AppResult<bool> {
        self.inner.put_if_absent(table, item).await
    }

    async fn get(&self, table: Table, key: &ItemKey) -> AppResult<Option<StoredItem>> {
        self.inner.get(table, key).await
    }

    async fn delete(&self, table: Table, key: &ItemKey) -> AppResult<bool> {
        self.inner.delete(table, key).await
    }

    async fn query(&self, table: Table, pk: &str) -> AppResult<Vec<StoredItem>> {
        self.inner.query(table, pk).await
    }

    async fn query_index(&self, table: Table, index: Index, pk: &str) -> AppResult<Vec<StoredItem>> {
        self.inner.query_index(table, index, pk).await
    }

    async fn scan(&self, table: Table) -> AppResult<Vec<StoredItem>> {
        self.inner.scan(table).await
    }
}

/// 统计试卷分区查询次数的存储
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub exam_queries: AtomicUsize,
}

impl CountingStore {
    pub fn exam_queries(&self) -> usize {
        self.exam_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KvStore for CountingStore {
    async fn put(&self, table: Table, item: StoredItem) -> AppResult<()> {
        self.inner.put(table, item).await
    }

    async fn put_if_absent(&self, table: Table, item: StoredItem) -> AppResult<bool> {
        self.inner.put_if_absent(table, item).await
    }

    async fn get(&self, table: Table, key: &ItemKey) -> AppResult<Option<StoredItem>> {
        self.inner.get(table, key).await
    }

    async fn delete(&self, table: Table, key: &ItemKey) -> AppResult<bool> {
        self.inner.delete(table, key).await
    }

    async fn query(&self, table: Table, pk: &str) -> AppResult<Vec<StoredItem>> {
        if table == Table::Exams {
            self.exam_queries.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.query(table, pk).await
    }

    async fn query_index(&self, table: Table, index: Index, pk: &str) -> AppResult<Vec<StoredItem>> {
        self.inner.query_index(table, index, pk).await
    }

    async fn scan(&self, table: Table) -> AppResult<Vec<StoredItem>> {
        self.inner.scan(table).await
    }
}

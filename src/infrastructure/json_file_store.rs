//! JSON 文件存储 - 基础设施层
//!
//! 内存中保存全部数据，每次修改后把完整快照写回文件。
//! 只适用于数据量不大的场景（单机导入工具）。

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AppError, AppResult};

use super::memory_store::{MemoryStore, StoreSnapshot};
use super::store::{Index, ItemKey, KvStore, StoredItem, Table};

pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    // 串行化落盘，避免两次写文件交错
    flush_lock: Mutex<()>,
}

impl JsonFileStore {
    /// 打开存储文件，文件不存在时从空存储开始
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let path_text = path.display().to_string();

        let inner = match fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => MemoryStore::new(),
            Ok(content) => {
                let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
                MemoryStore::from_snapshot(snapshot)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("存储文件不存在，使用空存储: {}", path_text);
                MemoryStore::new()
            }
            Err(e) => return Err(AppError::file_read_failed(path_text, e)),
        };

        Ok(Self {
            path,
            inner,
            flush_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self) -> AppResult<()> {
        let _guard = self.flush_lock.lock().await;
        let content = serde_json::to_string_pretty(&self.inner.snapshot())?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))
    }
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn put(&self, table: Table, item: StoredItem) -> AppResult<()> {
        self.inner.put(table, item).await?;
        self.flush().await
    }

    async fn put_if_absent(&self, table: Table, item: StoredItem) -> AppResult<bool> {
        let inserted = self.inner.put_if_absent(table, item).await?;
        if inserted {
            self.flush().await?;
        }
        Ok(inserted)
    }

    async fn get(&self, table: Table, key: &ItemKey) -> AppResult<Option<StoredItem>> {
        self.inner.get(table, key).await
    }

    async fn delete(&self, table: Table, key: &ItemKey) -> AppResult<bool> {
        let existed = self.inner.delete(table, key).await?;
        if existed {
            self.flush().await?;
        }
        Ok(existed)
    }

    async fn query(&self, table: Table, pk: &str) -> AppResult<Vec<StoredItem>> {
        self.inner.query(table, pk).await
    }

    async fn query_index(
        &self,
        table: Table,
        index: Index,
        pk: &str,
    ) -> AppResult<Vec<StoredItem>> {
        self.inner.query_index(table, index, pk).await
    }

    async fn scan(&self, table: Table) -> AppResult<Vec<StoredItem>> {
        self.inner.scan(table).await
    }
}

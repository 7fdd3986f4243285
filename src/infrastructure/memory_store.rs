//! 内存键值存储，基于 `BTreeMap`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use crate::error::AppResult;

use super::store::{Index, ItemKey, KvStore, StoredItem, Table};

/// 全量快照，用于持久化
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub tables: BTreeMap<Table, Vec<StoredItem>>,
}

/// 内存存储
///
/// 线程安全（`RwLock`），适合测试和作为文件存储的内存层。
/// 主键按 `(pk, sk)` 有序存放，分区查询是一次范围扫描；二级索引单独维护。
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, TableData>>,
}

#[derive(Default)]
struct TableData {
    rows: BTreeMap<ItemKey, StoredItem>,
    /// 每个二级索引一组 `(索引键, 主键)`，按索引键排序
    indexes: HashMap<Index, BTreeSet<(ItemKey, ItemKey)>>,
}

const INDEXES: [Index; 2] = [Index::Gsi1, Index::Gsi2];

impl TableData {
    fn insert(&mut self, item: StoredItem) {
        self.remove(&item.key);
        for index in INDEXES {
            if let Some(index_key) = item.index_key(index) {
                self.indexes
                    .entry(index)
                    .or_default()
                    .insert((index_key.clone(), item.key.clone()));
            }
        }
        self.rows.insert(item.key.clone(), item);
    }

    fn remove(&mut self, key: &ItemKey) -> Option<StoredItem> {
        let old = self.rows.remove(key)?;
        for index in INDEXES {
            if let (Some(index_key), Some(entries)) =
                (old.index_key(index), self.indexes.get_mut(&index))
            {
                entries.remove(&(index_key.clone(), key.clone()));
            }
        }
        Some(old)
    }

    fn partition(&self, pk: &str) -> Vec<StoredItem> {
        self.rows
            .range(ItemKey::new(pk, "")..)
            .take_while(|(key, _)| key.pk == pk)
            .map(|(_, item)| item.clone())
            .collect()
    }

    fn index_partition(&self, index: Index, pk: &str) -> Vec<StoredItem> {
        let Some(entries) = self.indexes.get(&index) else {
            return Vec::new();
        };
        entries
            .range((ItemKey::new(pk, ""), ItemKey::new("", ""))..)
            .take_while(|(index_key, _)| index_key.pk == pk)
            .filter_map(|(_, key)| self.rows.get(key).cloned())
            .collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let tables = snapshot
            .tables
            .into_iter()
            .map(|(table, items)| {
                let mut data = TableData::default();
                for item in items {
                    data.insert(item);
                }
                (table, data)
            })
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let tables = self.tables.read().unwrap_or_else(|p| p.into_inner());
        StoreSnapshot {
            tables: tables
                .iter()
                .map(|(table, data)| (*table, data.rows.values().cloned().collect()))
                .collect(),
        }
    }

    /// 某张表的记录数
    pub fn len(&self, table: Table) -> usize {
        let tables = self.tables.read().unwrap_or_else(|p| p.into_inner());
        tables.get(&table).map(|data| data.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, table: Table) -> bool {
        self.len(table) == 0
    }

    fn read<T>(&self, table: Table, f: impl FnOnce(&TableData) -> Vec<T>) -> Vec<T> {
        let tables = self.tables.read().unwrap_or_else(|p| p.into_inner());
        tables.get(&table).map(f).unwrap_or_default()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn put(&self, table: Table, item: StoredItem) -> AppResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(|p| p.into_inner());
        tables.entry(table).or_default().insert(item);
        Ok(())
    }

    async fn put_if_absent(&self, table: Table, item: StoredItem) -> AppResult<bool> {
        let mut tables = self.tables.write().unwrap_or_else(|p| p.into_inner());
        let data = tables.entry(table).or_default();
        if data.rows.contains_key(&item.key) {
            return Ok(false);
        }
        data.insert(item);
        Ok(true)
    }

    async fn get(&self, table: Table, key: &ItemKey) -> AppResult<Option<StoredItem>> {
        let tables = self.tables.read().unwrap_or_else(|p| p.into_inner());
        Ok(tables.get(&table).and_then(|data| data.rows.get(key)).cloned())
    }

    async fn delete(&self, table: Table, key: &ItemKey) -> AppResult<bool> {
        let mut tables = self.tables.write().unwrap_or_else(|p| p.into_inner());
        Ok(tables
            .get_mut(&table)
            .map(|data| data.remove(key).is_some())
            .unwrap_or(false))
    }

    async fn query(&self, table: Table, pk: &str) -> AppResult<Vec<StoredItem>> {
        Ok(self.read(table, |data| data.partition(pk)))
    }

    async fn query_index(
        &self,
        table: Table,
        index: Index,
        pk: &str,
    ) -> AppResult<Vec<StoredItem>> {
        Ok(self.read(table, |data| data.index_partition(index, pk)))
    }

    async fn scan(&self, table: Table) -> AppResult<Vec<StoredItem>> {
        Ok(self.read(table, |data| data.rows.values().cloned().collect()))
    }
}

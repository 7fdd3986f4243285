//! 键值存储抽象 - 基础设施层
//!
//! 单表键值设计：每条记录有主键 `(pk, sk)`，以及最多两组派生的二级索引键。
//! 只暴露"按键读写"和"按派生键扫描"两种能力，不认识 Question / Exam。

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::error::AppResult;

/// 表名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Table {
    ExamQuestions,
    Exams,
    Topics,
    ExamResults,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::ExamQuestions => "ExamQuestions",
            Table::Exams => "Exams",
            Table::Topics => "Topics",
            Table::ExamResults => "ExamResults",
        };
        f.write_str(name)
    }
}

/// 二级索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    Gsi1,
    Gsi2,
}

/// 主键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub pk: String,
    pub sk: String,
}

impl ItemKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.pk, self.sk)
    }
}

/// 存储中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub key: ItemKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gsi1: Option<ItemKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gsi2: Option<ItemKey>,
    pub data: JsonValue,
}

impl StoredItem {
    /// 把任意可序列化的记录包装成存储项
    pub fn from_record<T: Serialize>(key: ItemKey, record: &T) -> AppResult<Self> {
        Ok(Self {
            key,
            gsi1: None,
            gsi2: None,
            data: serde_json::to_value(record)?,
        })
    }

    pub fn with_gsi1(mut self, key: ItemKey) -> Self {
        self.gsi1 = Some(key);
        self
    }

    pub fn with_gsi2(mut self, key: ItemKey) -> Self {
        self.gsi2 = Some(key);
        self
    }

    pub fn index_key(&self, index: Index) -> Option<&ItemKey> {
        match index {
            Index::Gsi1 => self.gsi1.as_ref(),
            Index::Gsi2 => self.gsi2.as_ref(),
        }
    }

    /// 反序列化为指定类型
    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// 键值存储
///
/// 实现者可以随时返回 `StoreError::Unavailable` 表示暂时失败，由上层决定是否重试。
#[async_trait]
pub trait KvStore: Send + Sync {
    /// 覆盖写入
    async fn put(&self, table: Table, item: StoredItem) -> AppResult<()>;

    /// 仅当主键不存在时写入，返回是否写入成功
    async fn put_if_absent(&self, table: Table, item: StoredItem) -> AppResult<bool>;

    async fn get(&self, table: Table, key: &ItemKey) -> AppResult<Option<StoredItem>>;

    /// 删除记录，返回记录原先是否存在
    async fn delete(&self, table: Table, key: &ItemKey) -> AppResult<bool>;

    /// 扫描一个分区，按 sk 排序
    async fn query(&self, table: Table, pk: &str) -> AppResult<Vec<StoredItem>>;

    /// 按二级索引的分区键扫描，按索引 sk 排序
    async fn query_index(&self, table: Table, index: Index, pk: &str)
        -> AppResult<Vec<StoredItem>>;

    /// 全表扫描
    async fn scan(&self, table: Table) -> AppResult<Vec<StoredItem>>;
}

/// 派生键的拼接规则 `<ENTITY>#<id>`
pub mod keys {
    use super::{Index, ItemKey};

    /// 试卷统一放在一个常量分区里
    pub const EXAM_PARTITION: &str = "EXAM#ALL";
    /// 题目记录没有排序键，用单个空格占位
    pub const EMPTY_SORT_KEY: &str = " ";
    /// 知识点记录的排序键
    pub const TOPIC_SORT_KEY: &str = "TOPIC";

    pub const TOPIC_INDEX: Index = Index::Gsi1;
    pub const DIFFICULTY_INDEX: Index = Index::Gsi2;
    pub const EXAM_RESULTS_INDEX: Index = Index::Gsi1;

    pub fn question(id: &str) -> String {
        format!("QUESTION#{}", id)
    }

    pub fn exam(id: &str) -> String {
        format!("EXAM#{}", id)
    }

    pub fn topic(name: &str) -> String {
        format!("TOPIC#{}", name)
    }

    pub fn difficulty(level: &str) -> String {
        format!("DIFFICULTY#{}", level)
    }

    pub fn user(id: &str) -> String {
        format!("USER#{}", id)
    }

    pub fn question_key(id: &str) -> ItemKey {
        ItemKey::new(question(id), EMPTY_SORT_KEY)
    }

    pub fn exam_key(id: &str) -> ItemKey {
        ItemKey::new(EXAM_PARTITION, exam(id))
    }

    pub fn topic_key(name: &str) -> ItemKey {
        ItemKey::new(topic(name), TOPIC_SORT_KEY)
    }

    pub fn exam_result_key(user_id: &str, exam_id: &str) -> ItemKey {
        ItemKey::new(user(user_id), exam(exam_id))
    }

    /// 去掉 `<ENTITY>#` 前缀
    pub fn strip_entity(key: &str) -> &str {
        key.split_once('#').map(|(_, id)| id).unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_conventions() {
        assert_eq!(keys::question_key("42").pk, "QUESTION#42");
        assert_eq!(keys::exam_key("7"), ItemKey::new("EXAM#ALL", "EXAM#7"));
        assert_eq!(keys::topic("Algebra"), "TOPIC#Algebra");
        assert_eq!(keys::difficulty("hard"), "DIFFICULTY#hard");
        assert_eq!(keys::strip_entity("QUESTION#123-5"), "123-5");
        assert_eq!(keys::strip_entity("plain"), "plain");
    }
}

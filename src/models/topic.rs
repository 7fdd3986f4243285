use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 知识点热度计数
///
/// `question_count` 只增不减，是"累计录入过多少题"而不是"当前有多少题"。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    pub question_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

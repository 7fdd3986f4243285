use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 学生的一次考试成绩
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub user_id: String,
    pub exam_id: String,
    #[serde(default)]
    pub score: i32,
    /// 每道题的作答，结构由调用方决定
    #[serde(default)]
    pub answers: JsonValue,
    pub submitted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 提交成绩时调用方提供的数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSubmission {
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub answers: JsonValue,
}

/// `delete_exam_result` 的返回值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedExamResult {
    pub user_id: String,
    pub exam_id: String,
    pub deleted_at: DateTime<Utc>,
}

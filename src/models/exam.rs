use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::ContentItem;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamMetadata {
    #[serde(default)]
    pub question_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 试卷
///
/// `question_ids` 保持插入顺序且不重复；其中的 id 可能指向已删除的题目，读取时需要容忍。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub batch: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub total_marks: i32,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub question_ids: Vec<String>,
    /// 考试说明等附加内容
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub metadata: ExamMetadata,
    /// 缓存中标记"已有人提交过成绩"，不代表具体用户
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_submissions: bool,
}

/// 新建试卷表单数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExam {
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub batch: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub total_marks: i32,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl NewExam {
    pub fn into_exam(self, id: String) -> Exam {
        Exam {
            id,
            name: self.name,
            subject: self.subject,
            batch: self.batch,
            date: self.date,
            time: self.time,
            duration: self.duration,
            total_marks: self.total_marks,
            sections: self.sections,
            question_ids: Vec::new(),
            content: self.content,
            created_by: self.created_by,
            metadata: ExamMetadata::default(),
            has_submissions: false,
        }
    }
}

/// `add_exam` 的返回值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamId {
    pub id: String,
}

/// `get_exam_questions` 的返回值：按试卷顺序解析出的题目，以及试卷附带的说明内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamQuestions {
    pub questions: Vec<super::question::Question>,
    pub contents: Vec<ContentItem>,
}

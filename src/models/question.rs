use serde::{Deserialize, Serialize};
use std::fmt;

use super::content::{ContentItem, QuestionOption};

/// 题型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Single,
    Multiple,
    Integer,
    Numerical,
}

/// 难度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 得分规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marks {
    pub correct: i32,
    pub incorrect: i32,
}

impl Default for Marks {
    fn default() -> Self {
        Self {
            correct: 4,
            incorrect: -1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionMetadata {
    #[serde(default)]
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub marks: Marks,
}

/// 题目
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub contents: Vec<ContentItem>,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub solution_content: Vec<ContentItem>,
    #[serde(default)]
    pub metadata: QuestionMetadata,
}

impl Question {
    /// 保存前的规范化：去掉知识点 / 分区两侧空白，答案字母转小写
    pub fn normalized(mut self) -> Self {
        self.id = self.id.trim().to_string();
        self.correct_answer = self.correct_answer.trim().to_lowercase();
        self.metadata.topic = self.metadata.topic.trim().to_string();
        self.metadata.section = self.metadata.section.trim().to_string();
        self
    }

    /// 题干的纯文本（多个片段以空格拼接）
    pub fn stem_text(&self) -> String {
        self.contents
            .iter()
            .map(|c| c.value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

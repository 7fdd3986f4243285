use serde::{Deserialize, Serialize};

/// 内容片段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Latex,
    Image,
    Table,
}

/// 图片/表格尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// 题干、选项或解析中的一个可渲染片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl ContentItem {
    pub fn latex(value: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Latex,
            value: value.into(),
            dimensions: None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Text,
            value: value.into(),
            dimensions: None,
        }
    }
}

/// 选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    #[serde(default)]
    pub contents: Vec<ContentItem>,
}

impl QuestionOption {
    pub fn latex(value: impl Into<String>) -> Self {
        Self {
            contents: vec![ContentItem::latex(value)],
        }
    }
}

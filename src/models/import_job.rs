use serde::{Deserialize, Serialize};

use super::question::Difficulty;

/// 一次批量导入任务（从 TOML 文件加载）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub exam_id: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub with_answers: bool,
    pub text: String,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

impl ImportJob {
    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }

    /// 用于日志显示的名称
    pub fn display_name(&self) -> String {
        self.file_path
            .as_deref()
            .and_then(|p| std::path::Path::new(p).file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("exam {}", self.exam_id))
    }
}

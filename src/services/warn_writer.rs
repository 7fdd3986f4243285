//! 警告写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，不关心流程

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::utils::logging::truncate_text;

/// 题干在警告文件中最多保留的字符数
const STEM_PREVIEW_CHARS: usize = 80;

/// 一条需要人工处理的记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarnKind {
    /// 两次写入都失败，题目没有入库
    WriteFailed,
    /// 答案解析失败，已按默认答案入库
    AnswerFallback,
}

impl WarnKind {
    fn label(&self) -> &'static str {
        match self {
            WarnKind::WriteFailed => "写入失败",
            WarnKind::AnswerFallback => "默认答案",
        }
    }
}

/// 警告写入服务
///
/// 每条记录一行，追加写入，不覆盖之前的运行结果。
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 写入一条警告
    ///
    /// # 参数
    /// - `exam_id`: 试卷ID
    /// - `question_index`: 题目在本批中的序号（从 1 开始）
    /// - `stem`: 题干内容
    /// - `detail`: 失败原因或原始答案片段
    pub async fn write(
        &self,
        kind: WarnKind,
        exam_id: &str,
        question_index: usize,
        stem: &str,
        detail: &str,
    ) -> AppResult<()> {
        debug!(
            "写入警告: {} | 试卷 {} | 题目 {}",
            kind.label(),
            exam_id,
            question_index
        );

        let warn_msg = format!(
            "[{}] 试卷 {} | 题目 {} | 题干: {} | {}\n",
            kind.label(),
            exam_id,
            question_index,
            truncate_text(stem, STEM_PREVIEW_CHARS),
            detail.replace('\n', " ")
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .await
            .map_err(|e| AppError::file_write_failed(&self.warn_file_path, e))?;

        file.write_all(warn_msg.as_bytes())
            .await
            .map_err(|e| AppError::file_write_failed(&self.warn_file_path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_appends_one_line_per_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warn.txt");
        let writer = WarnWriter::with_path(path.to_string_lossy().to_string());

        writer
            .write(WarnKind::WriteFailed, "e1", 2, "2+2=?", "store unavailable")
            .await
            .unwrap();
        writer
            .write(WarnKind::AnswerFallback, "e1", 3, "x?", "Answer: X\nmore")
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[写入失败] 试卷 e1 | 题目 2"));
        assert!(lines[1].ends_with("Answer: X more"));
    }
}

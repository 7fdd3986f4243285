//! 题目导入上下文
//!
//! 封装"我正在往哪张卷子写第几题"这一信息

use std::fmt::Display;

/// 单道题的导入上下文
#[derive(Debug, Clone)]
pub struct ImportCtx {
    /// 目标试卷ID
    pub exam_id: String,

    /// 题目在本批中的序号（从1开始，仅用于日志和警告文件）
    pub question_index: usize,

    /// 本批题目总数
    pub total: usize,
}

impl ImportCtx {
    pub fn new(exam_id: impl Into<String>, question_index: usize, total: usize) -> Self {
        Self {
            exam_id: exam_id.into(),
            question_index,
            total,
        }
    }
}

impl Display for ImportCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[导入 {}/{}]", self.question_index, self.total)
    }
}

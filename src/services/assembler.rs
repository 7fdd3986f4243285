//! 题目组装 - 业务能力层
//!
//! 把切分好的扁平片段按固定大小分组，组装成结构化的 `Question`。
//! 先校验再组装：格式或选择不对时整批拒绝，保证零写入。
//! 纯函数，不做任何 I/O。

use regex::Regex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::LazyLock;

use crate::error::ImportError;
use crate::infrastructure::Clock;
use crate::models::{
    ContentItem, Difficulty, Marks, Question, QuestionMetadata, QuestionOption, QuestionType,
};

static ANSWER_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Answer:\s*([A-D])").expect("答案正则无效"));

static OPTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-D]\)\s*").expect("选项标记正则无效"));

static SOLUTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Solution:\s*").expect("解析标记正则无效"));

/// 无法识别答案字母时使用的默认答案
pub const DEFAULT_CORRECT_ANSWER: &str = "b";

/// 没有解析时的占位内容
pub const PLACEHOLDER_SOLUTION: &str = " ";

const OPTION_COUNT: usize = 4;

/// 批量粘贴的模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// 题干 + 4 个选项
    QuestionsOnly,
    /// 题干 + 4 个选项 + 答案 + 解析
    WithAnswers,
}

impl ImportMode {
    pub fn from_flag(with_answers: bool) -> Self {
        if with_answers {
            ImportMode::WithAnswers
        } else {
            ImportMode::QuestionsOnly
        }
    }

    /// 每道题占用的片段数
    pub fn group_size(&self) -> usize {
        match self {
            ImportMode::QuestionsOnly => 1 + OPTION_COUNT,
            ImportMode::WithAnswers => 1 + OPTION_COUNT + 2,
        }
    }
}

/// 调用方在界面上选好的知识点、分区和难度（不从文本里解析）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub topic: Option<String>,
    pub section: Option<String>,
    pub section_name: Option<String>,
    pub difficulty: Difficulty,
}

/// 答案字母无法识别，已使用默认答案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFallback {
    /// 题目在本批中的序号（从 0 开始）
    pub index: usize,
    pub question_id: String,
    /// 原始的答案片段
    pub raw_answer: String,
}

/// 组装结果
#[derive(Debug, Clone, Default)]
pub struct AssembledBatch {
    pub questions: Vec<Question>,
    pub fallbacks: Vec<ParseFallback>,
}

/// 组装一批题目
///
/// # 参数
/// - `fragments`: `tokenizer::tokenize` 的输出
/// - `mode`: 是否包含答案和解析
/// - `selection`: 调用方选择的知识点 / 分区 / 难度
/// - `id_base`: 本批题目 id 的前缀，每道题追加批内序号
///
/// # 错误
/// - 片段数为 0 或不能整除分组大小：`ImportError::Format`
/// - 未选择知识点或分区：`ImportError::MissingSelection`
pub fn assemble(
    fragments: &[String],
    mode: ImportMode,
    selection: &Selection,
    id_base: &str,
) -> Result<AssembledBatch, ImportError> {
    let group_size = mode.group_size();
    if fragments.is_empty() || fragments.len() % group_size != 0 {
        return Err(ImportError::Format {
            fragment_count: fragments.len(),
            group_size,
        });
    }

    let topic = required(&selection.topic, "知识点")?;
    let section = required(&selection.section, "分区")?;

    let metadata = QuestionMetadata {
        section: section.to_string(),
        section_name: selection.section_name.clone(),
        topic: topic.to_string(),
        difficulty: selection.difficulty,
        marks: Marks::default(),
    };

    let mut batch = AssembledBatch::default();
    for (index, group) in fragments.chunks(group_size).enumerate() {
        let id = format!("{}-{}", id_base, index);

        let (correct_answer, solution) = match mode {
            ImportMode::QuestionsOnly => (
                DEFAULT_CORRECT_ANSWER.to_string(),
                PLACEHOLDER_SOLUTION.to_string(),
            ),
            ImportMode::WithAnswers => {
                let raw_answer = &group[1 + OPTION_COUNT];
                let letter = extract_answer_letter(raw_answer).unwrap_or_else(|| {
                    batch.fallbacks.push(ParseFallback {
                        index,
                        question_id: id.clone(),
                        raw_answer: raw_answer.clone(),
                    });
                    DEFAULT_CORRECT_ANSWER.to_string()
                });
                (letter, strip_solution_marker(&group[2 + OPTION_COUNT]))
            }
        };

        batch.questions.push(Question {
            id,
            question_type: QuestionType::Single,
            contents: vec![ContentItem::latex(group[0].as_str())],
            options: group[1..=OPTION_COUNT]
                .iter()
                .map(|text| QuestionOption::latex(strip_option_marker(text)))
                .collect(),
            correct_answer,
            solution_content: vec![ContentItem::latex(solution)],
            metadata: metadata.clone(),
        });
    }

    Ok(batch)
}

/// 从 `Answer: X` 片段中提取小写的答案字母
pub fn extract_answer_letter(fragment: &str) -> Option<String> {
    ANSWER_LETTER
        .captures(fragment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// 去掉选项开头的 `A) `..`D) `
pub fn strip_option_marker(text: &str) -> String {
    OPTION_MARKER.replace(text, "").into_owned()
}

/// 去掉解析开头的 `Solution:`
pub fn strip_solution_marker(text: &str) -> String {
    SOLUTION_MARKER.replace(text, "").into_owned()
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ImportError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ImportError::MissingSelection { field })
}

/// 题目 id 前缀生成器
///
/// 以毫秒时间戳为基础，保证同一进程内严格递增，
/// 同一毫秒内的两批也不会拿到相同前缀。
#[derive(Debug, Default)]
pub struct IdSequence {
    last: AtomicI64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_base(&self, clock: &dyn Clock) -> String {
        let now = clock.now().timestamp_millis();
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next.to_string(),
                Err(actual) => prev = actual,
            }
        }
    }
}

//! 粘贴文本切分 - 业务能力层
//!
//! 把人工粘贴的整段题目文本切成扁平的片段序列：
//! 每道题依次输出 题干、选项（A-D）、`Answer:` 行、`Solution:` 段。
//! 纯函数，不做任何 I/O。

use regex::Regex;
use std::sync::LazyLock;

/// 题号标记：行首的 `Q.` + 可选空白 + 数字
static QUESTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Q\.[ \t]*\d+[ \t]*").expect("题号正则无效"));

/// 选项行：去掉行首空白后以 `A)`..`D)` 开头
static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-D]\)").expect("选项正则无效"));

const ANSWER_LABEL: &str = "Answer:";
const SOLUTION_LABEL: &str = "Solution:";

/// 当前正在累积的部分
enum Section {
    Body,
    Answer,
    Solution,
}

/// 切分整段粘贴文本
///
/// 输出所有题目的片段，按原文顺序拼接成一个扁平列表；不含空字符串。
/// 缺选项的题目只会让自己的片段变少，不影响其他题。
pub fn tokenize(input: &str) -> Vec<String> {
    QUESTION_MARKER
        .split(input)
        .filter(|block| !block.trim().is_empty())
        .flat_map(tokenize_block)
        .collect()
}

/// 切分单道题
fn tokenize_block(block: &str) -> Vec<String> {
    let text = block.replace("\r\n", "\n");

    let mut body_lines: Vec<&str> = Vec::new();
    let mut answer: Option<Vec<&str>> = None;
    let mut solution: Option<Vec<&str>> = None;
    let mut section = Section::Body;

    for line in text.trim().lines() {
        let trimmed = line.trim();
        if trimmed.starts_with(ANSWER_LABEL) {
            answer = Some(vec![trimmed]);
            section = Section::Answer;
            continue;
        }
        if trimmed.starts_with(SOLUTION_LABEL) {
            solution = Some(vec![trimmed]);
            section = Section::Solution;
            continue;
        }

        match section {
            Section::Body => body_lines.push(line),
            Section::Answer => answer.get_or_insert_with(Vec::new).push(trimmed),
            Section::Solution => solution.get_or_insert_with(Vec::new).push(trimmed),
        }
    }

    let (stem, options) = split_stem_and_options(&body_lines);

    let mut parts = Vec::with_capacity(options.len() + 3);
    parts.push(stem);
    parts.extend(options);
    parts.extend(answer.map(|lines| join_labeled(&lines)));
    parts.extend(solution.map(|lines| join_labeled(&lines)));

    parts.retain(|part| !part.trim().is_empty());
    parts
}

/// 逐行解析题干和选项
///
/// 第一个选项出现之前的行拼到题干，之后的续行拼到最近的选项。
fn split_stem_and_options(lines: &[&str]) -> (String, Vec<String>) {
    let mut stem = String::new();
    let mut options: Vec<String> = Vec::new();

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if OPTION_LINE.is_match(trimmed) {
            options.push(trimmed.to_string());
        } else if let Some(current) = options.last_mut() {
            current.push(' ');
            current.push_str(trimmed);
        } else {
            if !stem.is_empty() {
                stem.push(' ');
            }
            stem.push_str(trimmed);
        }
    }

    (stem, options)
}

/// 带标签的部分可以跨多行，保留换行
fn join_labeled(lines: &[&str]) -> String {
    lines
        .iter()
        .filter(|l| !l.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

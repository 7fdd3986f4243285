//! 批量导入处理器 - 编排层
//!
//! ## 职责
//!
//! 处理一次粘贴导入：整段文本 → 片段 → 题目 → 逐题保存。
//!
//! ## 处理顺序
//!
//! 1. **切分**：`tokenizer::tokenize`
//! 2. **组装 + 校验**：`assembler::assemble`，格式或选择错误时整批拒绝
//! 3. **试卷检查**：目标试卷不存在时直接返回 NotFound，不写任何数据
//! 4. **逐题保存**：严格串行，两题之间固定间隔；单题失败记录后继续
//!
//! 取消信号只阻止后续题目开始，正在进行的写入会完成。

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::Clock;
use crate::models::ImportJob;
use crate::services::{
    assemble, tokenize, IdSequence, ImportMode, ParseFallback, QuestionRepository, Selection,
};
use crate::workflow::{ImportCtx, QuestionFlow, SaveResult};

/// 一次导入请求
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub exam_id: String,
    pub text: String,
    pub mode: ImportMode,
    pub selection: Selection,
}

impl From<&ImportJob> for ImportRequest {
    fn from(job: &ImportJob) -> Self {
        Self {
            exam_id: job.exam_id.clone(),
            text: job.text.clone(),
            mode: ImportMode::from_flag(job.with_answers),
            selection: Selection {
                topic: job.topic.clone(),
                section: job.section.clone(),
                section_name: job.section_name.clone(),
                difficulty: job.difficulty,
            },
        }
    }
}

/// 写入失败、被跳过的题目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// 题目在本批中的序号（从 0 开始）
    pub index: usize,
    pub question_id: String,
    pub stem: String,
    pub reason: String,
}

/// 一批导入的结果
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub exam_id: String,
    /// 组装出的题目总数
    pub total: usize,
    /// 成功保存的题目 id（按保存顺序）
    pub saved: Vec<String>,
    /// 其中第一次加入试卷的数量
    pub newly_added: usize,
    pub failures: Vec<ItemFailure>,
    /// 按默认答案保存的题目
    pub fallbacks: Vec<ParseFallback>,
    pub cancelled: bool,
    /// 因取消而没有开始的题目数
    pub not_attempted: usize,
}

impl BatchOutcome {
    /// 所有题目都已保存
    pub fn is_complete(&self) -> bool {
        self.saved.len() == self.total
    }
}

/// 批量导入处理器
pub struct ImportProcessor {
    repository: Arc<QuestionRepository>,
    flow: QuestionFlow,
    clock: Arc<dyn Clock>,
    question_ids: IdSequence,
    item_delay: Duration,
}

impl ImportProcessor {
    pub fn new(
        repository: Arc<QuestionRepository>,
        flow: QuestionFlow,
        clock: Arc<dyn Clock>,
        item_delay: Duration,
    ) -> Self {
        Self {
            repository,
            flow,
            clock,
            question_ids: IdSequence::new(),
            item_delay,
        }
    }

    /// 处理一次导入
    ///
    /// # 错误
    /// - 格式 / 选择不对：`AppError::Import`，零写入
    /// - 目标试卷不存在：`AppError::NotFound`，零写入
    ///
    /// 单题写入失败不会让整批失败，而是记录在 `BatchOutcome::failures`。
    pub async fn process(
        &self,
        request: &ImportRequest,
        cancel: &CancellationToken,
    ) -> AppResult<BatchOutcome> {
        let fragments = tokenize(&request.text);
        info!(
            "📋 切分得到 {} 个片段 (每题 {} 个)",
            fragments.len(),
            request.mode.group_size()
        );

        let id_base = self.question_ids.next_base(self.clock.as_ref());
        let batch = assemble(&fragments, request.mode, &request.selection, &id_base)?;

        if self.repository.get_exam(&request.exam_id).await?.is_none() {
            return Err(AppError::not_found("Exam", &request.exam_id));
        }

        for fallback in &batch.fallbacks {
            warn!(
                "⚠️ 第 {} 题答案无法识别 ({:?})，使用默认答案",
                fallback.index + 1,
                fallback.raw_answer
            );
        }

        let total = batch.questions.len();
        let mut outcome = BatchOutcome {
            exam_id: request.exam_id.clone(),
            total,
            fallbacks: batch.fallbacks,
            ..Default::default()
        };

        for (index, question) in batch.questions.iter().enumerate() {
            let proceed = if index == 0 {
                !cancel.is_cancelled()
            } else {
                self.pause(cancel).await
            };
            if !proceed {
                outcome.cancelled = true;
                outcome.not_attempted = total - index;
                warn!("🛑 导入已取消，剩余 {} 道题未保存", outcome.not_attempted);
                break;
            }

            let ctx = ImportCtx::new(&request.exam_id, index + 1, total);
            match self.flow.run(question, &ctx).await {
                Ok(result) => {
                    if result == SaveResult::Added {
                        outcome.newly_added += 1;
                    }
                    outcome.saved.push(question.id.clone());
                }
                Err(e) => {
                    warn!("{} ⚠️ 跳过该题，继续下一题", ctx);
                    outcome.failures.push(ItemFailure {
                        index,
                        question_id: question.id.clone(),
                        stem: question.stem_text(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "✓ 导入结束: 保存 {}/{}，失败 {}，默认答案 {}",
            outcome.saved.len(),
            total,
            outcome.failures.len(),
            outcome.fallbacks.len()
        );
        Ok(outcome)
    }

    /// 两题之间的间隔；间隔期间收到取消信号时返回 false
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.item_delay) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{ManualClock, MemoryStore, Table};
    use crate::models::NewExam;
    use crate::services::RetryingWriter;
    use chrono::Utc;
    use tokio::time::Instant;

    const TWO_QUESTIONS: &str = "Q. 1 2+2=?\nA) 3\nB) 4\nC) 5\nD) 6\nQ. 2 3+3=?\nA) 5\nB) 6\nC) 7\nD) 8\n";

    fn processor() -> (ImportProcessor, Arc<QuestionRepository>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc::now()));
        let repo = Arc::new(QuestionRepository::new(store.clone(), clock.clone()));
        let flow = QuestionFlow::new(
            repo.clone(),
            RetryingWriter::new(Duration::from_millis(1000)),
            false,
        );
        let processor =
            ImportProcessor::new(repo.clone(), flow, clock, Duration::from_millis(500));
        (processor, repo, store)
    }

    fn request(exam_id: &str, text: &str) -> ImportRequest {
        ImportRequest {
            exam_id: exam_id.to_string(),
            text: text.to_string(),
            mode: ImportMode::QuestionsOnly,
            selection: Selection {
                topic: Some("Arithmetic".to_string()),
                section: Some("s1".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_with_delay_between_items() {
        let (processor, repo, _) = processor();
        let exam_id = repo.add_exam(NewExam::default()).await.unwrap().id;
        let start = Instant::now();

        let outcome = processor
            .process(&request(&exam_id, TWO_QUESTIONS), &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.newly_added, 2);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_missing_exam_writes_nothing() {
        let (processor, _, store) = processor();
        let err = processor
            .process(&request("ghost", TWO_QUESTIONS), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.is_empty(Table::ExamQuestions));
    }

    #[tokio::test]
    async fn test_format_error_before_exam_check() {
        let (processor, _, store) = processor();
        let err = processor
            .process(
                &request("ghost", "Q. 1 x?\nA) 1\nB) 2\nC) 3\n"),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Import(_)));
        assert!(store.is_empty(Table::ExamQuestions));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_start_saves_nothing() {
        let (processor, repo, _) = processor();
        let exam_id = repo.add_exam(NewExam::default()).await.unwrap().id;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = processor
            .process(&request(&exam_id, TWO_QUESTIONS), &cancel)
            .await
            .unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.not_attempted, 2);
        assert!(outcome.saved.is_empty());
    }
}

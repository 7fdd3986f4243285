//! 门户 API
//!
//! 对外暴露的全部题库操作。负责把缓存、重试和仓储组合起来：
//! - 试卷列表走缓存，新建 / 删除试卷时让缓存失效
//! - 手动保存题目走重试，两次失败直接返回错误
//! - 批量导入交给 `ImportProcessor`

use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{Clock, KvStore};
use crate::models::{
    DeletedExamResult, Difficulty, Exam, ExamId, ExamQuestions, ExamResult, ExamSubmission,
    NewExam, Question, Topic,
};
use crate::orchestrator::{BatchOutcome, ImportProcessor, ImportRequest};
use crate::services::{ExamCache, IdSequence, QuestionRepository, RetryingWriter};
use crate::workflow::QuestionFlow;

pub struct PortalApi {
    repository: Arc<QuestionRepository>,
    cache: ExamCache,
    writer: RetryingWriter,
    importer: ImportProcessor,
    clock: Arc<dyn Clock>,
    question_ids: IdSequence,
}

impl PortalApi {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        let repository = Arc::new(QuestionRepository::new(store, clock.clone()));
        let writer = RetryingWriter::new(config.retry_backoff());
        let flow = QuestionFlow::new(repository.clone(), writer.clone(), config.verbose_logging);
        let importer = ImportProcessor::new(
            repository.clone(),
            flow,
            clock.clone(),
            config.bulk_item_delay(),
        );

        Self {
            cache: ExamCache::new(clock.clone(), config.exam_cache_ttl()),
            repository,
            writer,
            importer,
            clock,
            question_ids: IdSequence::new(),
        }
    }

    pub fn repository(&self) -> &QuestionRepository {
        &self.repository
    }

    // ========== 题目 ==========

    /// 手动保存一道题：先规范化，再带重试写入
    ///
    /// id 为空（或全是空白）时按时间戳生成新 id。
    pub async fn save_question(&self, exam_id: &str, question: Question) -> AppResult<Question> {
        let mut question = question.normalized();
        if question.id.is_empty() {
            question.id = self.question_ids.next_base(self.clock.as_ref());
        }
        let repository: &QuestionRepository = &self.repository;
        let record = &question;

        self.writer
            .execute(&format!("保存题目 {}", question.id), move || {
                repository.upsert_question(exam_id, record)
            })
            .await?;

        info!("✓ 题目 {} 已保存到试卷 {}", question.id, exam_id);
        Ok(question)
    }

    pub async fn get_question_by_id(&self, question_id: &str) -> AppResult<Option<Question>> {
        self.repository.get_question(question_id).await
    }

    pub async fn get_exam_questions(&self, exam_id: &str) -> AppResult<ExamQuestions> {
        self.repository.get_exam_questions(exam_id).await
    }

    pub async fn delete_question(&self, exam_id: &str, question_id: &str) -> AppResult<()> {
        self.repository.remove_question(exam_id, question_id).await
    }

    pub async fn get_exam_questions_by_topic(&self, topic: &str) -> AppResult<Vec<Question>> {
        self.repository.get_questions_by_topic(topic).await
    }

    pub async fn get_exam_questions_by_difficulty(
        &self,
        difficulty: Difficulty,
    ) -> AppResult<Vec<Question>> {
        self.repository.get_questions_by_difficulty(difficulty).await
    }

    pub async fn get_exam_questions_by_topic_and_difficulty(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> AppResult<Vec<Question>> {
        self.repository
            .get_questions_by_topic_and_difficulty(topic, difficulty)
            .await
    }

    /// 批量导入粘贴文本
    pub async fn bulk_import(
        &self,
        request: &ImportRequest,
        cancel: &CancellationToken,
    ) -> AppResult<BatchOutcome> {
        self.importer.process(request, cancel).await
    }

    // ========== 知识点 ==========

    pub async fn get_topics(&self) -> AppResult<Vec<Topic>> {
        self.repository.get_topics().await
    }

    pub async fn add_topic(&self, name: &str) -> AppResult<Option<Topic>> {
        self.repository.add_topic(name).await
    }

    // ========== 试卷 ==========

    pub async fn get_exams(&self) -> AppResult<Vec<Exam>> {
        self.cache.get_exams(&self.repository).await
    }

    /// 先查缓存，未命中再点查
    ///
    /// 缓存命中时返回的是缓存时的快照：之后保存 / 删除题目不会让缓存失效，
    /// `questionIds` 和 `questionCount` 可能是旧值，直到 TTL 过期或新建 / 删除试卷。
    /// 需要最新题目列表时用 `get_exam_questions`。
    pub async fn get_exam(&self, exam_id: &str) -> AppResult<Exam> {
        if let Some(exam) = self.cache.find(exam_id) {
            return Ok(exam);
        }
        self.repository
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::not_found("Exam", exam_id))
    }

    pub async fn add_exam(&self, data: NewExam) -> AppResult<ExamId> {
        let id = self.repository.add_exam(data).await?;
        self.cache.invalidate();
        Ok(id)
    }

    pub async fn delete_exam(&self, exam_id: &str) -> AppResult<ExamId> {
        let id = self.repository.delete_exam(exam_id).await?;
        self.cache.invalidate();
        Ok(id)
    }

    // ========== 考试成绩 ==========

    pub async fn save_exam_result(
        &self,
        user_id: &str,
        exam_id: &str,
        submission: ExamSubmission,
    ) -> AppResult<ExamResult> {
        let result = self
            .repository
            .save_exam_result(user_id, exam_id, submission)
            .await?;
        self.cache.mark_submission(exam_id);
        Ok(result)
    }

    pub async fn get_user_exam_result(
        &self,
        user_id: &str,
        exam_id: &str,
    ) -> AppResult<Option<ExamResult>> {
        self.repository.get_user_exam_result(user_id, exam_id).await
    }

    pub async fn get_user_exam_results(&self, user_id: &str) -> AppResult<Vec<ExamResult>> {
        self.repository.get_user_exam_results(user_id).await
    }

    pub async fn batch_get_user_exam_results(
        &self,
        user_id: &str,
        exam_ids: &[String],
    ) -> AppResult<HashMap<String, ExamResult>> {
        self.repository
            .batch_get_user_exam_results(user_id, exam_ids)
            .await
    }

    pub async fn get_exam_results(&self, exam_id: &str) -> AppResult<Vec<ExamResult>> {
        self.repository.get_exam_results(exam_id).await
    }

    pub async fn delete_exam_result(
        &self,
        user_id: &str,
        exam_id: &str,
    ) -> AppResult<DeletedExamResult> {
        self.repository.delete_exam_result(user_id, exam_id).await
    }
}

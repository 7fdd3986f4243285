//! 题目仓储 - 业务能力层
//!
//! 负责 Question / Exam / Topic / ExamResult 的持久化，以及三者之间的冗余数据一致性：
//! - 题目记录带 `TOPIC#` / `DIFFICULTY#` 两个派生索引键
//! - 试卷记录里保存题目 id 列表和题目数量
//! - 知识点记录保存累计录入题数（只增不减）
//!
//! 不做重试，重试交给 `RetryingWriter`。

use chrono::SecondsFormat;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{keys, Clock, ItemKey, KvStore, StoredItem, Table};
use crate::models::{
    DeletedExamResult, Difficulty, Exam, ExamId, ExamQuestions, ExamResult, ExamSubmission,
    NewExam, Question, Topic,
};
use crate::services::assembler::IdSequence;

/// 并发读取题目记录的上限
const QUESTION_FETCH_CONCURRENCY: usize = 8;

/// `upsert_question` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// 题目 id 是否是第一次加入该试卷
    pub newly_added: bool,
    pub question_count: usize,
}

pub struct QuestionRepository {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    exam_ids: IdSequence,
}

impl QuestionRepository {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            exam_ids: IdSequence::new(),
        }
    }

    // ========== 题目 ==========

    /// 保存题目并维护试卷题目列表和知识点计数
    ///
    /// 同一个 id 重复保存时，试卷列表中只出现一次，知识点也只计一次。
    pub async fn upsert_question(
        &self,
        exam_id: &str,
        question: &Question,
    ) -> AppResult<UpsertOutcome> {
        let mut exam = self
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::not_found("Exam", exam_id))?;

        self.put_question(question).await?;

        // 知识点先于试卷写入：知识点失败时试卷未变，重试仍按新增处理
        let newly_added = !exam.question_ids.iter().any(|id| id == &question.id);
        if newly_added {
            self.add_or_update_topic(&question.metadata.topic).await?;
            exam.question_ids.push(question.id.clone());
        }
        self.touch_exam(&mut exam);
        self.put_exam(&exam).await?;

        debug!(
            "保存题目 {} → 试卷 {} (新增: {}, 题目数: {})",
            question.id, exam_id, newly_added, exam.metadata.question_count
        );

        Ok(UpsertOutcome {
            newly_added,
            question_count: exam.metadata.question_count,
        })
    }

    /// 删除题目并从试卷中移除
    ///
    /// 题目记录本身已不存在时视为成功；知识点计数不回退。
    pub async fn remove_question(&self, exam_id: &str, question_id: &str) -> AppResult<()> {
        let mut exam = self
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::not_found("Exam", exam_id))?;

        exam.question_ids.retain(|id| id != question_id);
        self.touch_exam(&mut exam);
        self.put_exam(&exam).await?;

        let existed = self
            .store
            .delete(Table::ExamQuestions, &keys::question_key(question_id))
            .await?;
        if !existed {
            debug!("题目 {} 已不存在，跳过删除", question_id);
        }

        info!("✓ 题目 {} 已从试卷 {} 删除", question_id, exam_id);
        Ok(())
    }

    pub async fn get_question(&self, question_id: &str) -> AppResult<Option<Question>> {
        self.store
            .get(Table::ExamQuestions, &keys::question_key(question_id))
            .await?
            .map(|item| item.decode())
            .transpose()
    }

    /// 按试卷中保存的顺序取出所有题目
    ///
    /// 题目记录缺失的 id 直接忽略；试卷不存在时返回空结果。
    pub async fn get_exam_questions(&self, exam_id: &str) -> AppResult<ExamQuestions> {
        let Some(exam) = self.get_exam(exam_id).await? else {
            warn!("⚠️ 试卷 {} 不存在，返回空题目列表", exam_id);
            return Ok(ExamQuestions::default());
        };

        let resolved: Vec<Option<Question>> = stream::iter(exam.question_ids.iter())
            .map(|id| self.get_question(id))
            .buffered(QUESTION_FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        let dangling = resolved.iter().filter(|q| q.is_none()).count();
        if dangling > 0 {
            debug!("试卷 {} 中有 {} 个题目 id 已失效", exam_id, dangling);
        }

        Ok(ExamQuestions {
            questions: resolved.into_iter().flatten().collect(),
            contents: exam.content,
        })
    }

    pub async fn get_questions_by_topic(&self, topic: &str) -> AppResult<Vec<Question>> {
        let items = self
            .store
            .query_index(Table::ExamQuestions, keys::TOPIC_INDEX, &keys::topic(topic))
            .await?;
        decode_all(&items)
    }

    pub async fn get_questions_by_difficulty(
        &self,
        difficulty: Difficulty,
    ) -> AppResult<Vec<Question>> {
        let items = self
            .store
            .query_index(
                Table::ExamQuestions,
                keys::DIFFICULTY_INDEX,
                &keys::difficulty(difficulty.as_str()),
            )
            .await?;
        decode_all(&items)
    }

    /// 先按知识点索引扫描，再在客户端按难度过滤（不是组合索引）
    pub async fn get_questions_by_topic_and_difficulty(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> AppResult<Vec<Question>> {
        let candidates = self.get_questions_by_topic(topic).await?;
        let scanned = candidates.len();

        let matched: Vec<Question> = candidates
            .into_iter()
            .filter(|q| q.metadata.difficulty == difficulty)
            .collect();

        debug!(
            "知识点 {} + 难度 {}: 扫描 {} 条，命中 {} 条",
            topic,
            difficulty,
            scanned,
            matched.len()
        );
        Ok(matched)
    }

    // ========== 知识点 ==========

    pub async fn get_topics(&self) -> AppResult<Vec<Topic>> {
        let items = self.store.scan(Table::Topics).await?;
        decode_all(&items)
    }

    /// 显式创建知识点（计数为 0），已存在时返回 `None`
    pub async fn add_topic(&self, name: &str) -> AppResult<Option<Topic>> {
        let topic = self.new_topic(name, 0);
        let item = StoredItem::from_record(keys::topic_key(name), &topic)?;
        if self.store.put_if_absent(Table::Topics, item).await? {
            info!("✓ 新建知识点: {}", name);
            Ok(Some(topic))
        } else {
            warn!("⚠️ 知识点 {} 已存在", name);
            Ok(None)
        }
    }

    /// 首次引用时创建知识点（计数为 1），否则计数加一
    pub async fn add_or_update_topic(&self, name: &str) -> AppResult<Topic> {
        let fresh = self.new_topic(name, 1);
        let item = StoredItem::from_record(keys::topic_key(name), &fresh)?;
        if self.store.put_if_absent(Table::Topics, item).await? {
            debug!("新建知识点: {}", name);
            return Ok(fresh);
        }

        let key = keys::topic_key(name);
        let mut topic: Topic = self
            .store
            .get(Table::Topics, &key)
            .await?
            .ok_or_else(|| AppError::not_found("Topic", name))?
            .decode()?;
        topic.question_count += 1;
        topic.updated_at = self.clock.now();

        self.store
            .put(Table::Topics, StoredItem::from_record(key, &topic)?)
            .await?;
        Ok(topic)
    }

    fn new_topic(&self, name: &str, question_count: u64) -> Topic {
        let now = self.clock.now();
        Topic {
            name: name.to_string(),
            question_count,
            created_at: now,
            updated_at: now,
        }
    }

    // ========== 试卷 ==========

    /// 扫描整个试卷分区（试卷数量不大时才适用）
    pub async fn get_exams(&self) -> AppResult<Vec<Exam>> {
        let items = self
            .store
            .query(Table::Exams, keys::EXAM_PARTITION)
            .await?;
        decode_all(&items)
    }

    pub async fn get_exam(&self, exam_id: &str) -> AppResult<Option<Exam>> {
        self.store
            .get(Table::Exams, &keys::exam_key(exam_id))
            .await?
            .map(|item| item.decode())
            .transpose()
    }

    pub async fn add_exam(&self, data: NewExam) -> AppResult<ExamId> {
        let id = self.exam_ids.next_base(self.clock.as_ref());
        let mut exam = data.into_exam(id.clone());
        self.touch_exam(&mut exam);
        self.put_exam(&exam).await?;

        info!("✓ 新建试卷 {} ({})", exam.name, id);
        Ok(ExamId { id })
    }

    /// 删除试卷，不级联删除题目；试卷已不存在时视为成功
    pub async fn delete_exam(&self, exam_id: &str) -> AppResult<ExamId> {
        let existed = self
            .store
            .delete(Table::Exams, &keys::exam_key(exam_id))
            .await?;
        if existed {
            info!("✓ 试卷 {} 已删除", exam_id);
        } else {
            debug!("试卷 {} 已不存在，跳过删除", exam_id);
        }
        Ok(ExamId {
            id: exam_id.to_string(),
        })
    }

    fn touch_exam(&self, exam: &mut Exam) {
        exam.metadata.question_count = exam.question_ids.len();
        exam.metadata.updated_at = Some(self.clock.now());
    }

    async fn put_exam(&self, exam: &Exam) -> AppResult<()> {
        // 缓存上的提交标记不落库
        let mut record = exam.clone();
        record.has_submissions = false;

        let mut item = StoredItem::from_record(keys::exam_key(&exam.id), &record)?;
        if let Some(owner) = &exam.created_by {
            item = item.with_gsi1(ItemKey::new(keys::user(owner), keys::exam(&exam.id)));
        }
        self.store.put(Table::Exams, item).await
    }

    async fn put_question(&self, question: &Question) -> AppResult<()> {
        let item = StoredItem::from_record(keys::question_key(&question.id), question)?
            .with_gsi1(ItemKey::new(
                keys::topic(&question.metadata.topic),
                keys::question(&question.id),
            ))
            .with_gsi2(ItemKey::new(
                keys::difficulty(question.metadata.difficulty.as_str()),
                keys::question(&question.id),
            ));
        self.store.put(Table::ExamQuestions, item).await
    }

    // ========== 考试成绩 ==========

    pub async fn save_exam_result(
        &self,
        user_id: &str,
        exam_id: &str,
        submission: ExamSubmission,
    ) -> AppResult<ExamResult> {
        let now = self.clock.now();
        let result = ExamResult {
            user_id: user_id.to_string(),
            exam_id: exam_id.to_string(),
            score: submission.score,
            answers: submission.answers,
            submitted_at: now,
            created_at: now,
            updated_at: now,
        };

        let item = StoredItem::from_record(keys::exam_result_key(user_id, exam_id), &result)?
            .with_gsi1(ItemKey::new(
                keys::exam(exam_id),
                now.to_rfc3339_opts(SecondsFormat::Millis, true),
            ));
        self.store.put(Table::ExamResults, item).await?;

        info!("✓ 用户 {} 提交了试卷 {} 的成绩", user_id, exam_id);
        Ok(result)
    }

    pub async fn get_user_exam_result(
        &self,
        user_id: &str,
        exam_id: &str,
    ) -> AppResult<Option<ExamResult>> {
        self.store
            .get(Table::ExamResults, &keys::exam_result_key(user_id, exam_id))
            .await?
            .map(|item| item.decode())
            .transpose()
    }

    pub async fn get_user_exam_results(&self, user_id: &str) -> AppResult<Vec<ExamResult>> {
        let items = self
            .store
            .query(Table::ExamResults, &keys::user(user_id))
            .await?;
        decode_all(&items)
    }

    /// 一次分区查询取出该用户的成绩，只保留请求的试卷
    pub async fn batch_get_user_exam_results(
        &self,
        user_id: &str,
        exam_ids: &[String],
    ) -> AppResult<HashMap<String, ExamResult>> {
        if exam_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let results = self.get_user_exam_results(user_id).await?;
        Ok(results
            .into_iter()
            .filter(|r| exam_ids.contains(&r.exam_id))
            .map(|r| (r.exam_id.clone(), r))
            .collect())
    }

    /// 某张试卷的所有成绩，按提交时间排序
    pub async fn get_exam_results(&self, exam_id: &str) -> AppResult<Vec<ExamResult>> {
        let items = self
            .store
            .query_index(
                Table::ExamResults,
                keys::EXAM_RESULTS_INDEX,
                &keys::exam(exam_id),
            )
            .await?;
        decode_all(&items)
    }

    pub async fn delete_exam_result(
        &self,
        user_id: &str,
        exam_id: &str,
    ) -> AppResult<DeletedExamResult> {
        self.store
            .delete(Table::ExamResults, &keys::exam_result_key(user_id, exam_id))
            .await?;
        info!("✓ 已删除用户 {} 在试卷 {} 的成绩", user_id, exam_id);
        Ok(DeletedExamResult {
            user_id: user_id.to_string(),
            exam_id: exam_id.to_string(),
            deleted_at: self.clock.now(),
        })
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(items: &[StoredItem]) -> AppResult<Vec<T>> {
    items.iter().map(|item| item.decode()).collect()
}

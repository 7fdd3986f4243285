//! 试卷列表缓存 - 业务能力层
//!
//! 进程内单槽缓存：整份试卷列表 + 刷新时间。过期或失效后下一次读取重新查询。

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::Clock;
use crate::models::Exam;
use crate::services::question_repository::QuestionRepository;

struct Slot {
    exams: Vec<Exam>,
    refreshed_at: DateTime<Utc>,
}

pub struct ExamCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: Mutex<Option<Slot>>,
}

impl ExamCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// 读穿：缓存为空或已过期时查询仓储并替换整个槽
    pub async fn get_exams(&self, repository: &QuestionRepository) -> AppResult<Vec<Exam>> {
        if let Some(exams) = self.fresh_exams() {
            debug!("试卷列表命中缓存 ({} 条)", exams.len());
            return Ok(exams);
        }

        let exams = repository.get_exams().await?;
        debug!("试卷列表已刷新 ({} 条)", exams.len());

        *self.lock() = Some(Slot {
            exams: exams.clone(),
            refreshed_at: self.clock.now(),
        });
        Ok(exams)
    }

    /// 只在缓存未过期时查找，不触发查询
    pub fn find(&self, exam_id: &str) -> Option<Exam> {
        self.fresh_exams()?.into_iter().find(|e| e.id == exam_id)
    }

    pub fn invalidate(&self) {
        if self.lock().take().is_some() {
            debug!("试卷列表缓存已失效");
        }
    }

    /// 给缓存中的试卷打上"已有提交"标记，不刷新
    pub fn mark_submission(&self, exam_id: &str) {
        let mut slot = self.lock();
        if let Some(exam) = slot
            .as_mut()
            .and_then(|s| s.exams.iter_mut().find(|e| e.id == exam_id))
        {
            exam.has_submissions = true;
        }
    }

    fn fresh_exams(&self) -> Option<Vec<Exam>> {
        let slot = self.lock();
        let slot = slot.as_ref()?;
        let age = self.clock.now().signed_duration_since(slot.refreshed_at);
        let expired = age.to_std().map(|age| age >= self.ttl).unwrap_or(false);
        (!expired).then(|| slot.exams.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Slot>> {
        self.slot.lock().unwrap_or_else(|p| p.into_inner())
    }
}

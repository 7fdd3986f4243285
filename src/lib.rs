//! # Exam Question Import
//!
//! 把人工粘贴的题目文本导入题库，并维护试卷、知识点之间的冗余数据
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（存储、时钟），只暴露能力
//! - `KvStore` - 键值存储抽象，`MemoryStore` / `JsonFileStore` 两种实现
//! - `Clock` - 可替换的时钟，缓存过期和 id 生成都依赖它
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `tokenizer` / `assembler` - 文本切分和题目组装（纯函数）
//! - `RetryingWriter` - 失败后等待重试一次
//! - `QuestionRepository` - 题目 / 试卷 / 知识点 / 成绩的持久化
//! - `ExamCache` - 试卷列表的单槽 TTL 缓存
//! - `WarnWriter` - 写 warn.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的保存流程
//! - `ImportCtx` - 上下文封装（exam_id + question_index）
//! - `QuestionFlow` - 重试 + upsert
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/import_processor` - 一次粘贴导入，逐题串行保存
//! - `orchestrator/batch_processor` - 任务文件批处理，管理资源和统计
//!
//! ### 对外接口
//! - `api::PortalApi` - 全部题库操作的入口
//!
//! ## 模块结构

pub mod api;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use api::PortalApi;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{Clock, JsonFileStore, KvStore, MemoryStore, SystemClock};
pub use models::{Exam, Question, Topic};
pub use orchestrator::{App, BatchOutcome, ImportRequest};
pub use workflow::{ImportCtx, QuestionFlow};

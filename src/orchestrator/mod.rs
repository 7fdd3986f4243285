//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 导入任务批处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载任务文件（Vec<ImportJob>）
//! - 写警告文件、清理任务文件、输出全局统计
//!
//! ### `import_processor` - 单次导入处理器
//! - 切分、组装、校验一段粘贴文本
//! - 逐题调用 QuestionFlow，题目之间保持固定间隔
//! - 响应取消信号
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<ImportJob>)
//!     ↓
//! api::PortalApi
//!     ↓
//! import_processor (处理 Vec<Question>)
//!     ↓
//! workflow::QuestionFlow (处理单个 Question)
//!     ↓
//! services (能力层：tokenize / assemble / retry / repository / cache)
//!     ↓
//! infrastructure (基础设施：KvStore / Clock)
//! ```

pub mod batch_processor;
pub mod import_processor;

pub use batch_processor::App;
pub use import_processor::{BatchOutcome, ImportProcessor, ImportRequest, ItemFailure};

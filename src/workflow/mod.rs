pub mod question_ctx;
pub mod question_flow;

pub use question_ctx::ImportCtx;
pub use question_flow::{QuestionFlow, SaveResult};

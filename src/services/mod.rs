pub mod assembler;
pub mod exam_cache;
pub mod question_repository;
pub mod retrying_writer;
pub mod tokenizer;
pub mod warn_writer;

pub use assembler::{
    assemble, AssembledBatch, IdSequence, ImportMode, ParseFallback, Selection,
};
pub use exam_cache::ExamCache;
pub use question_repository::{QuestionRepository, UpsertOutcome};
pub use retrying_writer::RetryingWriter;
pub use tokenizer::tokenize;
pub use warn_writer::{WarnKind, WarnWriter};

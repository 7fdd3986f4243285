pub mod content;
pub mod exam;
pub mod exam_result;
pub mod import_job;
pub mod loaders;
pub mod question;
pub mod topic;

pub use content::{ContentItem, ContentType, Dimensions, QuestionOption};
pub use exam::{Exam, ExamId, ExamMetadata, ExamQuestions, NewExam};
pub use exam_result::{DeletedExamResult, ExamResult, ExamSubmission};
pub use import_job::ImportJob;
pub use loaders::{load_all_import_jobs, load_import_job};
pub use question::{Difficulty, Marks, Question, QuestionMetadata, QuestionType};
pub use topic::Topic;

pub mod payload;
pub mod quiz;

pub use payload::DataPayload;
pub use quiz::{
    AnswerType, FileType, Label, PageContent, PageLink, QuestionAnalysis, QuizRequest,
    SubmissionPayload, SubmissionResult, TaskType,
};

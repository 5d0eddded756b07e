pub mod answer_computer;
pub mod content_extractor;
pub mod question_analyzer;

pub use answer_computer::{coerce_answer, parse_raw_answer, AnswerComputer};
pub use content_extractor::ContentExtractor;
pub use question_analyzer::{extract_submit_url, parse_analysis, QuestionAnalyzer};

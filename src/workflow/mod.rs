pub mod quiz_flow;
pub mod quiz_session;

pub use quiz_flow::{Progress, QuizFlow, QuizSolver, SolvedQuiz};
pub use quiz_session::{ChainState, QuizSession};

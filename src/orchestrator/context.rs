//! 答题能力上下文
//!
//! 链控制器需要的全部依赖都从这里显式传入，没有进程级全局状态

use std::sync::Arc;

use crate::clients::{AnswerSubmitter, LlmClient, SubmitClient};
use crate::config::Config;
use crate::infrastructure::PageFetcher;
use crate::workflow::{QuizFlow, QuizSolver};

/// 答题链共享的只读配置和协作者
#[derive(Clone)]
pub struct QuizContext {
    pub config: Arc<Config>,
    pub solver: Arc<dyn QuizSolver>,
    pub submitter: Arc<dyn AnswerSubmitter>,
}

impl QuizContext {
    pub fn new(
        config: Arc<Config>,
        solver: Arc<dyn QuizSolver>,
        submitter: Arc<dyn AnswerSubmitter>,
    ) -> Self {
        Self {
            config,
            solver,
            submitter,
        }
    }

    /// 用真实的 LLM 和提交客户端组装上下文
    pub fn production(config: Arc<Config>, fetcher: Arc<dyn PageFetcher>) -> Self {
        let llm = Arc::new(LlmClient::new(&config));
        let solver = Arc::new(QuizFlow::new(fetcher, llm, config.data_char_budget));
        let submitter = Arc::new(SubmitClient::new());
        Self::new(config, solver, submitter)
    }
}

//! 答题链控制器 - 编排层
//!
//! ## 职责
//!
//! 对一个会话反复执行"求解 → 提交"，直到：
//! - 服务器判定正确且不再给出下一题（成功）
//! - 总时长超过上限（超时）
//! - 同一道题的尝试次数用完（重试耗尽）
//! - 任一步骤出错（致命，不做单步重试）
//!
//! 重试是立即进行的，没有退避

use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::AppResult;
use crate::models::SubmissionResult;
use crate::orchestrator::QuizContext;
use crate::utils::truncate_text;
use crate::workflow::{ChainState, QuizSession};

/// 答题链的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    Success,
    Timeout,
    Exhausted,
    Fatal(String),
}

impl ChainOutcome {
    pub fn terminal_state(&self) -> ChainState {
        match self {
            ChainOutcome::Success => ChainState::DoneSuccess,
            ChainOutcome::Timeout => ChainState::DoneTimeout,
            ChainOutcome::Exhausted => ChainState::DoneExhausted,
            ChainOutcome::Fatal(_) => ChainState::DoneFatal,
        }
    }
}

/// 答题链结束后的统计
#[derive(Debug, Clone, PartialEq)]
pub struct ChainReport {
    pub session_id: u64,
    pub outcome: ChainOutcome,
    pub final_state: ChainState,
    pub attempts: u32,
    pub elapsed: Duration,
    pub urls_visited: Vec<String>,
    pub last_url: String,
}

/// 一次提交之后的下一步
#[derive(Debug, Clone, PartialEq, Eq)]
enum NextStep {
    Advance(String),
    Retry,
    Stop(ChainOutcome),
}

/// 根据提交结果决定下一步
fn next_step(
    result: &SubmissionResult,
    current_url: &str,
    retry_count: u32,
    max_retries: u32,
) -> NextStep {
    match (result.correct, result.next_url()) {
        (true, Some(next)) => NextStep::Advance(next.to_string()),
        (true, None) => NextStep::Stop(ChainOutcome::Success),
        // 服务器给出其他题目时直接跳过，不占用重试
        (false, Some(next)) if next != current_url => NextStep::Advance(next.to_string()),
        (false, _) if retry_count < max_retries => NextStep::Retry,
        (false, _) => NextStep::Stop(ChainOutcome::Exhausted),
    }
}

/// 答题链控制器
#[derive(Clone)]
pub struct ChainController {
    ctx: QuizContext,
}

impl ChainController {
    pub fn new(ctx: QuizContext) -> Self {
        Self { ctx }
    }

    /// 运行整条答题链直到终止状态
    pub async fn run(&self, mut session: QuizSession) -> ChainReport {
        let config = &self.ctx.config;
        let timeout = config.quiz_timeout();
        info!("{} 🚀 开始答题链: {}", session, session.current_url());

        let outcome = loop {
            if session.elapsed() >= timeout {
                warn!("{} ⏰ 已超过时长上限 {:?}", session, timeout);
                break ChainOutcome::Timeout;
            }

            session.begin_attempt();
            session.transition(ChainState::Fetching);
            let current_url = session.current_url().to_string();
            info!(
                "{} 第 {} 次尝试: {}",
                session,
                session.attempts(),
                current_url
            );

            let result = match self.attempt(&mut session).await {
                Ok(result) => result,
                Err(e) => {
                    error!("{} ❌ 处理失败，终止答题链: {}", session, e);
                    break ChainOutcome::Fatal(e.to_string());
                }
            };

            if result.correct {
                info!("{} ✓ 答案正确", session);
            } else {
                warn!(
                    "{} ✗ 答案错误: {}",
                    session,
                    truncate_text(result.reason.as_deref().unwrap_or("-"), 200)
                );
            }

            match next_step(
                &result,
                &current_url,
                session.retry_count(config.per_url_retry),
                config.max_retries,
            ) {
                NextStep::Advance(next) => {
                    session.transition(ChainState::Advancing);
                    info!("{} ➡️ 进入下一题: {}", session, next);
                    session.advance_to(next);
                }
                NextStep::Retry => {
                    session.transition(ChainState::Retrying);
                    info!("{} 🔄 重试当前题目", session);
                }
                NextStep::Stop(outcome) => break outcome,
            }
        };

        session.transition(outcome.terminal_state());
        let report = ChainReport {
            session_id: session.id(),
            outcome,
            final_state: session.state(),
            attempts: session.attempts(),
            elapsed: session.elapsed(),
            urls_visited: session.urls_visited().to_vec(),
            last_url: session.current_url().to_string(),
        };
        info!(
            "{} 🏁 答题链结束: {:?}，共 {} 次尝试，{} 道题，耗时 {:.1}s",
            session,
            report.outcome,
            report.attempts,
            report.urls_visited.len(),
            report.elapsed.as_secs_f64()
        );
        report
    }

    async fn attempt(&self, session: &mut QuizSession) -> AppResult<SubmissionResult> {
        let url = session.current_url().to_string();
        let solved = self
            .ctx
            .solver
            .solve(&url, &mut |state| session.transition(state))
            .await?;

        session.transition(ChainState::Submitting);
        let payload = session.submission(solved.answer);
        self.ctx.submitter.submit(&solved.submit_url, &payload).await
    }
}

//! 答题链会话
//!
//! 封装"我正在替谁答哪一道题、已经试了几次"这一信息，只由链控制器修改

use std::fmt::{self, Debug, Display};
use std::time::Duration;

use serde_json::Value as JsonValue;
use tokio::time::Instant;
use tracing::debug;

use crate::models::SubmissionPayload;

/// 答题链的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Fetching,
    Analyzing,
    Computing,
    Submitting,
    Advancing,
    Retrying,
    DoneSuccess,
    DoneTimeout,
    DoneExhausted,
    DoneFatal,
}

impl ChainState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ChainState::DoneSuccess
                | ChainState::DoneTimeout
                | ChainState::DoneExhausted
                | ChainState::DoneFatal
        )
    }
}

/// 一条答题链的会话状态
pub struct QuizSession {
    id: u64,
    email: String,
    secret: String,
    current_url: String,
    started_at: Instant,
    state: ChainState,
    /// 整条链累计的尝试次数
    attempts: u32,
    /// 当前 URL 上的尝试次数
    attempts_at_url: u32,
    urls_visited: Vec<String>,
}

impl QuizSession {
    /// 创建新会话，计时从此刻开始
    pub fn new(
        id: u64,
        email: impl Into<String>,
        secret: impl Into<String>,
        start_url: impl Into<String>,
    ) -> Self {
        let start_url = start_url.into();
        Self {
            id,
            email: email.into(),
            secret: secret.into(),
            current_url: start_url.clone(),
            started_at: Instant::now(),
            state: ChainState::Fetching,
            attempts: 0,
            attempts_at_url: 0,
            urls_visited: vec![start_url],
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn urls_visited(&self) -> &[String] {
        &self.urls_visited
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// 用于重试判断的计数
    pub fn retry_count(&self, per_url: bool) -> u32 {
        if per_url {
            self.attempts_at_url
        } else {
            self.attempts
        }
    }

    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
        self.attempts_at_url += 1;
    }

    /// 切换到下一道题，只重置当前 URL 的计数
    pub fn advance_to(&mut self, url: impl Into<String>) {
        self.current_url = url.into();
        self.attempts_at_url = 0;
        self.urls_visited.push(self.current_url.clone());
    }

    pub fn transition(&mut self, next: ChainState) {
        debug!("{} 状态: {:?} -> {:?}", self, self.state, next);
        self.state = next;
    }

    /// 以当前身份和 URL 构造提交内容
    pub fn submission(&self, answer: JsonValue) -> SubmissionPayload {
        SubmissionPayload {
            email: self.email.clone(),
            secret: self.secret.clone(),
            url: self.current_url.clone(),
            answer,
        }
    }
}

impl Display for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[chain #{} {}]", self.id, self.email)
    }
}

impl Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("secret", &"***")
            .field("current_url", &self.current_url)
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .field("attempts_at_url", &self.attempts_at_url)
            .finish()
    }
}

//! 答题链调度器 - 编排层
//!
//! 每个请求启动一个独立的 tokio 任务，返回 `JoinHandle` 供调用方选择等待或丢弃

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::models::QuizRequest;
use crate::orchestrator::{ChainController, ChainReport, QuizContext};
use crate::workflow::QuizSession;

/// 答题链调度器
pub struct ChainSupervisor {
    controller: Arc<ChainController>,
    next_id: AtomicU64,
    in_flight: Arc<AtomicUsize>,
}

/// 任务结束（包括 panic）时减少计数
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ChainSupervisor {
    pub fn new(ctx: QuizContext) -> Self {
        Self {
            controller: Arc::new(ChainController::new(ctx)),
            next_id: AtomicU64::new(1),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 在后台启动一条答题链
    pub fn dispatch(&self, request: QuizRequest) -> JoinHandle<ChainReport> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = QuizSession::new(id, request.email, request.secret, request.url);
        info!("{} 📨 已受理，后台开始处理", session);

        let guard = InFlightGuard::enter(self.in_flight.clone());
        let controller = self.controller.clone();
        tokio::spawn(async move {
            let _guard = guard;
            controller.run(session).await
        })
    }

    pub fn chains_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

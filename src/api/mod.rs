//! HTTP 边界
//!
//! 只负责校验请求并把答题链交给调度器，不参与答题

pub mod error;
pub mod handlers;

use std::any::Any;
use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::error;

use crate::config::Config;
use crate::orchestrator::ChainSupervisor;

pub use error::QuizApiError;

/// 处理函数共享的状态
pub struct AppState {
    pub config: Arc<Config>,
    pub supervisor: Arc<ChainSupervisor>,
}

impl AppState {
    pub fn new(config: Arc<Config>, supervisor: Arc<ChainSupervisor>) -> Self {
        Self { config, supervisor }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/quiz", post(handlers::receive_quiz))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("处理请求时发生 panic: {}", detail);

    QuizApiError::internal("Internal server error").into_response()
}

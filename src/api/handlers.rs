//! HTTP 处理函数

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{info, warn};
use validator::Validate;

use crate::api::{AppState, QuizApiError};
use crate::models::QuizRequest;

/// 受理回执
#[derive(Debug, Serialize)]
pub struct QuizAccepted {
    pub status: &'static str,
    pub message: &'static str,
    pub received_at: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub quiz_solver_ready: bool,
    pub chains_in_flight: usize,
    pub timestamp: String,
}

/// POST /quiz
///
/// 校验通过后立即返回，答题链在后台运行
pub async fn receive_quiz(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<QuizAccepted>, QuizApiError> {
    let payload: JsonValue = serde_json::from_slice(&body).map_err(|e| {
        warn!("收到无效 JSON: {}", e);
        QuizApiError::bad_request("Invalid JSON payload")
    })?;

    // 密钥先于其他字段校验
    if let Some(secret) = payload.get("secret").and_then(JsonValue::as_str) {
        if secret != state.config.secret {
            warn!(
                "密钥错误，邮箱: {}",
                payload.get("email").and_then(JsonValue::as_str).unwrap_or("-")
            );
            return Err(QuizApiError::forbidden("Invalid secret"));
        }
    }

    let request: QuizRequest = serde_json::from_value(payload).map_err(|e| {
        warn!("请求结构无效: {}", e);
        QuizApiError::bad_request(format!("Invalid request structure: {}", e))
    })?;
    request.validate().map_err(|e| {
        warn!("请求字段无效: {}", e);
        QuizApiError::bad_request(format!("Invalid request structure: {}", e))
    })?;

    info!("✓ 收到答题请求: {} -> {}", request.email, request.url);
    // 不等待答题链结束
    drop(state.supervisor.dispatch(request));

    Ok(Json(QuizAccepted {
        status: "accepted",
        message: "Quiz request accepted and processing started",
        received_at: Utc::now().to_rfc3339(),
    }))
}

/// GET /
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "ok",
        service: "Quiz Chain Solver",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        quiz_solver_ready: true,
        chains_in_flight: state.supervisor.chains_in_flight(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

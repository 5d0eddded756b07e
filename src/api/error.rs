//! HTTP 边界的错误响应

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum QuizApiError {
    BadRequest(String),
    Forbidden(String),
    Internal(String),
}

impl QuizApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        QuizApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        QuizApiError::Forbidden(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        QuizApiError::Internal(message.into())
    }
}

impl IntoResponse for QuizApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            QuizApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            QuizApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            QuizApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

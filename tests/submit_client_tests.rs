use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

use quiz_chain_solver::clients::{AnswerSubmitter, SubmitClient};
use quiz_chain_solver::error::{ApiError, AppError};
use quiz_chain_solver::infrastructure::download_to_dir;
use quiz_chain_solver::models::SubmissionPayload;

type Received = Arc<Mutex<Vec<Value>>>;

/// 模拟出题方：答案为 42 时正确并给出下一题
async fn judge(State(received): State<Received>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    received.lock().unwrap().push(body.clone());
    if body["answer"] == json!(42) {
        (
            StatusCode::OK,
            Json(json!({"correct": true, "url": "https://host/quiz-2", "reason": null})),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"correct": false, "reason": "Wrong answer"})),
        )
    }
}

async fn spawn_server() -> (SocketAddr, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/submit", post(judge))
        .route("/broken", post(|| async { "definitely not json" }))
        .route("/files/data.csv", get(|| async { "name,value\nalpha,1\n" }))
        .with_state(received.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, received)
}

fn payload(answer: Value) -> SubmissionPayload {
    SubmissionPayload {
        email: "student@example.com".to_string(),
        secret: "s3cret".to_string(),
        url: "https://host/quiz-1".to_string(),
        answer,
    }
}

#[tokio::test]
async fn test_correct_answer_returns_next_url() {
    let (addr, received) = spawn_server().await;
    let client = SubmitClient::new();

    let result = assert_ok!(
        client
            .submit(&format!("http://{}/submit", addr), &payload(json!(42)))
            .await
    );

    assert!(result.correct);
    assert_eq!(result.next_url(), Some("https://host/quiz-2"));

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0],
        json!({
            "email": "student@example.com",
            "secret": "s3cret",
            "url": "https://host/quiz-1",
            "answer": 42
        })
    );
}

#[tokio::test]
async fn test_wrong_answer_with_error_status_is_still_decoded() {
    let (addr, _) = spawn_server().await;
    let client = SubmitClient::new();

    let result = assert_ok!(
        client
            .submit(&format!("http://{}/submit", addr), &payload(json!("41")))
            .await
    );

    assert!(!result.correct);
    assert_eq!(result.next_url(), None);
    assert_eq!(result.reason.as_deref(), Some("Wrong answer"));
}

#[tokio::test]
async fn test_non_json_response_is_an_error() {
    let (addr, _) = spawn_server().await;
    let client = SubmitClient::new();

    let err = assert_err!(
        client
            .submit(&format!("http://{}/broken", addr), &payload(json!(1)))
            .await
    );
    assert!(matches!(err, AppError::Api(ApiError::InvalidResponse { .. })));
}

#[tokio::test]
async fn test_download_writes_file_named_after_url() {
    let (addr, _) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let http = reqwest::Client::new();

    let path = assert_ok!(
        download_to_dir(&http, &format!("http://{}/files/data.csv", addr), dir.path()).await
    );

    assert_eq!(path, dir.path().join("data.csv"));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "name,value\nalpha,1\n"
    );
}

#[tokio::test]
async fn test_download_rejects_missing_file() {
    let (addr, _) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let http = reqwest::Client::new();

    let err = assert_err!(
        download_to_dir(&http, &format!("http://{}/files/missing.csv", addr), dir.path()).await
    );
    assert!(matches!(
        err,
        AppError::Api(ApiError::BadStatus { status: 404, .. })
    ));
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use quiz_chain_solver::api::{create_router, AppState};
use quiz_chain_solver::clients::AnswerSubmitter;
use quiz_chain_solver::error::AppResult;
use quiz_chain_solver::models::{SubmissionPayload, SubmissionResult};
use quiz_chain_solver::workflow::{Progress, QuizSolver, SolvedQuiz};
use quiz_chain_solver::{ChainSupervisor, Config, QuizContext};

const SECRET: &str = "s3cret";

/// 永远不结束的求解器，用来证明响应不等待答题链
#[derive(Default)]
struct StuckSolver {
    calls: AtomicUsize,
}

#[async_trait]
impl QuizSolver for StuckSolver {
    async fn solve(&self, _url: &str, _progress: Progress<'_>) -> AppResult<SolvedQuiz> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

struct NeverCalled;

#[async_trait]
impl AnswerSubmitter for NeverCalled {
    async fn submit(
        &self,
        _submit_url: &str,
        _payload: &SubmissionPayload,
    ) -> AppResult<SubmissionResult> {
        panic!("submit should not be reached");
    }
}

struct TestApp {
    router: Router,
    solver: Arc<StuckSolver>,
    supervisor: Arc<ChainSupervisor>,
}

fn create_test_app() -> TestApp {
    let config = Arc::new(Config {
        email: "student@example.com".to_string(),
        secret: SECRET.to_string(),
        ..Config::default()
    });
    let solver = Arc::new(StuckSolver::default());
    let ctx = QuizContext::new(config.clone(), solver.clone(), Arc::new(NeverCalled));
    let supervisor = Arc::new(ChainSupervisor::new(ctx));
    let state = Arc::new(AppState::new(config, supervisor.clone()));

    TestApp {
        router: create_router(state),
        solver,
        supervisor,
    }
}

fn post_quiz(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/quiz")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_malformed_json_is_rejected_before_any_chain() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(post_quiz("{\"email\": \"student@example.com\", "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "Invalid JSON payload");
    assert_eq!(app.supervisor.chains_in_flight(), 0);
    assert_eq!(app.solver.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_wrong_secret_is_forbidden_regardless_of_other_fields() {
    let app = create_test_app();

    let bodies = [
        json!({"email": "student@example.com", "secret": "nope", "url": "https://host/quiz-1"}),
        json!({"email": "not-an-email", "secret": "nope"}),
        json!({"secret": "", "url": 42}),
    ];

    for body in bodies {
        let response = app
            .router
            .clone()
            .oneshot(post_quiz(body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "body: {}", body);
        assert_eq!(read_json(response).await["error"], "Invalid secret");
    }
    assert_eq!(app.supervisor.chains_in_flight(), 0);
}

#[tokio::test]
async fn test_invalid_fields_are_bad_requests() {
    let app = create_test_app();

    let bodies = [
        json!({"email": "student@example.com", "secret": SECRET}),
        json!({"email": "not-an-email", "secret": SECRET, "url": "https://host/quiz-1"}),
        json!({"email": "student@example.com", "secret": SECRET, "url": "not a url"}),
        json!(["student@example.com", SECRET]),
    ];

    for body in bodies {
        let response = app
            .router
            .clone()
            .oneshot(post_quiz(body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let error = read_json(response).await["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("Invalid request structure"), "error: {}", error);
    }
    assert_eq!(app.supervisor.chains_in_flight(), 0);
}

#[tokio::test]
async fn test_valid_request_is_accepted_without_waiting_for_the_chain() {
    let app = create_test_app();
    let body = json!({
        "email": "student@example.com",
        "secret": SECRET,
        "url": "https://host/quiz-1"
    });

    // 答题链永远不会结束，响应必须仍然立即返回
    let response = tokio::time::timeout(
        Duration::from_secs(2),
        app.router.clone().oneshot(post_quiz(body.to_string())),
    )
    .await
    .expect("response must not wait for the chain")
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["status"], "accepted");
    assert_eq!(json["message"], "Quiz request accepted and processing started");
    assert!(json["received_at"].is_string());
    assert_eq!(app.supervisor.chains_in_flight(), 1);
}

#[tokio::test]
async fn test_health_reports_chains_in_flight() {
    let app = create_test_app();
    let body = json!({
        "email": "student@example.com",
        "secret": SECRET,
        "url": "https://host/quiz-1"
    });
    let response = app
        .router
        .clone()
        .oneshot(post_quiz(body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["quiz_solver_ready"], true);
    assert_eq!(json["chains_in_flight"], 1);
}

#[tokio::test]
async fn test_root_reports_service() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "Quiz Chain Solver");
    assert!(json["timestamp"].is_string());
}

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use survey_capture_api::{
    config::{Config, StorageConfig},
    create_router,
    services::{survey_store::FileSurveyStore, AppState},
};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    _dir: TempDir,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::default())
}

/// Router over a survey store living in a fresh temporary directory.
pub fn create_test_app_with(mut config: Config) -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("surveys.json");
    config.storage = StorageConfig::File { path: path.clone() };

    let state = Arc::new(AppState::with_store(
        config,
        Arc::new(FileSurveyStore::new(path)),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> Response {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_text(&self, uri: &str, body: &str) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "text/plain")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_empty(&self, uri: &str) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Creates a survey through the API and returns its JSON.
    pub async fn create_survey(&self, body: Value) -> Value {
        let response = self.post_json("/api/v1/surveys", body).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    /// Starts a session and returns its id.
    pub async fn start_session(&self, survey_id: &str) -> String {
        let response = self
            .post_empty(&format!("/api/v1/surveys/{}/sessions", survey_id))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Two questions: a mandatory single-choice `A/B` and an optional free-text.
pub fn choice_and_text_survey() -> Value {
    serde_json::json!({
        "title": "Feedback",
        "questions": [
            {"type": "single-choice", "questionText": "Q1", "mandatory": true, "options": ["A", "B"]},
            {"type": "free-text", "questionText": "Q2", "mandatory": false}
        ]
    })
}

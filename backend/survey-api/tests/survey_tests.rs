mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_health_reports_store() {
    let app = common::create_test_app();

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = common::body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["dependencies"]["survey_store"]["backend"], "file");
    assert_eq!(json["active_sessions"], 0);
}

#[tokio::test]
async fn test_create_then_list_and_fetch() {
    let app = common::create_test_app();

    let survey = app.create_survey(common::choice_and_text_survey()).await;
    let id = survey["id"].as_str().unwrap();
    assert_eq!(survey["questions"][0]["id"], "question-1");
    assert_eq!(survey["questions"][0]["type"], "single-choice");
    assert_eq!(survey["questions"][0]["options"], json!(["A", "B"]));
    assert_eq!(survey["questions"][1]["type"], "free-text");

    let list = common::body_json(app.get("/api/v1/surveys").await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Feedback");
    assert_eq!(list[0]["question_count"], 2);

    let fetched = app.get(&format!("/api/v1/surveys/{}", id)).await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(common::body_json(fetched).await, survey);
}

#[tokio::test]
async fn test_create_rejects_empty_title() {
    let app = common::create_test_app();

    let response = app
        .post_json("/api/v1/surveys", json!({"title": "", "questions": []}))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let list = common::body_json(app.get("/api/v1/surveys").await).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_rejects_unknown_question_type_as_json() {
    let app = common::create_test_app();

    let response = app
        .post_json(
            "/api/v1/surveys",
            json!({"title": "T", "questions": [{"type": "slider"}]}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = common::body_json(response).await;
    assert_eq!(json["status"], 422);
}

#[tokio::test]
async fn test_import_script_round_trip() {
    let app = common::create_test_app();
    let script = r#"{
        "title": "Legacy",
        "questions": [
            {"id": "question-1", "type": "mcq", "questionText": "Pick", "mandatory": true, "options": ["Yes", "No"]},
            {"id": "question-2", "type": "subjective", "questionText": "Why", "mandatory": false, "options": []}
        ],
        "excelUrl": ""
    }"#;

    let response = app.post_text("/api/v1/surveys/import", script).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let imported = common::body_json(response).await;
    let id = imported["id"].as_str().unwrap();
    assert_eq!(imported["questions"][0]["type"], "single-choice");
    assert!(imported.get("excelUrl").is_none());

    let exported = app.get(&format!("/api/v1/surveys/{}/script", id)).await;
    assert_eq!(exported.status(), StatusCode::OK);
    let script_text = common::body_text(exported).await;
    let reparsed: serde_json::Value = serde_json::from_str(&script_text).unwrap();
    assert_eq!(reparsed, imported);
}

#[tokio::test]
async fn test_import_errors_leave_store_unchanged() {
    let app = common::create_test_app();
    app.create_survey(common::choice_and_text_survey()).await;

    let malformed = app.post_text("/api/v1/surveys/import", "{\"title\": ").await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let missing = app
        .post_text("/api/v1/surveys/import", r#"{"title": "No questions"}"#)
        .await;
    assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let list = common::body_json(app.get("/api/v1/surveys").await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_survey() {
    let app = common::create_test_app();
    let survey = app.create_survey(common::choice_and_text_survey()).await;
    let uri = format!("/api/v1/surveys/{}", survey["id"].as_str().unwrap());

    assert_eq!(app.delete(&uri).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_survey_cannot_start_session() {
    let app = common::create_test_app();

    let response = app
        .post_empty(&format!("/api/v1/surveys/{}/sessions", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_responses_carry_trace_id() {
    let app = common::create_test_app();

    let response = app.get("/api/v1/surveys").await;
    assert!(response.headers().contains_key("x-trace-id"));
}

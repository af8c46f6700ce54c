use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::extractors::AppJson;
use crate::models::session::StartSessionResponse;
use crate::models::survey::CreateSurveyRequest;
use crate::services::survey_service::{ImportError, SurveyError, SurveyService};
use crate::services::AppState;

fn survey_error(e: SurveyError) -> (StatusCode, String) {
    let status = match &e {
        SurveyError::NotFound(_) => StatusCode::NOT_FOUND,
        SurveyError::Import(ImportError::MalformedJson(_)) => StatusCode::BAD_REQUEST,
        SurveyError::Import(_) | SurveyError::Draft(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SurveyError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("Survey operation failed: {}", e);
    } else {
        tracing::warn!("Survey request rejected: {}", e);
    }
    (status, e.to_string())
}

/// GET /api/v1/surveys
pub async fn list_surveys(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SurveyService::new(state.store.clone());
    let surveys = service.list().await.map_err(survey_error)?;
    Ok(Json(surveys))
}

/// POST /api/v1/surveys
pub async fn create_survey(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateSurveyRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    req.validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let service = SurveyService::new(state.store.clone());
    let survey = service.create(req).await.map_err(survey_error)?;
    Ok((StatusCode::CREATED, Json(survey)))
}

/// POST /api/v1/surveys/import, body is the raw script text.
pub async fn import_survey(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SurveyService::new(state.store.clone());
    let survey = service.import_script(&body).await.map_err(survey_error)?;
    Ok((StatusCode::CREATED, Json(survey)))
}

pub async fn get_survey(
    State(state): State<Arc<AppState>>,
    Path(survey_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SurveyService::new(state.store.clone());
    let survey = service.get(survey_id).await.map_err(survey_error)?;
    Ok(Json(survey))
}

pub async fn delete_survey(
    State(state): State<Arc<AppState>>,
    Path(survey_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = SurveyService::new(state.store.clone());
    service.delete(survey_id).await.map_err(survey_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/surveys/{id}/script
pub async fn survey_script(
    State(state): State<Arc<AppState>>,
    Path(survey_id): Path<Uuid>,
) -> Result<Response, (StatusCode, String)> {
    let service = SurveyService::new(state.store.clone());
    let script = service.script(survey_id).await.map_err(survey_error)?;

    let mut response = Response::new(script.into());
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    Ok(response)
}

/// POST /api/v1/surveys/{id}/sessions - navigate into a survey
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Path(survey_id): Path<Uuid>,
) -> Result<(StatusCode, Json<StartSessionResponse>), (StatusCode, String)> {
    let service = SurveyService::new(state.store.clone());
    let survey = service.get(survey_id).await.map_err(survey_error)?;

    let started = state
        .sessions
        .start(Arc::new(survey))
        .await
        .map_err(|e| {
            tracing::error!("Failed to start session: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok((StatusCode::CREATED, Json(started)))
}

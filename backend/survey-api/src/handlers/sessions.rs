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
use crate::models::answer::{SubmitAnswerRequest, SubmitAnswerResponse};
use crate::models::pointer::RecordPointerRequest;
use crate::models::session::IncompleteSubmission;
use crate::services::export_encoder::XLSX_CONTENT_TYPE;
use crate::services::session_service::SessionError;
use crate::services::validation::INCOMPLETE_NOTICE;
use crate::services::AppState;

fn session_error(e: SessionError) -> Response {
    match e {
        SessionError::Incomplete(incomplete) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(IncompleteSubmission {
                message: INCOMPLETE_NOTICE.to_string(),
                incomplete,
            }),
        )
            .into_response(),
        SessionError::SessionNotFound(_) | SessionError::UnknownQuestion(_) => {
            tracing::warn!("Session request rejected: {}", e);
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        SessionError::Pointer(_) => {
            tracing::warn!("Pointer samples rejected: {}", e);
            (StatusCode::CONFLICT, e.to_string()).into_response()
        }
        SessionError::Export(_) => {
            tracing::error!("Failed to export session: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, Response> {
    let snapshot = state
        .sessions
        .snapshot(session_id)
        .await
        .map_err(session_error)?;
    Ok(Json(snapshot))
}

/// DELETE /api/v1/sessions/{id} - leave without submitting
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, Response> {
    state.sessions.end(session_id).await.map_err(session_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn record_answer(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    AppJson(req): AppJson<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, Response> {
    req.validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response())?;

    tracing::debug!(
        session_id = %session_id,
        question_id = %req.question_id,
        "Recording answer"
    );

    let (answer, first_interaction_ms) = state
        .sessions
        .record_answer(session_id, &req.question_id, req.value)
        .await
        .map_err(session_error)?;

    Ok(Json(SubmitAnswerResponse {
        question_id: req.question_id,
        answer,
        first_interaction_ms,
    }))
}

pub async fn record_pointer(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    AppJson(req): AppJson<RecordPointerRequest>,
) -> Result<impl IntoResponse, Response> {
    let recorded = state
        .sessions
        .record_pointer_samples(session_id, req.samples)
        .await
        .map_err(session_error)?;
    Ok(Json(recorded))
}

/// POST /api/v1/sessions/{id}/submit - validate and download the workbook
pub async fn submit_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, Response> {
    tracing::info!(session_id = %session_id, "Submitting session");

    let workbook = state
        .sessions
        .submit(session_id)
        .await
        .map_err(session_error)?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.config.export_filename.replace('"', "")
    );
    let disposition = HeaderValue::from_str(&disposition).map_err(|e| {
        tracing::error!("Invalid export filename: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
    })?;

    let mut response = Response::new(workbook.into());
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(XLSX_CONTENT_TYPE),
    );
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);

    Ok(response)
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::answer::Answer;
use super::survey::Survey;

/// Navigation payload returned when a respondent enters a survey.
#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub survey: Survey,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub survey_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub responses: Vec<ResponseEntry>,
    pub pointer_samples: usize,
    pub dropped_pointer_samples: usize,
}

#[derive(Debug, Serialize)]
pub struct ResponseEntry {
    pub question_id: String,
    pub answer: Answer,
    pub first_interaction_ms: Option<u64>,
}

/// A mandatory question left unanswered at submit time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncompleteQuestion {
    pub question_id: String,
    pub number: usize,
    pub question_text: String,
}

#[derive(Debug, Serialize)]
pub struct IncompleteSubmission {
    pub message: String,
    pub incomplete: Vec<IncompleteQuestion>,
}

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::metrics::{SESSIONS_ACTIVE, SESSIONS_TOTAL, SUBMISSIONS_REJECTED_TOTAL};
use crate::models::pointer::{PointerSampleInput, RecordPointerResponse};
use crate::models::session::{
    IncompleteQuestion, ResponseEntry, SessionSnapshot, StartSessionResponse,
};
use crate::models::{Answer, Survey};

use super::export_encoder::{self, ExportError};
use super::pointer_tracker::{PointerError, PointerListener, PointerTracker, Recorded};
use super::response_accumulator::ResponseAccumulator;
use super::validation;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error("question {0} is not part of the survey")]
    UnknownQuestion(String),
    #[error("{} mandatory question(s) unanswered", .0.len())]
    Incomplete(Vec<IncompleteQuestion>),
    #[error(transparent)]
    Pointer(#[from] PointerError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub ttl: ChronoDuration,
    pub max_pointer_samples: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl: ChronoDuration::seconds(3600),
            max_pointer_samples: 50_000,
        }
    }
}

/// One respondent filling out one survey.
///
/// The pointer listener guard lives exactly as long as the session, so every
/// way a session leaves the registry detaches it once.
#[derive(Debug)]
pub struct SurveySession {
    id: Uuid,
    survey: Arc<Survey>,
    started_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    accumulator: ResponseAccumulator,
    tracker: PointerTracker,
    _listener: PointerListener,
}

impl SurveySession {
    fn start(
        survey: Arc<Survey>,
        settings: &SessionSettings,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let mut tracker = PointerTracker::new(now, settings.max_pointer_samples);
        let listener = tracker.attach()?;

        Ok(Self {
            id: Uuid::new_v4(),
            accumulator: ResponseAccumulator::new(survey.clone(), now),
            survey,
            started_at: now,
            expires_at: now
                .checked_add_signed(settings.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            tracker,
            _listener: listener,
        })
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    fn snapshot(&self) -> SessionSnapshot {
        let responses = self
            .survey
            .questions
            .iter()
            .zip(self.accumulator.answers())
            .zip(self.accumulator.timings())
            .map(|((question, answer), timing)| ResponseEntry {
                question_id: question.id.clone(),
                answer: answer.clone(),
                first_interaction_ms: *timing,
            })
            .collect();

        SessionSnapshot {
            session_id: self.id,
            survey_id: self.survey.id,
            started_at: self.started_at,
            expires_at: self.expires_at,
            responses,
            pointer_samples: self.tracker.samples().len(),
            dropped_pointer_samples: self.tracker.dropped(),
        }
    }
}

/// In-memory registry of open sessions.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, SurveySession>>>,
    settings: SessionSettings,
}

impl SessionRegistry {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            settings,
        }
    }

    pub async fn start(&self, survey: Arc<Survey>) -> Result<StartSessionResponse, SessionError> {
        let session = SurveySession::start(survey, &self.settings, Utc::now())?;
        let response = StartSessionResponse {
            session_id: session.id,
            survey: session.survey.as_ref().clone(),
            started_at: session.started_at,
            expires_at: session.expires_at,
        };

        tracing::info!(
            session_id = %session.id,
            survey_id = %session.survey.id,
            questions = session.survey.questions.len(),
            "survey session started"
        );

        self.sessions.lock().await.insert(session.id, session);
        SESSIONS_TOTAL.with_label_values(&["started"]).inc();
        SESSIONS_ACTIVE.inc();

        Ok(response)
    }

    pub async fn snapshot(&self, session_id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = live_session(&mut sessions, session_id)?;
        Ok(session.snapshot())
    }

    pub async fn record_answer(
        &self,
        session_id: Uuid,
        question_id: &str,
        value: String,
    ) -> Result<(Answer, Option<u64>), SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = live_session(&mut sessions, session_id)?;

        let answer = session.accumulator.set_answer(question_id, value)?.clone();
        let timing = session.accumulator.timing(question_id);
        Ok((answer, timing))
    }

    /// Applies a batch of pointer-move events in the order given.
    pub async fn record_pointer_samples(
        &self,
        session_id: Uuid,
        samples: Vec<PointerSampleInput>,
    ) -> Result<RecordPointerResponse, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = live_session(&mut sessions, session_id)?;

        let mut accepted = 0;
        let mut dropped = 0;
        for sample in samples {
            let at = sample.at.unwrap_or_else(Utc::now);
            match session.tracker.record(sample.x, sample.y, at)? {
                Recorded::Appended => accepted += 1,
                Recorded::Dropped => dropped += 1,
            }
        }

        Ok(RecordPointerResponse {
            accepted,
            dropped,
            trace_len: session.tracker.samples().len(),
        })
    }

    /// Validates and exports the session. On success the session is torn
    /// down and the workbook bytes are returned; on a validation failure the
    /// session is left open untouched.
    pub async fn submit(&self, session_id: Uuid) -> Result<Vec<u8>, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = live_session(&mut sessions, session_id)?;

        let incomplete =
            validation::describe_incomplete(&session.survey, session.accumulator.answers());
        if !incomplete.is_empty() {
            SUBMISSIONS_REJECTED_TOTAL.inc();
            tracing::info!(
                session_id = %session_id,
                incomplete = incomplete.len(),
                "submission rejected, mandatory questions unanswered"
            );
            return Err(SessionError::Incomplete(incomplete));
        }

        let tables = export_encoder::build_tables(
            &session.survey,
            session.accumulator.answers(),
            session.accumulator.timings(),
            session.tracker.samples(),
        );
        let workbook = export_encoder::write_workbook(&tables)?;

        sessions.remove(&session_id);
        SESSIONS_TOTAL.with_label_values(&["submitted"]).inc();
        SESSIONS_ACTIVE.dec();
        tracing::info!(
            session_id = %session_id,
            bytes = workbook.len(),
            "survey session submitted"
        );

        Ok(workbook)
    }

    /// Tears the session down without exporting anything.
    pub async fn end(&self, session_id: Uuid) -> Result<(), SessionError> {
        let removed = self.sessions.lock().await.remove(&session_id);
        match removed {
            Some(_) => {
                SESSIONS_TOTAL.with_label_values(&["ended"]).inc();
                SESSIONS_ACTIVE.dec();
                tracing::info!(session_id = %session_id, "survey session ended");
                Ok(())
            }
            None => Err(SessionError::SessionNotFound(session_id)),
        }
    }

    /// Drops every session past its expiry, returning how many were removed.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        let removed = before - sessions.len();

        if removed > 0 {
            SESSIONS_TOTAL
                .with_label_values(&["expired"])
                .inc_by(removed as u64);
            SESSIONS_ACTIVE.sub(removed as i64);
            tracing::info!(removed, "expired survey sessions swept");
        }

        removed
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub fn spawn_expiry_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                registry.sweep_expired(Utc::now()).await;
            }
        })
    }
}

/// Looks up an open session; an expired one is removed and reported missing.
fn live_session(
    sessions: &mut HashMap<Uuid, SurveySession>,
    session_id: Uuid,
) -> Result<&mut SurveySession, SessionError> {
    let expired = match sessions.get(&session_id) {
        Some(session) => session.is_expired(Utc::now()),
        None => return Err(SessionError::SessionNotFound(session_id)),
    };

    if expired {
        sessions.remove(&session_id);
        SESSIONS_TOTAL.with_label_values(&["expired"]).inc();
        SESSIONS_ACTIVE.dec();
        tracing::info!(session_id = %session_id, "survey session expired");
        return Err(SessionError::SessionNotFound(session_id));
    }

    sessions
        .get_mut(&session_id)
        .ok_or(SessionError::SessionNotFound(session_id))
}

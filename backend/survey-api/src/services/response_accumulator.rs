use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::metrics::ANSWERS_RECORDED_TOTAL;
use crate::models::{Answer, QuestionType, Survey};
use crate::utils::time::elapsed_millis;

use super::session_service::SessionError;

/// Current answers plus first-interaction timings for one session.
///
/// `answers` and `timings` are index-aligned with `survey.questions`.
#[derive(Debug)]
pub struct ResponseAccumulator {
    survey: Arc<Survey>,
    started_at: DateTime<Utc>,
    answers: Vec<Answer>,
    timings: Vec<Option<u64>>,
}

impl ResponseAccumulator {
    pub fn new(survey: Arc<Survey>, started_at: DateTime<Utc>) -> Self {
        let answers = survey.questions.iter().map(Answer::empty_for).collect();
        let timings = vec![None; survey.questions.len()];
        Self {
            survey,
            started_at,
            answers,
            timings,
        }
    }

    pub fn set_answer(&mut self, question_id: &str, value: String) -> Result<&Answer, SessionError> {
        self.set_answer_at(question_id, value, Utc::now())
    }

    /// Applies an edit observed at `at`. Unknown ids leave all state untouched.
    pub fn set_answer_at(
        &mut self,
        question_id: &str,
        value: String,
        at: DateTime<Utc>,
    ) -> Result<&Answer, SessionError> {
        let Some(index) = self.survey.question_position(question_id) else {
            tracing::error!(
                survey_id = %self.survey.id,
                question_id,
                "answer for a question that is not part of the survey"
            );
            return Err(SessionError::UnknownQuestion(question_id.to_string()));
        };

        if self.timings[index].is_none() {
            self.timings[index] = Some(elapsed_millis(self.started_at, at));
        }

        let question_type = self.survey.questions[index].kind.question_type();
        ANSWERS_RECORDED_TOTAL
            .with_label_values(&[question_type_label(question_type)])
            .inc();

        let answer = &mut self.answers[index];
        answer.apply(value);
        Ok(&*answer)
    }

    pub fn survey(&self) -> &Arc<Survey> {
        &self.survey
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.survey
            .question_position(question_id)
            .map(|index| &self.answers[index])
    }

    pub fn timings(&self) -> &[Option<u64>] {
        &self.timings
    }

    pub fn timing(&self, question_id: &str) -> Option<u64> {
        self.survey
            .question_position(question_id)
            .and_then(|index| self.timings[index])
    }
}

fn question_type_label(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::SingleChoice => "single-choice",
        QuestionType::MultiSelect => "multi-select",
        QuestionType::FreeText => "free-text",
    }
}

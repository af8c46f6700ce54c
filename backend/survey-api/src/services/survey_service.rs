use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::SURVEYS_TOTAL;
use crate::models::survey::CreateSurveyRequest;
use crate::models::{DraftError, Survey, SurveyDraft, SurveySummary};

use super::survey_store::SurveyStore;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("survey script is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
    #[error("survey script needs a non-empty title and a questions list")]
    MissingFields,
    #[error("survey script has invalid questions: {0}")]
    InvalidQuestions(String),
}

#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("survey {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("survey store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

pub struct SurveyService {
    store: Arc<dyn SurveyStore>,
}

impl SurveyService {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<SurveySummary>, SurveyError> {
        let surveys = self.store.list_surveys().await?;
        Ok(surveys.iter().map(SurveySummary::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Survey, SurveyError> {
        self.store
            .list_surveys()
            .await?
            .into_iter()
            .find(|survey| survey.id == id)
            .ok_or(SurveyError::NotFound(id))
    }

    /// Builds a survey from the editor payload and appends it to the store.
    pub async fn create(&self, req: CreateSurveyRequest) -> Result<Survey, SurveyError> {
        let survey = SurveyDraft::try_from(req)?.build()?;
        self.store.append_survey(survey.clone()).await?;

        SURVEYS_TOTAL.with_label_values(&["created"]).inc();
        tracing::info!(
            survey_id = %survey.id,
            title = %survey.title,
            questions = survey.questions.len(),
            "survey created"
        );
        Ok(survey)
    }

    /// Parses a pasted survey script and appends it. The store is left
    /// unchanged when the script is rejected.
    pub async fn import_script(&self, script: &str) -> Result<Survey, SurveyError> {
        let mut survey = parse_script(script)?;

        let existing = self.store.list_surveys().await?;
        if existing.iter().any(|s| s.id == survey.id) {
            let fresh = Uuid::new_v4();
            tracing::warn!(
                imported_id = %survey.id,
                new_id = %fresh,
                "imported survey id already in use, assigning a new one"
            );
            survey.id = fresh;
        }

        self.store.append_survey(survey.clone()).await?;

        SURVEYS_TOTAL.with_label_values(&["imported"]).inc();
        tracing::info!(
            survey_id = %survey.id,
            title = %survey.title,
            "survey imported"
        );
        Ok(survey)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), SurveyError> {
        if !self.store.remove_survey(id).await? {
            return Err(SurveyError::NotFound(id));
        }

        SURVEYS_TOTAL.with_label_values(&["deleted"]).inc();
        tracing::info!(survey_id = %id, "survey deleted");
        Ok(())
    }

    /// Pretty JSON of a stored survey, accepted back by `import_script`.
    pub async fn script(&self, id: Uuid) -> Result<String, SurveyError> {
        let survey = self.get(id).await?;
        survey
            .to_script()
            .map_err(|e| SurveyError::Store(anyhow::Error::new(e)))
    }
}

pub fn parse_script(script: &str) -> Result<Survey, ImportError> {
    let value: serde_json::Value =
        serde_json::from_str(script).map_err(ImportError::MalformedJson)?;

    let title_ok = value
        .get("title")
        .and_then(serde_json::Value::as_str)
        .is_some_and(|title| !title.is_empty());
    let has_questions = value
        .get("questions")
        .is_some_and(serde_json::Value::is_array);
    if !title_ok || !has_questions {
        return Err(ImportError::MissingFields);
    }

    let survey: Survey = serde_json::from_value(value)
        .map_err(|e| ImportError::InvalidQuestions(e.to_string()))?;
    survey
        .validate()
        .map_err(|e| ImportError::InvalidQuestions(e.to_string()))?;

    Ok(survey)
}

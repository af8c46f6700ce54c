use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Longest text a spreadsheet cell can hold.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Survey definition as stored in the survey record and handed to sessions.
///
/// `title` is display only; surveys are addressed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// Question variants. Only the choice variants carry options, so a free-text
/// question can never hold an option list and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    #[serde(alias = "mcq")]
    SingleChoice { options: Vec<String> },
    MultiSelect { options: Vec<String> },
    #[serde(alias = "subjective")]
    FreeText {},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    SingleChoice,
    MultiSelect,
    FreeText,
}

#[derive(Debug, Error, PartialEq)]
pub enum SurveyValidationError {
    #[error("survey title must not be empty")]
    EmptyTitle,
    #[error("duplicate question id '{0}'")]
    DuplicateQuestionId(String),
    #[error("question id must not be empty")]
    EmptyQuestionId,
    #[error("question '{0}' needs at least one option")]
    MissingOptions(String),
    #[error("question '{0}' text exceeds {max} characters", max = MAX_CELL_CHARS)]
    QuestionTextTooLong(String),
}

impl QuestionKind {
    pub fn new(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::SingleChoice => QuestionKind::SingleChoice {
                options: vec!["Option 1".to_string()],
            },
            QuestionType::MultiSelect => QuestionKind::MultiSelect {
                options: vec!["Option 1".to_string()],
            },
            QuestionType::FreeText => QuestionKind::FreeText {},
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::SingleChoice { .. } => QuestionType::SingleChoice,
            QuestionKind::MultiSelect { .. } => QuestionType::MultiSelect,
            QuestionKind::FreeText {} => QuestionType::FreeText,
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            QuestionKind::SingleChoice { options } | QuestionKind::MultiSelect { options } => {
                options
            }
            QuestionKind::FreeText {} => &[],
        }
    }

    pub fn options_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            QuestionKind::SingleChoice { options } | QuestionKind::MultiSelect { options } => {
                Some(options)
            }
            QuestionKind::FreeText {} => None,
        }
    }
}

impl Question {
    pub fn is_multi_select(&self) -> bool {
        matches!(self.kind, QuestionKind::MultiSelect { .. })
    }

    pub fn options(&self) -> &[String] {
        self.kind.options()
    }

    /// Position of `value` in the option list, used for letter codes.
    pub fn option_index(&self, value: &str) -> Option<usize> {
        self.options().iter().position(|option| option == value)
    }
}

impl Survey {
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn question_position(&self, question_id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == question_id)
    }

    /// Structural checks shared by the draft builder, create and import.
    pub fn validate(&self) -> Result<(), SurveyValidationError> {
        if self.title.trim().is_empty() {
            return Err(SurveyValidationError::EmptyTitle);
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            if question.id.is_empty() {
                return Err(SurveyValidationError::EmptyQuestionId);
            }
            if !seen.insert(question.id.as_str()) {
                return Err(SurveyValidationError::DuplicateQuestionId(
                    question.id.clone(),
                ));
            }
            if question.kind.question_type() != QuestionType::FreeText
                && question.options().is_empty()
            {
                return Err(SurveyValidationError::MissingOptions(question.id.clone()));
            }
            if question.question_text.chars().count() > MAX_CELL_CHARS {
                return Err(SurveyValidationError::QuestionTextTooLong(
                    question.id.clone(),
                ));
            }
        }

        Ok(())
    }

    /// Pretty JSON script of the survey, the format accepted by import.
    pub fn to_script(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Serialize)]
pub struct SurveySummary {
    pub id: Uuid,
    pub title: String,
    pub question_count: usize,
}

impl From<&Survey> for SurveySummary {
    fn from(survey: &Survey) -> Self {
        Self {
            id: survey.id,
            title: survey.title.clone(),
            question_count: survey.questions.len(),
        }
    }
}

/// Body of `POST /api/v1/surveys`, the editor's "Save Survey" payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSurveyRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,

    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Question text is limited to 2000 characters"))]
    pub question_text: String,

    #[serde(default)]
    pub mandatory: bool,

    #[serde(default)]
    #[validate(length(max = 100, message = "A question may have at most 100 options"))]
    pub options: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(id: &str, options: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            question_text: format!("Question {id}"),
            mandatory: false,
            kind: QuestionKind::SingleChoice {
                options: options.iter().map(|o| o.to_string()).collect(),
            },
        }
    }

    #[test]
    fn test_legacy_question_tags_are_accepted() {
        let json = r#"{
            "title": "Legacy",
            "questions": [
                {"id": "question-1", "type": "mcq", "mandatory": true, "questionText": "Pick", "options": ["A", "B"]},
                {"id": "question-2", "type": "subjective", "mandatory": false, "questionText": "Why?", "options": []},
                {"id": "question-3", "type": "multi-select", "mandatory": false, "questionText": "All", "options": ["X"]}
            ],
            "excelUrl": ""
        }"#;

        let survey: Survey = serde_json::from_str(json).unwrap();
        assert_eq!(survey.questions.len(), 3);
        assert_eq!(
            survey.questions[0].kind.question_type(),
            QuestionType::SingleChoice
        );
        assert_eq!(survey.questions[1].kind, QuestionKind::FreeText {});
        assert!(survey.questions[2].is_multi_select());
        assert!(survey.validate().is_ok());
    }

    #[test]
    fn test_serializes_with_canonical_tags() {
        let survey = Survey {
            id: Uuid::new_v4(),
            title: "T".into(),
            questions: vec![choice("q1", &["Red"])],
        };

        let value = serde_json::to_value(&survey).unwrap();
        assert_eq!(value["questions"][0]["type"], "single-choice");
        assert_eq!(value["questions"][0]["questionText"], "Question q1");
        assert_eq!(value["questions"][0]["options"][0], "Red");
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let survey = Survey {
            id: Uuid::new_v4(),
            title: "T".into(),
            questions: vec![choice("q1", &["A"]), choice("q1", &["B"])],
        };

        assert_eq!(
            survey.validate(),
            Err(SurveyValidationError::DuplicateQuestionId("q1".into()))
        );
    }

    #[test]
    fn test_validate_rejects_choice_without_options() {
        let survey = Survey {
            id: Uuid::new_v4(),
            title: "T".into(),
            questions: vec![choice("q1", &[])],
        };

        assert_eq!(
            survey.validate(),
            Err(SurveyValidationError::MissingOptions("q1".into()))
        );
    }

    #[test]
    fn test_validate_rejects_oversized_question_text() {
        let mut question = choice("q1", &["A"]);
        question.question_text = "x".repeat(MAX_CELL_CHARS + 1);
        let survey = Survey {
            id: Uuid::new_v4(),
            title: "T".into(),
            questions: vec![question],
        };

        assert_eq!(
            survey.validate(),
            Err(SurveyValidationError::QuestionTextTooLong("q1".into()))
        );
    }

    #[test]
    fn test_option_index_is_positional() {
        let question = choice("q1", &["Red", "Green", "Blue"]);
        assert_eq!(question.option_index("Green"), Some(1));
        assert_eq!(question.option_index("Purple"), None);
    }
}

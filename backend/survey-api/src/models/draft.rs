use thiserror::Error;
use uuid::Uuid;

use super::survey::{
    CreateSurveyRequest, Question, QuestionKind, QuestionType, Survey, SurveyValidationError,
};

#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    #[error("question '{0}' not found in draft")]
    QuestionNotFound(String),
    #[error("question '{0}' does not take options")]
    NoOptions(String),
    #[error("option {index} out of range for question '{question_id}'")]
    OptionOutOfRange { question_id: String, index: usize },
    #[error("question '{0}' must keep at least one option")]
    LastOption(String),
    #[error("position {0} is past the end of the draft")]
    PositionOutOfRange(usize),
    #[error(transparent)]
    Invalid(#[from] SurveyValidationError),
}

/// Editable survey under construction.
///
/// Question ids are `question-N` with `N` taken from a counter that only
/// grows, so deleting and re-adding questions never produces a duplicate id.
#[derive(Debug, Clone)]
pub struct SurveyDraft {
    title: String,
    questions: Vec<Question>,
    next_question: usize,
}

impl SurveyDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            questions: Vec::new(),
            next_question: 1,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Appends a question and returns its id.
    pub fn add_question(&mut self, question_type: QuestionType) -> String {
        let question = self.new_question(question_type);
        let id = question.id.clone();
        self.questions.push(question);
        id
    }

    pub fn set_question_text(
        &mut self,
        question_id: &str,
        text: impl Into<String>,
    ) -> Result<(), DraftError> {
        self.question_mut(question_id)?.question_text = text.into();
        Ok(())
    }

    pub fn set_mandatory(&mut self, question_id: &str, mandatory: bool) -> Result<(), DraftError> {
        self.question_mut(question_id)?.mandatory = mandatory;
        Ok(())
    }

    /// Appends `label`, or `Option N` when no label is given.
    pub fn add_option(
        &mut self,
        question_id: &str,
        label: Option<String>,
    ) -> Result<usize, DraftError> {
        let options = self.options_mut(question_id)?;
        let label = label.unwrap_or_else(|| format!("Option {}", options.len() + 1));
        options.push(label);
        Ok(options.len() - 1)
    }

    pub fn remove_option(&mut self, question_id: &str, index: usize) -> Result<String, DraftError> {
        let options = self.options_mut(question_id)?;
        if index >= options.len() {
            return Err(DraftError::OptionOutOfRange {
                question_id: question_id.to_string(),
                index,
            });
        }
        if options.len() == 1 {
            return Err(DraftError::LastOption(question_id.to_string()));
        }
        Ok(options.remove(index))
    }

    /// Freezes the draft into a survey with a freshly minted id.
    pub fn build(self) -> Result<Survey, DraftError> {
        let survey = Survey {
            id: Uuid::new_v4(),
            title: self.title,
            questions: self.questions,
        };
        survey.validate()?;
        Ok(survey)
    }

    fn new_question(&mut self, question_type: QuestionType) -> Question {
        let id = format!("question-{}", self.next_question);
        self.next_question += 1;
        Question {
            id,
            question_text: String::new(),
            mandatory: false,
            kind: QuestionKind::new(question_type),
        }
    }

    fn question_mut(&mut self, question_id: &str) -> Result<&mut Question, DraftError> {
        self.questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or_else(|| DraftError::QuestionNotFound(question_id.to_string()))
    }

    fn options_mut(&mut self, question_id: &str) -> Result<&mut Vec<String>, DraftError> {
        self.question_mut(question_id)?
            .kind
            .options_mut()
            .ok_or_else(|| DraftError::NoOptions(question_id.to_string()))
    }
}

/// Editor operations the HTTP surface does not expose; surveys are authored
/// in one request.
#[allow(dead_code)]
impl SurveyDraft {
    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Inserts a question directly after `index` ("Add Question After").
    pub(crate) fn insert_question_after(
        &mut self,
        index: usize,
        question_type: QuestionType,
    ) -> Result<String, DraftError> {
        if index >= self.questions.len() {
            return Err(DraftError::PositionOutOfRange(index));
        }
        let question = self.new_question(question_type);
        let id = question.id.clone();
        self.questions.insert(index + 1, question);
        Ok(id)
    }

    pub(crate) fn update_option(
        &mut self,
        question_id: &str,
        index: usize,
        label: impl Into<String>,
    ) -> Result<(), DraftError> {
        let options = self.options_mut(question_id)?;
        let slot = options
            .get_mut(index)
            .ok_or_else(|| DraftError::OptionOutOfRange {
                question_id: question_id.to_string(),
                index,
            })?;
        *slot = label.into();
        Ok(())
    }

    pub(crate) fn delete_question(&mut self, question_id: &str) -> Result<Question, DraftError> {
        let position = self
            .questions
            .iter()
            .position(|q| q.id == question_id)
            .ok_or_else(|| DraftError::QuestionNotFound(question_id.to_string()))?;
        Ok(self.questions.remove(position))
    }
}

impl TryFrom<CreateSurveyRequest> for SurveyDraft {
    type Error = DraftError;

    fn try_from(req: CreateSurveyRequest) -> Result<Self, Self::Error> {
        let mut draft = SurveyDraft::new(req.title);

        for input in req.questions {
            let id = draft.add_question(input.question_type);
            draft.set_question_text(&id, input.question_text)?;
            draft.set_mandatory(&id, input.mandatory)?;

            if input.question_type != QuestionType::FreeText && !input.options.is_empty() {
                // Replace the placeholder option with the submitted list.
                for label in input.options {
                    draft.add_option(&id, Some(label))?;
                }
                draft.remove_option(&id, 0)?;
            }
        }

        Ok(draft)
    }
}

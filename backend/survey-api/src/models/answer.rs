use serde::{Deserialize, Serialize};
use validator::Validate;

use super::survey::{Question, QuestionKind};

/// Current answer to one question; the variant follows the question kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Answer {
    SingleChoice(String),
    /// Selected values; membership is what counts, insertion order is kept.
    MultiSelect(Vec<String>),
    FreeText(String),
}

impl Answer {
    pub fn empty_for(question: &Question) -> Self {
        match question.kind {
            QuestionKind::SingleChoice { .. } => Answer::SingleChoice(String::new()),
            QuestionKind::MultiSelect { .. } => Answer::MultiSelect(Vec::new()),
            QuestionKind::FreeText {} => Answer::FreeText(String::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Answer::SingleChoice(value) | Answer::FreeText(value) => value.is_empty(),
            Answer::MultiSelect(values) => values.is_empty(),
        }
    }

    /// Replaces the value, or toggles membership for multi-select.
    pub fn apply(&mut self, value: String) {
        match self {
            Answer::SingleChoice(current) | Answer::FreeText(current) => *current = value,
            Answer::MultiSelect(selected) => {
                if let Some(position) = selected.iter().position(|v| *v == value) {
                    selected.remove(position);
                } else {
                    selected.push(value);
                }
            }
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub question_id: String,
    #[validate(length(max = 32767, message = "Answers are limited to 32767 characters"))]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub question_id: String,
    pub answer: Answer,
    /// Milliseconds from session start to the first edit of this question.
    pub first_interaction_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_select_toggle_parity() {
        let mut answer = Answer::MultiSelect(Vec::new());
        for value in ["Red", "Blue", "Red", "Green", "Red", "Green"] {
            answer.apply(value.to_string());
        }

        // Red x3 (kept), Blue x1 (kept), Green x2 (removed)
        assert_eq!(
            answer,
            Answer::MultiSelect(vec!["Blue".to_string(), "Red".to_string()])
        );
    }

    #[test]
    fn test_single_value_replaces() {
        let mut answer = Answer::SingleChoice(String::new());
        assert!(answer.is_empty());
        answer.apply("A".into());
        answer.apply("B".into());
        assert_eq!(answer, Answer::SingleChoice("B".into()));
        answer.apply(String::new());
        assert!(answer.is_empty());
    }
}

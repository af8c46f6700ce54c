use crate::models::session::IncompleteQuestion;
use crate::models::{Answer, Question, Survey};

pub const INCOMPLETE_NOTICE: &str = "Please answer all mandatory questions.";

/// Mandatory questions whose answer is empty, in survey order.
///
/// `answers` must be index-aligned with `survey.questions`; a missing answer
/// counts as empty.
pub fn incomplete_questions<'a>(survey: &'a Survey, answers: &[Answer]) -> Vec<&'a Question> {
    survey
        .questions
        .iter()
        .enumerate()
        .filter(|(index, question)| {
            question.mandatory && answers.get(*index).map_or(true, Answer::is_empty)
        })
        .map(|(_, question)| question)
        .collect()
}

/// Same check, shaped for the submit response.
pub fn describe_incomplete(survey: &Survey, answers: &[Answer]) -> Vec<IncompleteQuestion> {
    incomplete_questions(survey, answers)
        .into_iter()
        .map(|question| IncompleteQuestion {
            question_id: question.id.clone(),
            number: survey
                .question_position(&question.id)
                .map_or(0, |index| index + 1),
            question_text: question.question_text.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionKind;
    use uuid::Uuid;

    fn free_text(id: &str, mandatory: bool) -> Question {
        Question {
            id: id.into(),
            question_text: format!("Text {id}"),
            mandatory,
            kind: QuestionKind::FreeText {},
        }
    }

    #[test]
    fn test_returns_only_empty_mandatory_questions() {
        let survey = Survey {
            id: Uuid::new_v4(),
            title: "T".into(),
            questions: vec![free_text("q1", true), free_text("q2", false)],
        };
        let answers = vec![
            Answer::FreeText(String::new()),
            Answer::FreeText(String::new()),
        ];

        let ids: Vec<_> = incomplete_questions(&survey, &answers)
            .iter()
            .map(|q| q.id.as_str())
            .collect();
        assert_eq!(ids, vec!["q1"]);
    }

    #[test]
    fn test_empty_selection_set_is_incomplete() {
        let survey = Survey {
            id: Uuid::new_v4(),
            title: "T".into(),
            questions: vec![
                Question {
                    id: "m".into(),
                    question_text: "Pick any".into(),
                    mandatory: true,
                    kind: QuestionKind::MultiSelect {
                        options: vec!["A".into()],
                    },
                },
                free_text("q2", true),
            ],
        };
        let answers = vec![
            Answer::MultiSelect(Vec::new()),
            Answer::FreeText("filled".into()),
        ];

        let incomplete = describe_incomplete(&survey, &answers);
        assert_eq!(
            incomplete,
            vec![IncompleteQuestion {
                question_id: "m".into(),
                number: 1,
                question_text: "Pick any".into(),
            }]
        );
    }

    #[test]
    fn test_complete_survey_passes() {
        let survey = Survey {
            id: Uuid::new_v4(),
            title: "T".into(),
            questions: vec![free_text("q1", true)],
        };

        assert!(incomplete_questions(&survey, &[Answer::FreeText("ok".into())]).is_empty());
    }
}

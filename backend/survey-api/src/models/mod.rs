pub mod answer;
pub mod draft;
pub mod pointer;
pub mod session;
pub mod survey;

pub use answer::Answer;
pub use draft::{DraftError, SurveyDraft};
pub use pointer::PointerSample;
pub use survey::{Question, QuestionKind, QuestionType, Survey, SurveySummary};

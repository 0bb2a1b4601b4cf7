//! Review and quiz logic, independent of HTTP and storage.

pub mod choices;
pub mod cursor;
pub mod quiz;

pub use choices::{distinct_titles, generate_choices};
pub use cursor::{DeckCursor, Move};
pub use quiz::{Feedback, Question, QuizError, QuizGame, QuizSettings, QuizSettingsRequest};

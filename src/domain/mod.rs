pub mod card;
pub mod dictionary;
pub mod quiz;

pub use card::{filter_by_topic, topics, Card, CardId, ALL_TOPICS};
pub use dictionary::{DictionaryFile, DictionaryPage};
pub use quiz::{AnswerRecord, GameRecord, InputMode};

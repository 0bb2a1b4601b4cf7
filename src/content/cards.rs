//! Built-in deck loading.

use std::path::Path;

use super::{read_json_or_default, write_json, ContentLoadError};
use crate::domain::Card;

/// Load the built-in deck from `cards.json`.
///
/// A missing file yields an empty deck.
pub fn load_cards(path: &Path) -> Result<Vec<Card>, ContentLoadError> {
    let cards: Vec<Card> = read_json_or_default(path)?;
    tracing::debug!("Loaded {} built-in cards from {}", cards.len(), path.display());
    Ok(cards)
}

/// Write a deck to `cards.json`.
pub fn write_cards(path: &Path, cards: &[Card]) -> std::io::Result<()> {
    write_json(path, &cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CardId;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_deck() {
        let temp = TempDir::new().unwrap();
        let cards = load_cards(&temp.path().join("cards.json")).unwrap();
        assert!(cards.is_empty());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cards.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_cards(&path).unwrap_err();
        assert!(matches!(err, ContentLoadError::ParseError(_, _)));
        assert_eq!(err.user_message(), "Failed to parse content file");
    }

    #[test]
    fn test_write_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("cards.json");
        let cards = vec![
            Card::new(CardId::from(0), "Oak", "trees").with_image("./cards/trees_p0.png"),
            Card::new(CardId::from(1), "Elm", "trees"),
        ];

        write_cards(&path, &cards).unwrap();
        let loaded = load_cards(&path).unwrap();
        assert_eq!(loaded, cards);
    }

    #[test]
    fn test_loads_generator_output_shape() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cards.json");
        std::fs::write(
            &path,
            r#"[{"id": 0, "title": "Fern", "description": "Spore plant\nShade", "imagePath": "./cards/plants_p0.jpeg", "source": "plants"}]"#,
        )
        .unwrap();

        let cards = load_cards(&path).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id.as_str(), "0");
        assert_eq!(cards[0].description, "Spore plant\nShade");
        assert!(!cards[0].is_custom);
    }
}

//! Imported (custom) cards

use chrono::Utc;
use rusqlite::{params, Connection, Result, Row};

use crate::domain::{Card, CardId};

/// Append cards in order. Cards whose id already exists are replaced in place.
pub fn append_custom_cards(conn: &Connection, cards: &[Card]) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            r#"
      INSERT INTO custom_cards (id, title, description, image_path, source, page, created_at)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
      ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        description = excluded.description,
        image_path = excluded.image_path,
        source = excluded.source,
        page = excluded.page
      "#,
        )?;
        for card in cards {
            stmt.execute(params![
                card.id.as_str(),
                card.title,
                card.description,
                card.image_path,
                card.source,
                card.page,
                now,
            ])?;
        }
    }
    tx.commit()?;
    Ok(cards.len())
}

/// Insert cards whose id is not stored yet, returning how many were added
pub fn merge_custom_cards(conn: &Connection, cards: &[Card]) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let tx = conn.unchecked_transaction()?;
    let mut added = 0;
    {
        let mut stmt = tx.prepare(
            r#"
      INSERT OR IGNORE INTO custom_cards (id, title, description, image_path, source, page, created_at)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
      "#,
        )?;
        for card in cards {
            added += stmt.execute(params![
                card.id.as_str(),
                card.title,
                card.description,
                card.image_path,
                card.source,
                card.page,
                now,
            ])?;
        }
    }
    tx.commit()?;
    Ok(added)
}

/// All imported cards in import order
pub fn get_custom_cards(conn: &Connection) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, title, description, image_path, source, page
    FROM custom_cards
    ORDER BY seq
    "#,
    )?;
    let cards = stmt.query_map([], row_to_card)?.collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

pub fn count_custom_cards(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM custom_cards", [], |row| row.get(0))
}

fn row_to_card(row: &Row) -> Result<Card> {
    Ok(Card {
        id: CardId::new(row.get::<_, String>(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        image_path: row.get(3)?,
        source: row.get(4)?,
        page: row.get(5)?,
        is_custom: true,
    })
}

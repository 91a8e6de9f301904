use std::fs;
use std::path::Path;

use cardcut_core::deck::Decklist;
use tracing::info;

use crate::errors::FrontendError;

/// 读取已解析好的 JSON 牌表。数量为 0 的记录视为错误。
pub fn load_decklist(path: &Path) -> Result<Decklist, FrontendError> {
    let data = fs::read_to_string(path).map_err(|source| FrontendError::DecklistIo {
        path: path.to_path_buf(),
        source,
    })?;
    let decklist: Decklist =
        serde_json::from_str(&data).map_err(|source| FrontendError::DecklistParse {
            path: path.to_path_buf(),
            source,
        })?;
    validate_decklist(&decklist)?;
    info!(
        path = %path.display(),
        game = %decklist.game,
        entries = decklist.cards.len(),
        cards = decklist.total_quantity(),
        "已加载牌表"
    );
    Ok(decklist)
}

pub fn validate_decklist(decklist: &Decklist) -> Result<(), FrontendError> {
    match decklist
        .cards
        .iter()
        .enumerate()
        .find(|(_, card)| card.quantity == 0)
    {
        Some((index, card)) => Err(FrontendError::ZeroQuantity {
            index,
            id: card.id.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_camel_case_decklist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");
        fs::write(
            &path,
            r#"{ "game": "mtg", "cards": [
                { "id": "sol", "name": "Sol Ring", "set": "c21", "imageUrl": "https://img/sol.png",
                  "widthMm": 63, "heightMm": 88, "quantity": 2 } ] }"#,
        )
        .unwrap();

        let deck = load_decklist(&path).expect("load decklist");
        assert_eq!(deck.cards.len(), 1);
        assert_eq!(deck.cards[0].set.as_deref(), Some("c21"));
        assert_eq!(deck.total_quantity(), 2);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");
        fs::write(
            &path,
            r#"{ "cards": [
                { "id": "a", "name": "A", "widthMm": 63, "heightMm": 88 },
                { "id": "b", "name": "B", "widthMm": 63, "heightMm": 88, "quantity": 0 } ] }"#,
        )
        .unwrap();

        match load_decklist(&path) {
            Err(FrontendError::ZeroQuantity { index, id }) => {
                assert_eq!(index, 1);
                assert_eq!(id, "b");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_and_malformed_files_report_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_decklist(&missing),
            Err(FrontendError::DecklistIo { .. })
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ \"cards\": [ ").unwrap();
        match load_decklist(&broken) {
            Err(FrontendError::DecklistParse { path, .. }) => assert_eq!(path, broken),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

//! View-models for the catalog and the admin table.
//!
//! Everything here is rebuilt from scratch on each call. The ratatui
//! widgets in `ui/` only materialise these values.

use crate::model::{ErrorRecord, compare_codes};
use crate::translate::{Translations, display};
use std::time::Duration;

pub const NO_RESULTS: &str = "No results found.";
pub const NO_CODES: &str = "No error codes found.";
/// Canonical load-failure text, in the catalog's source language like every
/// other translation key.
pub const LOAD_FAILED: &str = "Fehler beim Laden der Daten.";

/// Delay between two consecutive card reveals.
pub const REVEAL_STEP: Duration = Duration::from_millis(50);
const REVEAL_MAX_STEPS: u32 = 40;

/// One rendered catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCard {
    pub code: String,
    pub headline: String,
    pub cause: String,
    pub action: String,
    pub platforms: String,
    pub reveal_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsView {
    Loading,
    Failed(String),
    Empty,
    Cards(Vec<ResultCard>),
}

impl ResultsView {
    /// Number of cards whose reveal delay has passed.
    pub fn revealed(&self, elapsed: Duration) -> usize {
        match self {
            ResultsView::Cards(cards) => cards
                .iter()
                .take_while(|c| c.reveal_delay <= elapsed)
                .count(),
            _ => 0,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ResultsView::Cards(cards) => cards.len(),
            _ => 0,
        }
    }
}

fn reveal_delay(index: usize) -> Duration {
    let steps = u32::try_from(index).unwrap_or(u32::MAX).min(REVEAL_MAX_STEPS);
    REVEAL_STEP * steps
}

/// Build the catalog cards for the visible records.
pub fn build_results(records: &[&ErrorRecord], translations: Option<&Translations>) -> ResultsView {
    if records.is_empty() {
        return ResultsView::Empty;
    }
    let cards = records
        .iter()
        .enumerate()
        .map(|(index, record)| ResultCard {
            code: record.code.clone(),
            headline: format!(
                "{}: {}",
                record.code,
                display(translations, &record.hmi_message)
            ),
            cause: display(translations, &record.cause).to_string(),
            action: display(translations, &record.action).to_string(),
            platforms: record.platforms.clone(),
            reveal_delay: reveal_delay(index),
        })
        .collect();
    ResultsView::Cards(cards)
}

/// The inline error shown in place of results after a failed load.
pub fn load_failed(translations: Option<&Translations>) -> ResultsView {
    ResultsView::Failed(display(translations, LOAD_FAILED).to_string())
}

/// A row of the admin table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub code: String,
    pub hmi_message: String,
    pub platforms: String,
}

/// Admin table rows ordered by numeric code, non-numeric codes last.
pub fn table_rows(records: &[ErrorRecord]) -> Vec<TableRow> {
    let mut sorted: Vec<&ErrorRecord> = records.iter().collect();
    sorted.sort_by(|a, b| compare_codes(&a.code, &b.code));
    sorted
        .into_iter()
        .map(|r| TableRow {
            code: r.code.clone(),
            hmi_message: r.hmi_message.clone(),
            platforms: r.platforms.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn records() -> Vec<ErrorRecord> {
        vec![
            ErrorRecord::new("10", "Eingeschlossen", "Hindernis", "Befreien", "P25"),
            ErrorRecord::new("2", "Rad blockiert", "Haar", "Reinigen", "P10"),
            ErrorRecord::new("E-1", "Unbekannt", "-", "-", ""),
        ]
    }

    #[test]
    fn test_zero_records_render_placeholder() {
        assert_eq!(build_results(&[], None), ResultsView::Empty);
    }

    #[test]
    fn test_cards_follow_filtered_order_with_stagger() {
        let all = records();
        let visible: Vec<&ErrorRecord> = all.iter().collect();
        let ResultsView::Cards(cards) = build_results(&visible, None) else {
            panic!("Expected cards");
        };
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].headline, "10: Eingeschlossen");
        assert_eq!(cards[0].reveal_delay, Duration::ZERO);
        assert_eq!(cards[2].reveal_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_reveal_delay_is_capped() {
        assert_eq!(reveal_delay(10_000), REVEAL_STEP * REVEAL_MAX_STEPS);
    }

    #[test]
    fn test_revealed_counts_elapsed_cards() {
        let all = records();
        let visible: Vec<&ErrorRecord> = all.iter().collect();
        let view = build_results(&visible, None);
        assert_eq!(view.revealed(Duration::ZERO), 1);
        assert_eq!(view.revealed(Duration::from_millis(60)), 2);
        assert_eq!(view.revealed(Duration::from_secs(5)), 3);
        assert_eq!(ResultsView::Empty.revealed(Duration::from_secs(5)), 0);
    }

    #[test]
    fn test_cards_use_translations_but_keep_raw_platforms() {
        let all = records();
        let visible: Vec<&ErrorRecord> = all.iter().take(1).collect();
        let t = Translations::from_map(HashMap::from([
            ("Eingeschlossen".to_string(), "Trapped".to_string()),
            ("Befreien".to_string(), "Free the robot".to_string()),
        ]));
        let ResultsView::Cards(cards) = build_results(&visible, Some(&t)) else {
            panic!("Expected cards");
        };
        assert_eq!(cards[0].headline, "10: Trapped");
        assert_eq!(cards[0].cause, "Hindernis");
        assert_eq!(cards[0].action, "Free the robot");
        assert_eq!(cards[0].platforms, "P25");
    }

    #[test]
    fn test_load_failed_message_is_translatable() {
        let t = Translations::from_map(HashMap::from([(
            "Fehler beim Laden der Daten.".to_string(),
            "Failed to load data.".to_string(),
        )]));
        assert_eq!(
            load_failed(None),
            ResultsView::Failed("Fehler beim Laden der Daten.".to_string())
        );
        assert_eq!(
            load_failed(Some(&t)),
            ResultsView::Failed("Failed to load data.".to_string())
        );
    }

    #[test]
    fn test_table_rows_sorted_by_numeric_code() {
        let rows = table_rows(&records());
        let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["2", "10", "E-1"]);
    }
}

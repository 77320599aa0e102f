use crate::model::ErrorRecord;
use crate::translate::Translations;

/// Current search input plus optional platform facet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub platform: Option<String>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.platform.is_none()
    }
}

/// Whether `record` is visible under `query`.
///
/// `needle` is the already-lowercased query text.
fn matches(record: &ErrorRecord, needle: &str, platform: Option<&str>, translations: Option<&Translations>) -> bool {
    if let Some(platform) = platform {
        if !record.platforms.contains(platform) {
            return false;
        }
    }
    if needle.is_empty() {
        return true;
    }

    let hit = |value: &str| value.to_lowercase().contains(needle);
    let raw = [
        record.code.as_str(),
        record.hmi_message.as_str(),
        record.cause.as_str(),
        record.action.as_str(),
        record.platforms.as_str(),
    ];
    if raw.into_iter().any(|value| hit(value)) {
        return true;
    }
    match translations {
        Some(t) => [&record.hmi_message, &record.cause, &record.action]
            .into_iter()
            .any(|value| hit(t.translate(value))),
        None => false,
    }
}

/// Indices into `records` of every visible record, in original order.
pub fn filter_indices(records: &[ErrorRecord], query: &Query, translations: Option<&Translations>) -> Vec<usize> {
    if query.is_empty() {
        return (0..records.len()).collect();
    }
    let needle = query.text.to_lowercase();
    let platform = query.platform.as_deref();
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| matches(record, &needle, platform, translations))
        .map(|(i, _)| i)
        .collect()
}

/// The visible records themselves.
pub fn filter<'a>(records: &'a [ErrorRecord], query: &Query, translations: Option<&Translations>) -> Vec<&'a ErrorRecord> {
    filter_indices(records, query, translations)
        .into_iter()
        .map(|i| &records[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn catalog() -> Vec<ErrorRecord> {
        vec![
            ErrorRecord::new("1", "Eingeschlossen", "Hindernis", "Roboter befreien", "P10, P25"),
            ErrorRecord::new("2", "Rad blockiert rechts", "Fremdkörper", "Rad reinigen", "P25"),
            ErrorRecord::new("42", "Pump failure", "Sensor fault", "Check wiring; restart", "Linux,Windows"),
        ]
    }

    fn query(text: &str, platform: Option<&str>) -> Query {
        Query {
            text: text.to_string(),
            platform: platform.map(str::to_string),
        }
    }

    fn codes(records: &[&ErrorRecord]) -> Vec<String> {
        records.iter().map(|r| r.code.clone()).collect()
    }

    #[test]
    fn test_empty_query_is_identity() {
        let records = catalog();
        let out = filter(&records, &Query::default(), None);
        assert_eq!(codes(&out), vec!["1", "2", "42"]);
    }

    #[test]
    fn test_text_match_is_case_insensitive_substring() {
        let records = catalog();
        assert_eq!(codes(&filter(&records, &query("PUMP", None), None)), vec!["42"]);
        assert_eq!(codes(&filter(&records, &query("reinig", None), None)), vec!["2"]);
        assert_eq!(codes(&filter(&records, &query("windows", None), None)), vec!["42"]);
    }

    #[test]
    fn test_code_is_searchable() {
        let records = catalog();
        assert_eq!(codes(&filter(&records, &query("42", None), None)), vec!["42"]);
    }

    #[test]
    fn test_platform_facet_substring() {
        let records = vec![ErrorRecord::new("7", "m", "c", "a", "A, B")];
        assert_eq!(filter(&records, &query("", Some("A")), None).len(), 1);
        assert_eq!(filter(&records, &query("", Some("B")), None).len(), 1);
        assert!(filter(&records, &query("", Some("C")), None).is_empty());
    }

    #[test]
    fn test_facet_and_text_combine() {
        let records = catalog();
        assert_eq!(codes(&filter(&records, &query("rad", Some("P25")), None)), vec!["2"]);
        assert!(filter(&records, &query("pump", Some("P25")), None).is_empty());
    }

    #[test]
    fn test_translated_variants_are_searchable() {
        let records = catalog();
        let t = Translations::from_map(HashMap::from([
            ("Eingeschlossen".to_string(), "Trapped".to_string()),
        ]));
        assert!(filter(&records, &query("trapped", None), None).is_empty());
        assert_eq!(codes(&filter(&records, &query("trapped", None), Some(&t))), vec!["1"]);
        // The canonical text still matches with a table loaded.
        assert_eq!(codes(&filter(&records, &query("eingeschlossen", None), Some(&t))), vec!["1"]);
    }

    #[test]
    fn test_no_match_yields_empty() {
        let records = catalog();
        assert!(filter_indices(&records, &query("zzz", None), None).is_empty());
    }

    fn arb_record() -> impl Strategy<Value = ErrorRecord> {
        (
            "[0-9]{1,4}",
            "[a-zA-Z ]{0,20}",
            "[a-zA-Z ]{0,12}",
            "[a-zA-Z; ]{0,12}",
            prop::sample::select(vec!["P10", "P25", "P10, P25", "Linux,Windows", ""]),
        )
            .prop_map(|(code, hmi, cause, action, platforms)| {
                ErrorRecord::new(code, hmi, cause, action, platforms)
            })
    }

    proptest! {
        #[test]
        fn prop_hmi_substring_is_always_found(
            records in prop::collection::vec(arb_record(), 1..20),
            pick in any::<prop::sample::Index>(),
            start in 0usize..20,
            len in 1usize..8,
        ) {
            let target = &records[pick.index(records.len())];
            let chars: Vec<char> = target.hmi_message.chars().collect();
            prop_assume!(!chars.is_empty());
            let start = start.min(chars.len() - 1);
            let end = (start + len).min(chars.len());
            let needle: String = chars[start..end].iter().collect();
            prop_assume!(!needle.is_empty());

            let out = filter(&records, &query(&needle, None), None);
            prop_assert!(out.iter().any(|r| std::ptr::eq(*r, target)));
        }

        #[test]
        fn prop_filtering_is_idempotent(
            records in prop::collection::vec(arb_record(), 0..20),
            text in "[a-z]{0,3}",
            platform in prop::option::of(prop::sample::select(vec!["P10", "P25", "Linux"])),
        ) {
            let q = query(&text, platform);
            let once: Vec<ErrorRecord> = filter(&records, &q, None).into_iter().cloned().collect();
            let twice: Vec<ErrorRecord> = filter(&once, &q, None).into_iter().cloned().collect();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_empty_query_keeps_everything_in_order(
            records in prop::collection::vec(arb_record(), 0..20),
        ) {
            let out: Vec<ErrorRecord> = filter(&records, &Query::default(), None).into_iter().cloned().collect();
            prop_assert_eq!(out, records);
        }
    }
}

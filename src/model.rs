use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A single catalog entry as served by `/api/errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "HMI Message", default)]
    pub hmi_message: String,
    #[serde(rename = "Cause", default)]
    pub cause: String,
    #[serde(rename = "Action", default)]
    pub action: String,
    #[serde(rename = "Platforms", default)]
    pub platforms: String,
}

impl ErrorRecord {
    #[cfg(test)]
    pub fn new(
        code: impl Into<String>,
        hmi_message: impl Into<String>,
        cause: impl Into<String>,
        action: impl Into<String>,
        platforms: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            hmi_message: hmi_message.into(),
            cause: cause.into(),
            action: action.into(),
            platforms: platforms.into(),
        }
    }

    /// Individual platform tags, trimmed, empty tags skipped.
    pub fn platform_tags(&self) -> impl Iterator<Item = &str> {
        self.platforms
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Enforce the working-set invariant: non-empty, unique codes.
///
/// Records without a code are dropped; for duplicated codes the first
/// occurrence wins.
pub fn normalize(records: Vec<ErrorRecord>) -> Vec<ErrorRecord> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if record.code.trim().is_empty() {
            tracing::debug!("dropping record without code");
            continue;
        }
        if !seen.insert(record.code.clone()) {
            tracing::warn!(code = %record.code, "duplicate error code ignored");
            continue;
        }
        out.push(record);
    }
    out
}

/// Distinct platform tags in first-seen order.
pub fn platform_facets(records: &[ErrorRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut facets = Vec::new();
    for tag in records.iter().flat_map(ErrorRecord::platform_tags) {
        if seen.insert(tag) {
            facets.push(tag.to_string());
        }
    }
    facets
}

/// Total order on codes: numeric codes ascending, then non-numeric codes
/// lexicographically.
pub fn compare_codes(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

//! Semicolon-delimited catalog format.
//!
//! The first line is a header naming the five columns. The `Action` column
//! may itself contain `;`, so every segment between the cause and the last
//! (platforms) segment belongs to it.

use crate::model::ErrorRecord;
use thiserror::Error;

pub const DELIMITER: char = ';';
pub const HEADER: &str = "Code;HMI Message;Cause;Action;Platforms";
const MIN_COLUMNS: usize = 5;

#[derive(Error, Debug)]
pub enum DelimitedError {
    #[error("field {field} of code {code} contains the delimiter")]
    EmbeddedDelimiter { code: String, field: &'static str },
}

/// Parse a delimited catalog. Malformed rows are dropped, never fatal.
pub fn parse(text: &str) -> Vec<ErrorRecord> {
    let mut lines = text.trim().split('\n');
    // Column order is fixed; the header only documents it.
    let _header = lines.next();

    lines
        .filter_map(|line| {
            let record = parse_row(line);
            if record.is_none() && !line.trim().is_empty() {
                tracing::debug!(row = line, "skipping malformed row");
            }
            record
        })
        .collect()
}

fn parse_row(line: &str) -> Option<ErrorRecord> {
    let parts: Vec<&str> = line.split(DELIMITER).collect();
    if parts.len() < MIN_COLUMNS {
        return None;
    }
    let last = parts.len() - 1;
    let code = parts[0].trim();
    if code.is_empty() {
        return None;
    }
    Some(ErrorRecord {
        code: code.to_string(),
        hmi_message: parts[1].trim().to_string(),
        cause: parts[2].trim().to_string(),
        action: parts[3..last].join(";").trim().to_string(),
        platforms: parts[last].trim().to_string(),
    })
}

/// Write records in the format accepted by [`parse`].
pub fn render(records: &[ErrorRecord]) -> Result<String, DelimitedError> {
    let mut out = String::from(HEADER);
    out.push('\n');
    for record in records {
        let fixed = [
            ("Code", &record.code),
            ("HMI Message", &record.hmi_message),
            ("Cause", &record.cause),
            ("Platforms", &record.platforms),
        ];
        for (field, value) in fixed {
            if value.contains(DELIMITER) {
                return Err(DelimitedError::EmbeddedDelimiter {
                    code: record.code.clone(),
                    field,
                });
            }
        }
        out.push_str(&format!(
            "{};{};{};{};{}\n",
            record.code, record.hmi_message, record.cause, record.action, record.platforms
        ));
    }
    Ok(out)
}

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("could not read translation table {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("translation table {path} is not a JSON string map: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Static mapping from canonical strings to display strings.
#[derive(Debug, Clone, Default)]
pub struct Translations {
    entries: HashMap<String, String>,
}

impl Translations {
    #[cfg(test)]
    pub fn from_map(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Load a `{ "canonical": "display" }` JSON object.
    pub fn load(path: &Path) -> Result<Self, TranslationError> {
        let text = std::fs::read_to_string(path).map_err(|source| TranslationError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let entries = serde_json::from_str(&text).map_err(|source| TranslationError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Exact lookup on the trimmed text; misses return the trimmed text.
    pub fn translate<'a>(&'a self, text: &'a str) -> &'a str {
        let trimmed = text.trim();
        self.entries.get(trimmed).map(String::as_str).unwrap_or(trimmed)
    }
}

/// Translate through an optional table.
pub fn display<'a>(translations: Option<&'a Translations>, text: &'a str) -> &'a str {
    match translations {
        Some(t) => t.translate(text),
        None => text,
    }
}

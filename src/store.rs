use crate::api::{ApiError, Backend};
use crate::model::{self, ErrorRecord};
use chrono::{DateTime, Local};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

/// The full record set, replaced wholesale on every refresh.
#[derive(Debug)]
pub struct CatalogStore {
    records: Vec<ErrorRecord>,
    facets: Vec<String>,
    state: LoadState,
    refreshed_at: Option<DateTime<Local>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            facets: Vec::new(),
            state: LoadState::Loading,
            refreshed_at: None,
        }
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    pub fn facets(&self) -> &[String] {
        &self.facets
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Local>> {
        self.refreshed_at
    }

    pub fn find(&self, code: &str) -> Option<&ErrorRecord> {
        self.records.iter().find(|r| r.code == code)
    }

    pub fn mark_loading(&mut self) {
        self.state = LoadState::Loading;
    }

    /// Install a freshly fetched set (or clear the store on failure).
    pub fn apply(&mut self, result: Result<Vec<ErrorRecord>, ApiError>) {
        match result {
            Ok(records) => self.replace(records),
            Err(e) => self.fail(e.to_string()),
        }
    }

    pub fn replace(&mut self, records: Vec<ErrorRecord>) {
        let records = model::normalize(records);
        self.facets = model::platform_facets(&records);
        self.records = records;
        self.state = LoadState::Ready;
        self.refreshed_at = Some(Local::now());
        tracing::info!(records = self.records.len(), facets = self.facets.len(), "catalog refreshed");
    }

    pub fn fail(&mut self, message: String) {
        tracing::error!(error = %message, "catalog load failed");
        self.records.clear();
        self.facets.clear();
        self.state = LoadState::Failed(message);
    }
}

/// Fetch the full record set and normalise it for [`CatalogStore::apply`].
///
/// Runs on a worker task; the store itself stays on the UI thread.
pub async fn fetch<B: Backend>(backend: &B) -> Result<Vec<ErrorRecord>, ApiError> {
    match backend.list().await {
        Ok(records) => {
            let fetched = records.len();
            let records = model::normalize(records);
            tracing::debug!(fetched, kept = records.len(), "catalog fetched");
            Ok(records)
        }
        Err(e) => {
            tracing::warn!(error = %e, "catalog fetch failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;

    fn seed() -> Vec<ErrorRecord> {
        vec![
            ErrorRecord::new("1", "Eingeschlossen", "Hindernis", "Befreien", "P10, P25"),
            ErrorRecord::new("2", "Rad blockiert", "Haar", "Reinigen", "P25"),
            ErrorRecord::new("", "no code", "", "", "P99"),
        ]
    }

    #[test]
    fn test_new_store_is_loading_and_empty() {
        let store = CatalogStore::new();
        assert_eq!(store.state(), &LoadState::Loading);
        assert!(store.records().is_empty());
        assert!(store.refreshed_at().is_none());
    }

    #[tokio::test]
    async fn test_load_replaces_and_derives_facets() {
        let backend = FakeBackend::with(seed());
        let mut store = CatalogStore::new();
        store.apply(fetch(&backend).await);

        assert_eq!(store.state(), &LoadState::Ready);
        assert_eq!(store.records().len(), 2);
        assert_eq!(store.facets(), &["P10".to_string(), "P25".to_string()]);
        assert!(store.find("2").is_some());
        assert!(store.refreshed_at().is_some());
    }

    #[tokio::test]
    async fn test_failed_load_leaves_store_empty() {
        let backend = FakeBackend::with(seed());
        let mut store = CatalogStore::new();
        store.apply(fetch(&backend).await);
        assert_eq!(store.records().len(), 2);

        *backend.fail_list.lock().unwrap() = true;
        store.mark_loading();
        store.apply(fetch(&backend).await);
        assert!(store.records().is_empty());
        assert!(store.facets().is_empty());
        assert!(matches!(store.state(), LoadState::Failed(_)));
    }

    #[tokio::test]
    async fn test_fetch_drops_records_without_code() {
        let backend = FakeBackend::with(seed());
        let records = fetch(&backend).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.code.is_empty()));
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut store = CatalogStore::new();
        store.replace(seed());
        store.replace(vec![ErrorRecord::new("9", "m", "c", "a", "Z")]);
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.facets(), &["Z".to_string()]);
        assert!(store.find("1").is_none());
    }
}

use crate::delimited;
use crate::model::ErrorRecord;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const API_PATH: &str = "api/errors";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Not logged in")]
    Unauthorized,

    #[error("Invalid password")]
    LoginRejected,

    #[error("The catalog source is read-only")]
    ReadOnly,

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Text for the blocking alert shown after a failed mutation.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Http(e) => format!("Network error: {}", e),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Pull the backend's `{ "error": ... }` message out of a response body,
/// falling back to `fallback` when the body carries none.
pub fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// The catalog's persistence collaborator.
pub trait Backend: Send + Sync + 'static {
    /// Fetch the full record set.
    fn list(&self) -> impl Future<Output = Result<Vec<ErrorRecord>, ApiError>> + Send;

    fn create(&self, record: &ErrorRecord) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Replace the record identified by `code`.
    fn update(&self, code: &str, record: &ErrorRecord) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn delete(&self, code: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn login(&self, password: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Whether create/update/delete are supported at all.
    fn writable(&self) -> bool;
}

/// REST backend (`/api/errors`) with a cookie session for mutations.
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base })
    }

    pub fn collection_url(&self) -> Result<Url, ApiError> {
        self.base
            .join(API_PATH)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    /// `/api/errors/{code}` with the code as a single encoded path segment.
    pub fn record_url(&self, code: &str) -> Result<Url, ApiError> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .push(code);
        Ok(url)
    }

    fn page_url(&self, page: &str) -> Result<Url, ApiError> {
        self.base.join(page).map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    async fn check(response: reqwest::Response, fallback: &str) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(&body, fallback),
        })
    }
}

impl Backend for HttpBackend {
    async fn list(&self) -> Result<Vec<ErrorRecord>, ApiError> {
        let url = self.collection_url()?;
        tracing::debug!(%url, "fetching catalog");
        let response = self.client.get(url).send().await?;
        let response = Self::check(response, "Failed to fetch errors").await?;
        Ok(response.json().await?)
    }

    async fn create(&self, record: &ErrorRecord) -> Result<(), ApiError> {
        let response = self.client.post(self.collection_url()?).json(record).send().await?;
        Self::check(response, "Failed to add error").await?;
        Ok(())
    }

    async fn update(&self, code: &str, record: &ErrorRecord) -> Result<(), ApiError> {
        let response = self.client.put(self.record_url(code)?).json(record).send().await?;
        Self::check(response, "Failed to update error").await?;
        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<(), ApiError> {
        let response = self.client.delete(self.record_url(code)?).send().await?;
        Self::check(response, "Failed to delete").await?;
        Ok(())
    }

    async fn login(&self, password: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.page_url("login")?)
            .form(&[("password", password)])
            .send()
            .await?;
        // A successful login redirects to the admin page; a failed one
        // re-renders the login form.
        let to_admin = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|loc| loc.trim_end_matches('/').ends_with("/admin") || loc == "admin");
        if response.status().is_redirection() && to_admin {
            Ok(())
        } else {
            Err(ApiError::LoginRejected)
        }
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.client.get(self.page_url("logout")?).send().await?;
        Ok(())
    }

    fn writable(&self) -> bool {
        true
    }
}

/// Where a delimited catalog lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Url(Url),
}

impl Location {
    pub fn parse(s: &str) -> Self {
        match Url::parse(s) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Location::Url(url),
            _ => Location::File(PathBuf::from(s)),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Read-only catalog backed by a semicolon-delimited resource.
pub struct DelimitedSource {
    location: Location,
    client: reqwest::Client,
}

impl DelimitedSource {
    pub fn new(location: Location, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { location, client })
    }

    async fn read_text(&self) -> Result<String, ApiError> {
        match &self.location {
            Location::File(path) => Ok(tokio::fs::read_to_string(path).await?),
            Location::Url(url) => {
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ApiError::Status {
                        status: status.as_u16(),
                        message: format!("HTTP error! status: {}", status.as_u16()),
                    });
                }
                Ok(response.text().await?)
            }
        }
    }
}

impl Backend for DelimitedSource {
    async fn list(&self) -> Result<Vec<ErrorRecord>, ApiError> {
        tracing::debug!(location = %self.location, "reading delimited catalog");
        let text = self.read_text().await?;
        Ok(delimited::parse(&text))
    }

    async fn create(&self, _record: &ErrorRecord) -> Result<(), ApiError> {
        Err(ApiError::ReadOnly)
    }

    async fn update(&self, _code: &str, _record: &ErrorRecord) -> Result<(), ApiError> {
        Err(ApiError::ReadOnly)
    }

    async fn delete(&self, _code: &str) -> Result<(), ApiError> {
        Err(ApiError::ReadOnly)
    }

    async fn login(&self, _password: &str) -> Result<(), ApiError> {
        Err(ApiError::ReadOnly)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        Ok(())
    }

    fn writable(&self) -> bool {
        false
    }
}

/// Either backend, chosen at startup.
pub enum AnyBackend {
    Http(HttpBackend),
    Delimited(DelimitedSource),
}

impl Backend for AnyBackend {
    async fn list(&self) -> Result<Vec<ErrorRecord>, ApiError> {
        match self {
            AnyBackend::Http(b) => b.list().await,
            AnyBackend::Delimited(b) => b.list().await,
        }
    }

    async fn create(&self, record: &ErrorRecord) -> Result<(), ApiError> {
        match self {
            AnyBackend::Http(b) => b.create(record).await,
            AnyBackend::Delimited(b) => b.create(record).await,
        }
    }

    async fn update(&self, code: &str, record: &ErrorRecord) -> Result<(), ApiError> {
        match self {
            AnyBackend::Http(b) => b.update(code, record).await,
            AnyBackend::Delimited(b) => b.update(code, record).await,
        }
    }

    async fn delete(&self, code: &str) -> Result<(), ApiError> {
        match self {
            AnyBackend::Http(b) => b.delete(code).await,
            AnyBackend::Delimited(b) => b.delete(code).await,
        }
    }

    async fn login(&self, password: &str) -> Result<(), ApiError> {
        match self {
            AnyBackend::Http(b) => b.login(password).await,
            AnyBackend::Delimited(b) => b.login(password).await,
        }
    }

    async fn logout(&self) -> Result<(), ApiError> {
        match self {
            AnyBackend::Http(b) => b.logout().await,
            AnyBackend::Delimited(b) => b.logout().await,
        }
    }

    fn writable(&self) -> bool {
        match self {
            AnyBackend::Http(b) => b.writable(),
            AnyBackend::Delimited(b) => b.writable(),
        }
    }
}

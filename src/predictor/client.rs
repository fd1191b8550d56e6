/// Prediction service HTTP client implementation.
///
/// This module provides `PredictionClient` for uploading a CSV of abstracts to the
/// prediction service and decoding the returned records, along with error types,
/// the builder and the retry helper.
use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::ResultSet;

/// Environment variable holding the prediction service base URL.
pub const URL_ENV_VAR: &str = "TAGSCOPE_URL";
/// Base URL used when neither the builder nor the environment provides one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

const PREDICT_PATH: &str = "/predict";
const HEALTH_PATH: &str = "/health";
const UPLOAD_FIELD: &str = "file";
const UPLOAD_MIME: &str = "text/csv";

/// Errors that can occur when talking to the prediction service.
#[derive(Debug, Error)]
pub enum PredictError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors without a structured error body
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Error reported by the service in its `{"error": ...}` body
    #[error("Prediction service error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response was not the expected JSON shape
    #[error("Invalid response format: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The CSV file to upload could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PredictError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// A CSV file ready to be posted to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvUpload {
    file_name: String,
    content: Vec<u8>,
}

impl CsvUpload {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Reads the file at `path`, keeping its file name for the multipart part.
    ///
    /// # Errors
    ///
    /// Returns `PredictError::Io` if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, PredictError> {
        let content = std::fs::read(path).map_err(|source| PredictError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());

        Ok(Self { file_name, content })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Builder for constructing `PredictionClient` instances.
///
/// # Examples
///
/// ```
/// use tagscope::predictor::PredictionClientBuilder;
///
/// let client = PredictionClientBuilder::new()
///     .base_url("http://localhost:5000")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.base_url(), "http://localhost:5000");
/// ```
#[derive(Debug, Default)]
pub struct PredictionClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry_delays: Option<Vec<Duration>>,
}

impl PredictionClientBuilder {
    /// Creates a new `PredictionClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the prediction service (e.g. "http://localhost:5000").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the whole-request timeout. Defaults to 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout. Defaults to 5 seconds.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the delays slept before each retry. Defaults to 1s, 2s, 4s.
    ///
    /// An empty list disables retries.
    pub fn retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = Some(delays);
        self
    }

    /// Builds the `PredictionClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, this method checks `TAGSCOPE_URL`.
    /// If that is not set either, it defaults to `http://localhost:5000`.
    ///
    /// # Errors
    ///
    /// Returns `PredictError::InvalidUrl` for an unparsable base URL and
    /// `PredictError::Network` if the HTTP client cannot be created.
    pub fn build(self) -> Result<PredictionClient, PredictError> {
        // Builder value, then env var, then default
        let base_url = match self.base_url {
            Some(url) => url,
            None => std::env::var(URL_ENV_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = base_url.trim_end_matches('/').to_string();

        reqwest::Url::parse(&base_url)
            .map_err(|e| PredictError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
            .connect_timeout(self.connect_timeout.unwrap_or(Duration::from_secs(5)))
            .build()
            .map_err(PredictError::Network)?;

        Ok(PredictionClient {
            client,
            base_url,
            retry_delays: self.retry_delays.unwrap_or_else(default_retry_delays),
        })
    }
}

fn default_retry_delays() -> Vec<Duration> {
    [1, 2, 4].into_iter().map(Duration::from_secs).collect()
}

/// Synchronous HTTP client for the prediction service.
///
/// Cheap to clone; clones share the underlying connection pool. Construct it
/// with `PredictionClientBuilder`.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: reqwest::blocking::Client,
    base_url: String,
    retry_delays: Vec<Duration>,
}

/// Trait for prediction service operations.
///
/// Lets the session and the terminal UI run against a mock in tests.
pub trait PredictionClientTrait: Send + Sync {
    /// Uploads `upload` and returns one record per CSV row, in row order.
    fn predict(&self, upload: &CsvUpload) -> Result<ResultSet, PredictError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

impl PredictionClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queries the service health endpoint and returns its status text.
    ///
    /// # Errors
    ///
    /// Returns a network, HTTP or serialization error if the service is
    /// unreachable or answers with something other than `{"status": ...}`.
    pub fn health(&self) -> Result<String, PredictError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(PredictError::from_reqwest)?;

        let status = response.status();
        let body = response.text().map_err(PredictError::from_reqwest)?;
        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }

        let health: HealthBody = serde_json::from_str(&body).map_err(PredictError::Serialization)?;
        Ok(health.status)
    }

    fn predict_internal(&self, upload: &CsvUpload) -> Result<ResultSet, PredictError> {
        let url = format!("{}{}", self.base_url, PREDICT_PATH);

        let results = retry_with_backoff(&self.retry_delays, || {
            debug!(url = %url, file = upload.file_name(), bytes = upload.content().len(), "posting CSV");

            // A multipart form is consumed by send(), so build one per attempt
            let part = reqwest::blocking::multipart::Part::bytes(upload.content().to_vec())
                .file_name(upload.file_name().to_string())
                .mime_str(UPLOAD_MIME)
                .map_err(PredictError::Network)?;
            let form = reqwest::blocking::multipart::Form::new().part(UPLOAD_FIELD, part);

            let response = self
                .client
                .post(&url)
                .multipart(form)
                .send()
                .map_err(PredictError::from_reqwest)?;

            let status = response.status();
            let body = response.text().map_err(PredictError::from_reqwest)?;
            if !status.is_success() {
                return Err(error_from_body(status.as_u16(), &body));
            }

            serde_json::from_str::<ResultSet>(&body).map_err(PredictError::Serialization)
        })?;

        info!(records = results.len(), "predictions received");
        Ok(results)
    }
}

impl PredictionClientTrait for PredictionClient {
    fn predict(&self, upload: &CsvUpload) -> Result<ResultSet, PredictError> {
        self.predict_internal(upload)
    }
}

/// Maps a non-success response to `Api` when it carries `{"error": ...}`, else `Http`.
fn error_from_body(status: u16, body: &str) -> PredictError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => PredictError::Api {
            status,
            message: parsed.error,
        },
        Err(_) => PredictError::Http { status },
    }
}

/// Retries an operation, sleeping for each entry of `delays` before the next attempt.
///
/// The operation runs once, then at most `delays.len()` more times. Only
/// transient errors (network failures, timeouts, unstructured 5xx responses)
/// are retried; anything else is returned immediately.
pub fn retry_with_backoff<F, T>(delays: &[Duration], mut f: F) -> Result<T, PredictError>
where
    F: FnMut() -> Result<T, PredictError>,
{
    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) => {
            if !should_retry(&e) {
                return Err(e);
            }
            e
        }
    };

    for (attempt, delay) in delays.iter().enumerate() {
        warn!(attempt = attempt + 1, error = %last_error, "retrying prediction request");
        thread::sleep(*delay);

        match f() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !should_retry(&e) {
                    return Err(e);
                }
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// Returns `true` for transient errors worth another attempt.
fn should_retry(error: &PredictError) -> bool {
    match error {
        PredictError::Network(_) => true,
        PredictError::Timeout(_) => true,
        PredictError::Http { status } => (500..600).contains(status),
        // The service reports bad input through a structured body; retrying won't help
        PredictError::Api { .. } => false,
        PredictError::Serialization(_) => false,
        PredictError::InvalidUrl(_) => false,
        PredictError::Io { .. } => false,
    }
}

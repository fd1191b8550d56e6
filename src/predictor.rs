/// Prediction service client module.
///
/// Uploads a CSV of abstracts to the remote prediction service and decodes the
/// per-row tag predictions, with retry logic and timeout configuration.
mod client;

pub use client::{
    CsvUpload, DEFAULT_BASE_URL, PredictError, PredictionClient, PredictionClientBuilder,
    PredictionClientTrait, URL_ENV_VAR, retry_with_backoff,
};

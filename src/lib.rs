//! Client for an abstract tag-prediction service.
//!
//! Uploads a CSV of article abstracts, then turns the returned per-row tag
//! predictions into a tag vocabulary, a frequency table, a filtered view and
//! chart series, and exports them back out as CSV or a one-page chart PDF.

pub mod aggregate;
pub mod chart;
pub mod export;
pub mod filter;
pub mod logging;
pub mod models;
pub mod predictor;
pub mod session;
pub mod tui;
pub mod utils;

pub use aggregate::FrequencyTable;
pub use chart::{ChartSeries, HslColor};
pub use export::{Download, ExportError};
pub use models::{ALL_TAGS, ChartKind, ParseChartKindError, Record, ResultSet, TagFilter};
pub use predictor::{
    CsvUpload, PredictError, PredictionClient, PredictionClientBuilder, PredictionClientTrait,
};
pub use session::{Notice, Session, SessionError, UploadOutcome, UploadTicket};

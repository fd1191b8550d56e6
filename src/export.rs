//! Export adapters: CSV re-export of the records and a one-page PDF of the chart.
//!
//! Both adapters produce a [`Download`]: the file name, MIME type and bytes a
//! caller writes wherever the user wants the file.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::chart::ChartSeries;
use crate::models::Record;

pub mod csv;
pub mod pdf;
pub mod raster;

pub use raster::RasterImage;

/// File name of the CSV export.
pub const CSV_FILE_NAME: &str = "predictions.csv";
/// MIME type of the CSV export.
pub const CSV_MIME_TYPE: &str = "text/csv";
/// File name of the chart export.
pub const CHART_FILE_NAME: &str = "tag-distribution-chart.pdf";
/// MIME type of the chart export.
pub const CHART_MIME_TYPE: &str = "application/pdf";

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The chart has no points, so there is nothing to rasterize.
    #[error("No chart to export; upload a CSV with predictions first")]
    NothingToExport,

    /// Drawing the chart bitmap failed.
    #[error("Failed to render chart: {0}")]
    Render(String),

    /// Assembling the PDF document failed.
    #[error("Failed to build PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Writing the exported file failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Content ready to be saved under a fixed file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub content: Vec<u8>,
}

impl Download {
    /// Writes the content to `dir/<file_name>`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Write` if the directory cannot be created or the
    /// file cannot be written.
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir).map_err(|source| ExportError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(self.file_name);
        std::fs::write(&path, &self.content).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), bytes = self.content.len(), "export written");
        Ok(path)
    }
}

/// Builds the `predictions.csv` download for `records`. Never fails.
pub fn csv_download(records: &[Record]) -> Download {
    Download {
        file_name: CSV_FILE_NAME,
        mime_type: CSV_MIME_TYPE,
        content: csv::serialize(records).into_bytes(),
    }
}

/// Rasterizes `series` and wraps it into the `tag-distribution-chart.pdf` download.
///
/// # Errors
///
/// Returns `ExportError::NothingToExport` for an empty series, or a render or
/// PDF error if either stage fails.
pub fn chart_download(series: &ChartSeries) -> Result<Download, ExportError> {
    Ok(Download {
        file_name: CHART_FILE_NAME,
        mime_type: CHART_MIME_TYPE,
        content: chart_document(series)?,
    })
}

/// Produces the bytes of the single-page chart PDF.
///
/// # Errors
///
/// See [`chart_download`].
pub fn chart_document(series: &ChartSeries) -> Result<Vec<u8>, ExportError> {
    if series.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    let image = raster::rasterize(series, raster::DEFAULT_WIDTH, raster::DEFAULT_HEIGHT)?;
    pdf::single_page_document(&image, series)
}

//! Per-session state: the current result set, the selected filter and chart
//! kind, the chosen file, and the single in-flight upload.
//!
//! All views are recomputed from the result set on demand. An upload is split
//! into [`Session::begin_upload`], which hands out an [`UploadTicket`], and
//! [`Session::complete_upload`], which installs the response only if the
//! ticket is still current.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::aggregate::FrequencyTable;
use crate::chart::{self, ChartSeries};
use crate::export::{self, Download, ExportError};
use crate::filter;
use crate::models::{ChartKind, Record, ResultSet, TagFilter};
use crate::predictor::{CsvUpload, PredictError, PredictionClientTrait};

/// Shown when an upload is requested before a file was chosen.
pub const NO_FILE_MESSAGE: &str = "Please select a CSV file first";
/// Shown for any failed upload, whatever the underlying cause.
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed or invalid file format.";
/// Shown while an upload is in flight.
pub const PROCESSING_MESSAGE: &str = "Processing...";

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please select a CSV file first")]
    NoFileSelected,

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("Upload failed or invalid file format.")]
    Upload(#[source] PredictError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// A user-facing message produced by the last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(message) | Notice::Error(message) => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

/// Handle for one in-flight upload.
///
/// Carries the generation it was issued for and the file to send. Run it on
/// any thread, then hand it back with the result to
/// [`Session::complete_upload`].
#[derive(Debug, Clone)]
pub struct UploadTicket {
    generation: u64,
    path: PathBuf,
}

impl UploadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file and posts it through `client`.
    ///
    /// # Errors
    ///
    /// Returns `PredictError::Io` if the file cannot be read, or whatever
    /// the client reports.
    pub fn run(&self, client: &dyn PredictionClientTrait) -> Result<ResultSet, PredictError> {
        let upload = CsvUpload::from_path(&self.path)?;
        client.predict(&upload)
    }
}

/// What [`Session::complete_upload`] did with a response.
#[derive(Debug)]
pub enum UploadOutcome {
    /// The result set was replaced; holds the new record count.
    Installed(usize),
    /// The upload failed; the previous result set is untouched.
    Failed(PredictError),
    /// The ticket had been superseded and the response was dropped.
    Stale,
}

/// Interactive state for one user session.
///
/// # Examples
///
/// ```
/// use tagscope::{ChartKind, Record, ResultSet, Session, TagFilter};
///
/// let mut session = Session::new();
/// session.install(ResultSet::from(vec![
///     Record::new("A", ["x"]),
///     Record::new("B", ["x", "y"]),
/// ]));
///
/// assert_eq!(session.vocabulary(), vec!["x", "y"]);
/// session.set_filter(TagFilter::from_label("y"));
/// assert_eq!(session.filtered_records().len(), 1);
/// assert_eq!(session.chart_series().kind(), ChartKind::Bar);
/// ```
#[derive(Debug, Default)]
pub struct Session {
    results: ResultSet,
    filter: TagFilter,
    chart_kind: ChartKind,
    selected_file: Option<PathBuf>,
    loading: bool,
    generation: u64,
    notice: Option<Notice>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn filter(&self) -> &TagFilter {
        &self.filter
    }

    pub fn chart_kind(&self) -> ChartKind {
        self.chart_kind
    }

    pub fn selected_file(&self) -> Option<&Path> {
        self.selected_file.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Chooses the file for the next upload. `None` clears the selection.
    pub fn select_file(&mut self, path: Option<PathBuf>) {
        debug!(path = ?path, "file selected");
        self.selected_file = path;
    }

    /// Changes the filter. The result set and vocabulary are unaffected.
    pub fn set_filter(&mut self, filter: TagFilter) {
        self.filter = filter;
    }

    pub fn set_chart_kind(&mut self, kind: ChartKind) {
        self.chart_kind = kind;
    }

    pub fn toggle_chart_kind(&mut self) {
        self.chart_kind = self.chart_kind.toggled();
    }

    /// Replaces the result set wholesale. The filter is kept as is.
    pub fn install(&mut self, results: ResultSet) {
        info!(records = results.len(), "result set installed");
        self.results = results;
    }

    /// Starts an upload of the selected file.
    ///
    /// # Errors
    ///
    /// `NoFileSelected` when no file was chosen (the notice is set and nothing
    /// is sent), `UploadInProgress` while another upload is pending.
    pub fn begin_upload(&mut self) -> Result<UploadTicket, SessionError> {
        let Some(path) = self.selected_file.clone() else {
            self.notice = Some(Notice::Error(NO_FILE_MESSAGE.to_string()));
            return Err(SessionError::NoFileSelected);
        };
        if self.loading {
            return Err(SessionError::UploadInProgress);
        }

        self.generation += 1;
        self.loading = true;
        self.notice = None;
        debug!(generation = self.generation, path = %path.display(), "upload started");

        Ok(UploadTicket {
            generation: self.generation,
            path,
        })
    }

    /// Finishes the upload `ticket` was issued for.
    ///
    /// On success the result set is replaced in one step; on failure it is left
    /// as it was and the generic failure notice is set. Either way the loading
    /// flag is cleared. A ticket from a cancelled upload changes nothing.
    pub fn complete_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<ResultSet, PredictError>,
    ) -> UploadOutcome {
        if ticket.generation != self.generation || !self.loading {
            debug!(generation = ticket.generation, current = self.generation, "stale upload ignored");
            return UploadOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(results) => {
                let count = results.len();
                self.install(results);
                self.notice = Some(Notice::Info(format!("Loaded {count} predictions")));
                UploadOutcome::Installed(count)
            }
            Err(e) => {
                warn!(error = %e, "upload failed");
                self.notice = Some(Notice::Error(UPLOAD_FAILED_MESSAGE.to_string()));
                UploadOutcome::Failed(e)
            }
        }
    }

    /// Drops the pending upload. Its response, if it ever arrives, is ignored.
    pub fn cancel_upload(&mut self) {
        if self.loading {
            self.generation += 1;
            self.loading = false;
            self.notice = Some(Notice::Info("Upload cancelled".to_string()));
        }
    }

    /// Runs a whole upload on the current thread.
    ///
    /// # Errors
    ///
    /// Everything `begin_upload` returns, plus `SessionError::Upload` when
    /// the request fails.
    pub fn upload(&mut self, client: &dyn PredictionClientTrait) -> Result<usize, SessionError> {
        let ticket = self.begin_upload()?;
        let result = ticket.run(client);

        match self.complete_upload(ticket, result) {
            UploadOutcome::Installed(count) => Ok(count),
            UploadOutcome::Failed(e) => Err(SessionError::Upload(e)),
            UploadOutcome::Stale => Ok(0),
        }
    }

    pub fn vocabulary(&self) -> Vec<String> {
        self.results.vocabulary()
    }

    pub fn frequency_table(&self) -> FrequencyTable {
        self.results.frequency_table()
    }

    pub fn filtered_records(&self) -> Vec<&Record> {
        filter::filter_records(self.results.records(), &self.filter)
    }

    /// Chart over the whole result set; the filter never changes it.
    pub fn chart_series(&self) -> ChartSeries {
        chart::project_records(self.results.records(), self.chart_kind)
    }

    /// CSV of every record, regardless of the filter.
    pub fn csv_download(&self) -> Download {
        export::csv_download(self.results.records())
    }

    /// PDF of the current chart.
    ///
    /// # Errors
    ///
    /// `ExportError::NothingToExport` while the result set is empty.
    pub fn chart_download(&self) -> Result<Download, SessionError> {
        Ok(export::chart_download(&self.chart_series())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct MockClient {
        response: Mutex<Option<Result<ResultSet, PredictError>>>,
        calls: Mutex<usize>,
    }

    impl MockClient {
        fn returning(response: Result<ResultSet, PredictError>) -> Self {
            Self {
                response: Mutex::new(Some(response)),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl PredictionClientTrait for MockClient {
        fn predict(&self, _upload: &CsvUpload) -> Result<ResultSet, PredictError> {
            *self.calls.lock().unwrap() += 1;
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(PredictError::Http { status: 500 }))
        }
    }

    fn scenario() -> ResultSet {
        vec![Record::new("A", ["x"]), Record::new("B", ["x", "y"])].into()
    }

    fn csv_file() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abstracts.csv");
        std::fs::write(&path, "ABSTRACT\nA\nB\n").unwrap();
        (dir, path)
    }

    #[test]
    fn new_session_is_empty() {
        let session = Session::new();

        assert!(session.results().is_empty());
        assert!(session.vocabulary().is_empty());
        assert!(session.frequency_table().is_empty());
        assert!(session.chart_series().is_empty());
        assert!(session.filter().is_all());
        assert_eq!(session.chart_kind(), ChartKind::Bar);
        assert!(!session.is_loading());
    }

    #[test]
    fn begin_upload_without_file_sets_notice_and_sends_nothing() {
        let mut session = Session::new();
        let client = MockClient::returning(Ok(scenario()));

        let result = session.upload(&client);

        assert!(matches!(result, Err(SessionError::NoFileSelected)));
        assert_eq!(client.calls(), 0);
        assert_eq!(
            session.notice(),
            Some(&Notice::Error("Please select a CSV file first".to_string()))
        );
        assert!(!session.is_loading());
    }

    #[test]
    fn begin_upload_sets_loading_and_rejects_second_upload() {
        let (_dir, path) = csv_file();
        let mut session = Session::new();
        session.select_file(Some(path));

        let ticket = session.begin_upload().unwrap();
        assert!(session.is_loading());
        assert_eq!(ticket.generation(), 1);

        assert!(matches!(
            session.begin_upload(),
            Err(SessionError::UploadInProgress)
        ));
    }

    #[test]
    fn successful_upload_installs_results() {
        let (_dir, path) = csv_file();
        let mut session = Session::new();
        session.select_file(Some(path));
        let client = MockClient::returning(Ok(scenario()));

        let count = session.upload(&client).unwrap();

        assert_eq!(count, 2);
        assert_eq!(client.calls(), 1);
        assert_eq!(session.vocabulary(), vec!["x", "y"]);
        assert!(!session.is_loading());
        assert!(!session.notice().unwrap().is_error());
    }

    #[test]
    fn failed_upload_keeps_previous_results() {
        let (_dir, path) = csv_file();
        let mut session = Session::new();
        session.install(scenario());
        session.select_file(Some(path));
        let client = MockClient::returning(Err(PredictError::Api {
            status: 400,
            message: "bad csv".into(),
        }));

        let result = session.upload(&client);

        assert!(matches!(result, Err(SessionError::Upload(PredictError::Api { .. }))));
        assert_eq!(session.results().len(), 2);
        assert!(!session.is_loading());
        assert_eq!(
            session.notice().unwrap().message(),
            "Upload failed or invalid file format."
        );
    }

    #[test]
    fn unreadable_file_is_reported_as_upload_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new();
        session.select_file(Some(dir.path().join("missing.csv")));
        let client = MockClient::returning(Ok(scenario()));

        let result = session.upload(&client);

        assert!(matches!(result, Err(SessionError::Upload(PredictError::Io { .. }))));
        assert_eq!(client.calls(), 0);
        assert!(session.notice().unwrap().is_error());
    }

    #[test]
    fn cancelled_upload_response_is_ignored() {
        let (_dir, path) = csv_file();
        let mut session = Session::new();
        session.select_file(Some(path));

        let ticket = session.begin_upload().unwrap();
        session.cancel_upload();
        let outcome = session.complete_upload(ticket, Ok(scenario()));

        assert!(matches!(outcome, UploadOutcome::Stale));
        assert!(session.results().is_empty());
        assert!(!session.is_loading());
    }

    #[test]
    fn superseded_ticket_does_not_clobber_newer_upload() {
        let (_dir, path) = csv_file();
        let mut session = Session::new();
        session.select_file(Some(path));

        let old = session.begin_upload().unwrap();
        session.cancel_upload();
        let current = session.begin_upload().unwrap();

        let stale = session.complete_upload(old, Ok(vec![Record::new("old", ["z"])].into()));
        assert!(matches!(stale, UploadOutcome::Stale));
        assert!(session.is_loading());

        let installed = session.complete_upload(current, Ok(scenario()));
        assert!(matches!(installed, UploadOutcome::Installed(2)));
        assert_eq!(session.vocabulary(), vec!["x", "y"]);
    }

    #[test]
    fn filter_narrows_records_but_not_vocabulary_or_chart() {
        let mut session = Session::new();
        session.install(scenario());
        session.set_filter(TagFilter::from_label("y"));

        let filtered = session.filtered_records();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].abstract_text(), "B");
        assert_eq!(session.vocabulary(), vec!["x", "y"]);
        assert_eq!(session.chart_series().len(), 2);
    }

    #[test]
    fn filter_survives_new_result_set() {
        let mut session = Session::new();
        session.install(scenario());
        session.set_filter(TagFilter::from_label("y"));

        session.install(vec![Record::new("C", ["z"])].into());

        assert_eq!(session.filter(), &TagFilter::from_label("y"));
        assert!(session.filtered_records().is_empty());
    }

    #[test]
    fn toggle_chart_kind_switches_series_kind() {
        let mut session = Session::new();
        session.install(scenario());

        session.toggle_chart_kind();
        assert_eq!(session.chart_series().kind(), ChartKind::Pie);
        session.toggle_chart_kind();
        assert_eq!(session.chart_series().kind(), ChartKind::Bar);
    }

    #[test]
    fn csv_download_ignores_filter() {
        let mut session = Session::new();
        session.install(scenario());
        session.set_filter(TagFilter::from_label("y"));

        let text = String::from_utf8(session.csv_download().content).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn chart_download_requires_results() {
        let session = Session::new();

        assert!(matches!(
            session.chart_download(),
            Err(SessionError::Export(ExportError::NothingToExport))
        ));
    }
}

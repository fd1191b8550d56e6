use std::path::{Path, PathBuf};

use crate::models::{ALL_TAGS, Record, ResultSet, TagFilter};
use crate::predictor::PredictError;
use crate::session::{Notice, Session, UploadOutcome, UploadTicket};

/// Application state for the TUI.
///
/// Wraps a [`Session`] and adds what only the terminal needs: panel focus,
/// the file path being typed, the record cursor and where exports go.
#[derive(Debug)]
pub struct App {
    session: Session,
    /// File path input buffer
    file_input: String,
    /// Currently focused panel
    focus: Focus,
    /// Selected row in the record table (None if no selection)
    selected_record: Option<usize>,
    /// Directory exports are written to
    export_dir: PathBuf,
}

/// Panel focus state for keyboard navigation.
///
/// Determines which panel receives keyboard input and how keys are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// File input is focused (typing edits the path, Enter uploads)
    FileInput,
    /// Tag filter list is focused (j/k change the filter)
    TagList,
    /// Record table is focused (j/k move the row cursor)
    Records,
}

impl App {
    /// Creates a new App writing exports to `export_dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagscope::tui::{App, Focus};
    ///
    /// let app = App::new("/tmp");
    /// assert_eq!(app.focus(), Focus::FileInput);
    /// assert!(app.session().results().is_empty());
    /// ```
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            session: Session::new(),
            file_input: String::new(),
            focus: Focus::FileInput,
            selected_record: None,
            export_dir: export_dir.into(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn file_input(&self) -> &str {
        &self.file_input
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn selected_record(&self) -> Option<usize> {
        self.selected_record
    }

    /// Cycles focus: `FileInput` -> `TagList` -> `Records` -> `FileInput`.
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::FileInput => Focus::TagList,
            Focus::TagList => Focus::Records,
            Focus::Records => Focus::FileInput,
        };
    }

    /// Cycles focus in reverse Tab order.
    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::FileInput => Focus::Records,
            Focus::TagList => Focus::FileInput,
            Focus::Records => Focus::TagList,
        };
    }

    /// Returns focus to the file input (Esc key behavior).
    pub fn reset_focus(&mut self) {
        self.focus = Focus::FileInput;
    }

    pub fn push_input_char(&mut self, c: char) {
        self.file_input.push(c);
    }

    pub fn pop_input_char(&mut self) {
        self.file_input.pop();
    }

    pub fn set_file_input(&mut self, input: impl Into<String>) {
        self.file_input = input.into();
    }

    /// Selects the typed path and starts an upload.
    ///
    /// Returns the ticket to run, or `None` when the input is empty (the
    /// session then shows its "select a file" notice) or an upload is already
    /// running.
    pub fn submit_file(&mut self) -> Option<UploadTicket> {
        let trimmed = self.file_input.trim();
        let path = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
        self.session.select_file(path);
        self.session.begin_upload().ok()
    }

    /// Hands a finished upload back to the session.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<ResultSet, PredictError>,
    ) -> UploadOutcome {
        let outcome = self.session.complete_upload(ticket, result);
        if matches!(outcome, UploadOutcome::Installed(_)) {
            self.selected_record = None;
        }
        outcome
    }

    pub fn cancel_upload(&mut self) {
        self.session.cancel_upload();
    }

    /// Labels of the filter list: the "All" entry, then the vocabulary.
    pub fn filter_labels(&self) -> Vec<String> {
        std::iter::once(ALL_TAGS.to_string())
            .chain(self.session.vocabulary())
            .collect()
    }

    /// Position of the current filter in [`Self::filter_labels`].
    ///
    /// `None` when the filter names a tag that is no longer in the vocabulary.
    pub fn selected_filter_index(&self) -> Option<usize> {
        match self.session.filter().tag() {
            None => Some(0),
            Some(tag) => self
                .session
                .vocabulary()
                .iter()
                .position(|t| t == tag)
                .map(|i| i + 1),
        }
    }

    /// Moves the filter down the list (j key), wrapping at the end.
    pub fn select_next_filter(&mut self) {
        let labels = self.filter_labels();
        let next = match self.selected_filter_index() {
            Some(i) if i + 1 < labels.len() => i + 1,
            _ => 0,
        };
        self.apply_filter_label(&labels[next]);
    }

    /// Moves the filter up the list (k key), wrapping at the start.
    pub fn select_previous_filter(&mut self) {
        let labels = self.filter_labels();
        let previous = match self.selected_filter_index() {
            Some(0) | None => labels.len() - 1,
            Some(i) => i - 1,
        };
        self.apply_filter_label(&labels[previous]);
    }

    fn apply_filter_label(&mut self, label: &str) {
        self.session.set_filter(TagFilter::from_label(label));
        self.selected_record = None;
    }

    pub fn filtered_records(&self) -> Vec<&Record> {
        self.session.filtered_records()
    }

    /// Moves the record cursor down, wrapping to the first row.
    pub fn select_next_record(&mut self) {
        let len = self.filtered_records().len();
        if len == 0 {
            self.selected_record = None;
            return;
        }

        self.selected_record = Some(match self.selected_record {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        });
    }

    /// Moves the record cursor up, wrapping to the last row.
    pub fn select_previous_record(&mut self) {
        let len = self.filtered_records().len();
        if len == 0 {
            self.selected_record = None;
            return;
        }

        self.selected_record = Some(match self.selected_record {
            None | Some(0) => len - 1,
            Some(i) => i - 1,
        });
    }

    pub fn toggle_chart_kind(&mut self) {
        self.session.toggle_chart_kind();
    }

    /// Writes `predictions.csv` into the export directory.
    pub fn export_csv(&mut self) {
        let result = self.session.csv_download().save_in(&self.export_dir);
        self.report_export(result.map_err(|e| e.to_string()));
    }

    /// Writes `tag-distribution-chart.pdf` into the export directory.
    pub fn export_chart(&mut self) {
        let result = self
            .session
            .chart_download()
            .map_err(|e| e.to_string())
            .and_then(|download| download.save_in(&self.export_dir).map_err(|e| e.to_string()));
        self.report_export(result);
    }

    fn report_export(&mut self, result: Result<PathBuf, String>) {
        let notice = match result {
            Ok(path) => Notice::Info(format!("Saved {}", path.display())),
            Err(message) => Notice::Error(message),
        };
        self.session.set_notice(notice);
    }
}

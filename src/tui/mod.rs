//! Terminal User Interface module for tagscope.
//!
//! Provides a file input, a tag filter list, the tag frequency chart and the
//! record table, using ratatui for rendering and crossterm for terminal
//! management. Uploads run on a worker thread so the screen stays responsive.

use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use poll_promise::Promise;
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::models::ResultSet;
use crate::predictor::{PredictError, PredictionClientTrait};
use crate::session::UploadTicket;

mod app;
pub mod event;
mod ui;

pub use app::{App, Focus};
use event::Action;

type UploadResult = (UploadTicket, Result<ResultSet, PredictError>);

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// Must run before exiting the TUI, even on error, or the shell is left in
/// raw mode.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic hook.
///
/// Ignores errors since we're likely already in a bad state.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal before the original hook runs.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Background upload driver.
///
/// Holds at most one pending request; the event loop polls it every tick.
struct Uploader {
    client: Arc<dyn PredictionClientTrait>,
    pending: Option<Promise<UploadResult>>,
}

impl Uploader {
    fn new(client: Arc<dyn PredictionClientTrait>) -> Self {
        Self {
            client,
            pending: None,
        }
    }

    fn start(&mut self, ticket: UploadTicket) {
        let client = Arc::clone(&self.client);
        self.pending = Some(Promise::spawn_thread("predict_upload", move || {
            let result = ticket.run(client.as_ref());
            (ticket, result)
        }));
    }

    /// Hands a finished upload to the app, if one is ready.
    fn poll(&mut self, app: &mut App) {
        if let Some(promise) = self.pending.take() {
            match promise.try_take() {
                Ok((ticket, result)) => {
                    app.finish_upload(ticket, result);
                }
                Err(promise) => self.pending = Some(promise),
            }
        }
    }
}

/// Runs the event loop inside the alternate screen.
///
/// Terminal state is always restored, even on error.
///
/// # Errors
///
/// Returns an error if event polling, rendering, or terminal operations fail.
fn run_in_terminal(app: &mut App, uploader: &mut Uploader) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop(app, uploader, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

/// Polls for keyboard events and finished uploads, updates app state and
/// re-renders. Exits on `q` (outside the file input) or `Ctrl+C`.
fn run_event_loop(
    app: &mut App,
    uploader: &mut Uploader,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        uploader.poll(app);

        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
            && key.kind == KeyEventKind::Press
        {
            match event::handle_key_event(app, key) {
                Action::Quit => break,
                Action::Upload(ticket) => uploader.start(ticket),
                Action::None => {}
            }
        }
    }

    Ok(())
}

/// Entry point for the TUI application.
///
/// With `file`, the path is filled in and its upload starts right away.
///
/// # Errors
///
/// Returns an error if terminal initialization or the event loop fails.
pub fn run(
    client: Arc<dyn PredictionClientTrait>,
    file: Option<PathBuf>,
    export_dir: PathBuf,
) -> Result<()> {
    init_panic_hook();

    let mut app = App::new(export_dir);
    let mut uploader = Uploader::new(client);
    if let Some(path) = file {
        app.set_file_input(path.display().to_string());
        if let Some(ticket) = app.submit_file() {
            uploader.start(ticket);
        }
    }

    run_in_terminal(&mut app, &mut uploader).context("TUI event loop failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::predictor::CsvUpload;
    use std::time::Instant;

    struct FixedClient;

    impl PredictionClientTrait for FixedClient {
        fn predict(&self, upload: &CsvUpload) -> Result<ResultSet, PredictError> {
            assert_eq!(upload.file_name(), "in.csv");
            Ok(vec![Record::new("A", ["x"]), Record::new("B", ["x", "y"])].into())
        }
    }

    struct FailingClient;

    impl PredictionClientTrait for FailingClient {
        fn predict(&self, _upload: &CsvUpload) -> Result<ResultSet, PredictError> {
            Err(PredictError::Http { status: 500 })
        }
    }

    fn wait_for_upload(uploader: &mut Uploader, app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.session().is_loading() && Instant::now() < deadline {
            uploader.poll(app);
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn app_with_csv() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("in.csv");
        std::fs::write(&csv, "ABSTRACT\nA\nB\n").unwrap();
        let mut app = App::new(dir.path());
        app.set_file_input(csv.display().to_string());
        (dir, app)
    }

    #[test]
    fn background_upload_installs_results() {
        let (_dir, mut app) = app_with_csv();
        let mut uploader = Uploader::new(Arc::new(FixedClient));

        uploader.start(app.submit_file().unwrap());
        wait_for_upload(&mut uploader, &mut app);

        assert!(!app.session().is_loading());
        assert_eq!(app.filter_labels(), vec!["All", "x", "y"]);
        assert!(uploader.pending.is_none());
    }

    #[test]
    fn background_upload_failure_keeps_empty_results() {
        let (_dir, mut app) = app_with_csv();
        let mut uploader = Uploader::new(Arc::new(FailingClient));

        uploader.start(app.submit_file().unwrap());
        wait_for_upload(&mut uploader, &mut app);

        assert!(app.session().results().is_empty());
        assert_eq!(
            app.session().notice().unwrap().message(),
            "Upload failed or invalid file format."
        );
    }

    #[test]
    fn cancelled_background_upload_is_dropped() {
        let (_dir, mut app) = app_with_csv();
        let mut uploader = Uploader::new(Arc::new(FixedClient));

        uploader.start(app.submit_file().unwrap());
        app.cancel_upload();

        let deadline = Instant::now() + Duration::from_secs(5);
        while uploader.pending.is_some() && Instant::now() < deadline {
            uploader.poll(&mut app);
            std::thread::sleep(Duration::from_millis(5));
        }

        assert!(app.session().results().is_empty());
    }
}

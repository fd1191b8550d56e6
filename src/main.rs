use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tagscope::{
    ChartKind, PredictError, PredictionClient, PredictionClientBuilder, Session, SessionError,
    TagFilter, logging, tui, utils,
};

/// tagscope - explore predicted tags for a CSV of article abstracts
#[derive(Parser)]
#[command(name = "tagscope")]
#[command(about = "Upload article abstracts for tag prediction and explore the results")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Upload a CSV and print the tag frequencies and records
    Predict(PredictCommand),
    /// Check that the prediction service is up
    Health(HealthCommand),
    /// Open the interactive terminal interface
    Tui(TuiCommand),
}

/// Upload a CSV of abstracts
#[derive(Parser)]
struct PredictCommand {
    /// CSV file with an ABSTRACT column
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Only list records carrying this tag ("All" lists everything)
    #[arg(short, long, value_name = "TAG")]
    tag: Option<String>,

    /// Chart kind used for the PDF export
    #[arg(short, long, value_name = "KIND", default_value = "bar")]
    chart: ChartKind,

    /// Write predictions.csv
    #[arg(long)]
    csv: bool,

    /// Write tag-distribution-chart.pdf
    #[arg(long)]
    pdf: bool,

    /// Directory for exported files (default: TAGSCOPE_EXPORT_DIR or Downloads)
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Prediction service base URL (default: TAGSCOPE_URL or http://localhost:5000)
    #[arg(short, long, value_name = "URL")]
    server: Option<String>,
}

/// Query the service health endpoint
#[derive(Parser)]
struct HealthCommand {
    /// Prediction service base URL
    #[arg(short, long, value_name = "URL")]
    server: Option<String>,
}

/// Interactive terminal interface
#[derive(Parser)]
struct TuiCommand {
    /// CSV file to upload on start
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Prediction service base URL
    #[arg(short, long, value_name = "URL")]
    server: Option<String>,

    /// Directory for exported files
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // The TUI owns the terminal; console logging would draw over it
    if !matches!(cli.command, Commands::Tui(_))
        && let Err(e) = logging::init(cli.verbose)
    {
        eprintln!("Warning: logging disabled: {e}");
    }

    let result = match &cli.command {
        Commands::Predict(cmd) => handle_predict(cmd),
        Commands::Health(cmd) => handle_health(cmd),
        Commands::Tui(cmd) => handle_tui(cmd),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad input: an unreadable CSV path, an invalid service URL,
/// or a file the service rejected. Everything else (network failures,
/// unexpected responses, write errors) is internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(session_error) = cause.downcast_ref::<SessionError>() {
            return matches!(session_error, SessionError::NoFileSelected);
        }
        matches!(
            cause.downcast_ref::<PredictError>(),
            Some(PredictError::Io { .. } | PredictError::InvalidUrl(_) | PredictError::Api { .. })
        )
    })
}

fn build_client(server: Option<&str>) -> Result<PredictionClient> {
    let mut builder = PredictionClientBuilder::new();
    if let Some(url) = server {
        builder = builder.base_url(url);
    }
    Ok(builder.build()?)
}

fn export_directory(out_dir: Option<&Path>) -> Result<PathBuf> {
    match out_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => utils::get_export_directory(),
    }
}

/// Handles the predict command: upload, print, optionally export.
fn handle_predict(cmd: &PredictCommand) -> Result<()> {
    let client = build_client(cmd.server.as_deref())?;

    let mut session = Session::new();
    session.select_file(Some(cmd.file.clone()));
    session.set_chart_kind(cmd.chart);
    if let Some(tag) = &cmd.tag {
        session.set_filter(TagFilter::from_label(tag));
    }

    session
        .upload(&client)
        .with_context(|| format!("Failed to get predictions for {}", cmd.file.display()))?;

    print!("{}", render_report(&session));

    if cmd.csv || cmd.pdf {
        let dir = export_directory(cmd.out_dir.as_deref())?;
        if cmd.csv {
            let path = session.csv_download().save_in(&dir)?;
            println!("Saved {}", path.display());
        }
        if cmd.pdf {
            let path = session.chart_download()?.save_in(&dir)?;
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}

/// Frequency cards followed by the filtered records.
fn render_report(session: &Session) -> String {
    let mut out = String::new();

    out.push_str("Tag Frequency\n");
    let table = session.frequency_table();
    if table.is_empty() {
        out.push_str("  (no tags)\n");
    }
    for (tag, count) in table.iter() {
        out.push_str(&format!("  {tag}: {count}\n"));
    }

    let records = session.filtered_records();
    out.push_str(&format!(
        "\nRecords (filter: {}, {} of {})\n",
        session.filter(),
        records.len(),
        session.results().len()
    ));
    for record in records {
        out.push_str(&format!("- {}\n", record.abstract_text()));
        out.push_str(&format!("  tags: {}\n", record.joined_tags()));
    }

    out
}

/// Handles the health command.
fn handle_health(cmd: &HealthCommand) -> Result<()> {
    let client = build_client(cmd.server.as_deref())?;
    let status = client
        .health()
        .with_context(|| format!("Prediction service at {} is unreachable", client.base_url()))?;

    println!("{}: {}", client.base_url(), status);
    Ok(())
}

/// Handles the tui command.
fn handle_tui(cmd: &TuiCommand) -> Result<()> {
    let client = build_client(cmd.server.as_deref())?;
    let export_dir = export_directory(cmd.out_dir.as_deref())?;

    tui::run(Arc::new(client), cmd.file.clone(), export_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tagscope::{Record, ResultSet};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn predict_parses_all_flags() {
        let cli = Cli::try_parse_from([
            "tagscope", "predict", "in.csv", "--tag", "ml", "--chart", "pie", "--csv", "--pdf",
            "--out-dir", "out", "--server", "http://host:9000",
        ])
        .unwrap();

        let Commands::Predict(cmd) = cli.command else {
            panic!("expected predict command");
        };
        assert_eq!(cmd.file, PathBuf::from("in.csv"));
        assert_eq!(cmd.tag.as_deref(), Some("ml"));
        assert_eq!(cmd.chart, ChartKind::Pie);
        assert!(cmd.csv && cmd.pdf);
        assert_eq!(cmd.out_dir, Some(PathBuf::from("out")));
        assert_eq!(cmd.server.as_deref(), Some("http://host:9000"));
    }

    #[test]
    fn predict_defaults_to_bar_chart() {
        let cli = Cli::try_parse_from(["tagscope", "predict", "in.csv"]).unwrap();

        let Commands::Predict(cmd) = cli.command else {
            panic!("expected predict command");
        };
        assert_eq!(cmd.chart, ChartKind::Bar);
        assert!(!cmd.csv && !cmd.pdf);
    }

    #[test]
    fn unknown_chart_kind_is_rejected() {
        let result = Cli::try_parse_from(["tagscope", "predict", "in.csv", "--chart", "donut"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["tagscope", "health", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn tui_file_is_optional() {
        let cli = Cli::try_parse_from(["tagscope", "tui"]).unwrap();
        let Commands::Tui(cmd) = cli.command else {
            panic!("expected tui command");
        };
        assert!(cmd.file.is_none());
    }

    #[test]
    fn missing_file_is_user_error() {
        let error = anyhow::Error::new(SessionError::Upload(PredictError::Io {
            path: "missing.csv".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }));
        assert!(is_user_error(&error));
    }

    #[test]
    fn invalid_url_is_user_error() {
        let error = build_client(Some("not a url")).unwrap_err();
        assert!(is_user_error(&error));
    }

    #[test]
    fn server_failure_is_internal_error() {
        let error = anyhow::Error::new(SessionError::Upload(PredictError::Http { status: 503 }))
            .context("Failed to get predictions");
        assert!(!is_user_error(&error));
    }

    #[test]
    fn report_lists_cards_and_filtered_records() {
        let mut session = Session::new();
        session.install(ResultSet::from(vec![
            Record::new("A", ["x"]),
            Record::new("B", ["x", "y"]),
        ]));
        session.set_filter(TagFilter::from_label("y"));

        let report = render_report(&session);

        assert!(report.contains("  x: 2\n  y: 1\n"));
        assert!(report.contains("Records (filter: y, 1 of 2)"));
        assert!(report.contains("- B\n  tags: x, y\n"));
        assert!(!report.contains("- A\n"));
    }

    #[test]
    fn report_for_empty_results() {
        let report = render_report(&Session::new());
        assert!(report.contains("(no tags)"));
        assert!(report.contains("0 of 0"));
    }
}

//! CLI binary for docintel.
//!
//! A thin shim over the library crate: `serve` runs the HTTP ingress,
//! `extract` runs the pipeline on one local file, either in-process or
//! against a running server.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docintel::{
    AnalyzeClient, ExtractionRequest, Extractor, ExtractorConfig, MismatchPolicy,
    ProcessingStage, StageObserver, StageTracker, UploadedDocument,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Terminal stage spinner ───────────────────────────────────────────────────

/// Renders the processing stages as a single spinner line.
struct StageSpinner {
    bar: ProgressBar,
}

impl StageSpinner {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl StageObserver for StageSpinner {
    fn on_stage(&self, stage: ProcessingStage) {
        match stage {
            ProcessingStage::Complete => self.bar.finish_with_message(green("Complete")),
            ProcessingStage::Failed => {}
            other => self.bar.set_message(other.label().to_string()),
        }
    }

    fn on_failed(&self, message: &str) {
        self.bar.abandon_with_message(red(message));
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "docintel",
    version,
    about = "Extract structured fields from scanned documents (images and PDFs)",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all log output.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (POST /analyze, GET /health).
    Serve {
        /// Address to listen on.
        #[arg(long, env = "DOCINTEL_LISTEN", default_value = "127.0.0.1:3000")]
        listen: SocketAddr,
    },

    /// Extract structured fields from one local file.
    Extract {
        /// Image or PDF file.
        input: PathBuf,

        /// Send the file to a running docintel server instead of
        /// processing in-process.
        #[arg(long, env = "DOCINTEL_REMOTE")]
        remote: Option<String>,

        /// Print the raw machine-readable JSON body instead of a summary.
        #[arg(long)]
        json: bool,

        /// Also print the raw extracted text preview.
        #[arg(long)]
        preview: bool,

        /// Reject mismatched document types instead of warning.
        #[arg(long)]
        strict_type: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve { listen } => serve(listen).await,
        Command::Extract {
            input,
            remote,
            json,
            preview,
            strict_type,
        } => match remote {
            Some(base_url) => extract_remote(&input, &base_url, json, preview, cli.quiet).await,
            None => extract_local(&input, json, preview, strict_type, cli.quiet).await,
        },
    }
}

async fn serve(listen: SocketAddr) -> Result<()> {
    let config = ExtractorConfig::from_env()?;
    let extractor = Extractor::new(config);
    docintel::server::serve(extractor, listen)
        .await
        .context("Server exited with an error")?;
    Ok(())
}

async fn extract_remote(
    input: &PathBuf,
    base_url: &str,
    json: bool,
    preview: bool,
    quiet: bool,
) -> Result<()> {
    let client = AnalyzeClient::new(base_url);
    let mut tracker = StageTracker::new();
    if !quiet && !json {
        tracker = tracker.with_observer(StageSpinner::new());
    }

    let response = client.analyze_file(input, &mut tracker).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    if let Some(warning) = &response.warning {
        eprintln!("{}", red(warning));
    }
    print_record(&response.extracted_data);
    if preview {
        println!("\n{}\n{}", bold("Raw text preview:"), dim(&response.raw_text_preview));
    }
    Ok(())
}

async fn extract_local(
    input: &PathBuf,
    json: bool,
    preview: bool,
    strict_type: bool,
    quiet: bool,
) -> Result<()> {
    let mut config = ExtractorConfig::from_env()?;
    if strict_type {
        config.mismatch_policy = MismatchPolicy::Reject;
    }
    let budget = Duration::from_secs(config.request_budget_secs);
    let expected = config.expected_type_token.clone();
    let extractor = Extractor::new(config);

    let mut tracker = StageTracker::new();
    if !quiet && !json {
        tracker = tracker.with_observer(StageSpinner::new());
    }
    tracker.begin_upload();

    let bytes = match std::fs::read(input) {
        Ok(bytes) => bytes,
        Err(e) => {
            let message = format!("Cannot read file '{}': {e}", input.display());
            tracker.fail(message.clone());
            anyhow::bail!(message);
        }
    };
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let document = UploadedDocument::new(bytes, None, name);
    let request = ExtractionRequest::new(document, budget);

    tracker.advance(); // uploading → extracting

    let extraction = match extractor.run(request).await {
        Ok(extraction) => extraction,
        Err(err) => {
            tracker.fail(err.to_string());
            return Err(err.into());
        }
    };
    while !tracker.stage().is_terminal() && tracker.advance() {}

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "extracted_data": extraction.record,
                "raw_text_preview": extraction.preview,
            }))?
        );
        return Ok(());
    }
    if !extraction.type_matches {
        eprintln!(
            "{}",
            red(&format!(
                "This document does not appear to match the expected type '{expected}'"
            ))
        );
    }
    print_record(&extraction.record);
    if preview {
        println!("\n{}\n{}", bold("Raw text preview:"), dim(&extraction.preview));
    }
    Ok(())
}

fn print_record(record: &docintel::LicenseRecord) {
    let row = |label: &str, value: &str| {
        println!("  {:<16} {}", bold(label), value);
    };
    println!("{}", bold("Extracted fields"));
    row("Document type", &record.document_type);
    row("Name", &record.name);
    row("Date of birth", &record.date_of_birth);
    row("License number", &record.license_number);
    row("Issue date", &record.issue_date);
    row("Expiry date", &record.expiry_date);
    row("Address", &record.address);
}

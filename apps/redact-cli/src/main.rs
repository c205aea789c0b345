//! Redact CLI binary
//!
//! Entry point for applying edit scripts to PDF files.

use anyhow::Context;
use clap::Parser;
use redact_cli::config::Config;
use redact_cli::script::{self, Script};
use redact_core::RedactSession;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "redact")]
#[command(
    version,
    about = "Burn whiteouts, text stamps and freehand strokes into a PDF"
)]
struct Args {
    /// PDF to redact
    #[arg(short, long)]
    input: PathBuf,

    /// JSON edit script to replay
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Where to write the result (default: <input>-redacted.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Run the script and report, but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Load saved redaction data before running the script
    #[arg(long)]
    import_json: Option<PathBuf>,

    /// Save the final annotations as redaction data
    #[arg(long)]
    export_json: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for the stats report
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting redact v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let bytes = fs::read(&args.input)
        .with_context(|| format!("Failed to read PDF: {}", args.input.display()))?;
    let name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.input.display().to_string());
    let mut session = RedactSession::open(name, bytes, config.store_options())?;

    if let Some(path) = &args.import_json {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read redaction data: {}", path.display()))?;
        session.import_json(&json)?;
    }

    if let Some(path) = &args.script {
        let script = Script::from_file(path)?;
        let report = script::run(&mut session, &script, &config)?;
        tracing::info!(
            "Ran {} steps, created {} annotations ({} no-op undo/redo)",
            report.steps_run,
            report.created.len(),
            report.no_ops
        );
    }

    let stats = session.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);

    if let Some(path) = &args.export_json {
        fs::write(path, session.export_json()?)
            .with_context(|| format!("Failed to write redaction data: {}", path.display()))?;
        tracing::info!("Saved redaction data to {}", path.display());
    }

    if args.dry_run {
        tracing::info!("Dry run, no PDF written");
        return Ok(());
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| redact_cli::default_output_path(&args.input));
    let output = session.export()?;
    fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write PDF: {}", output_path.display()))?;
    tracing::info!(
        "Wrote {} ({} bytes)",
        output_path.display(),
        output.len()
    );

    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use logaudit_lib::{DiagnosticSink, FanoutSink, FileSink, TracingSink};
use logaudit_runner::{AuditConfig, ShutdownCoordinator, renderer, run_audit};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Scans batch-job logs for slow, duplicated and unterminated sessions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Logs directory path [default: ./logs]
    #[arg(short = 'l', long = "logs")]
    logs: Option<PathBuf>,

    /// File the diagnostics are appended to [default: ./output]
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Case-insensitive regex for log file names
    #[arg(long)]
    pattern: Option<String>,

    /// Print the run summary as JSON instead of a tree
    #[arg(long)]
    json: bool,

    /// Also echo every diagnostic to the console log
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,logaudit_lib=debug,logaudit_runner=debug".into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to set global default tracing subscriber")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file in the current directory.
    dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();

    let mut config = AuditConfig::from_env();
    if let Some(logs) = cli.logs {
        config.logs_dir = logs;
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if let Some(pattern) = cli.pattern {
        config.file_pattern = pattern;
    }

    let file_sink = FileSink::open(&config.output_path).with_context(|| {
        format!(
            "Failed to open output file: {}",
            config.output_path.display()
        )
    })?;
    let sink: Arc<dyn DiagnosticSink> = if cli.verbose {
        Arc::new(
            FanoutSink::new()
                .with(Arc::new(file_sink))
                .with(Arc::new(TracingSink)),
        )
    } else {
        Arc::new(file_sink)
    };

    let shutdown = ShutdownCoordinator::new();
    shutdown
        .setup_signal_handlers()
        .context("Failed to setup signal handlers")?;

    let summary = run_audit(&config, sink, &shutdown).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", renderer::render_summary_as_tree(&summary)?);
    }
    info!(output = %config.output_path.display(), "Diagnostics written");

    let failed = summary.failed_count();
    if failed > 0 {
        anyhow::bail!("{failed} log file(s) could not be processed");
    }
    Ok(())
}

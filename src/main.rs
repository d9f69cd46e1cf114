// This is the command-line entry point for the file transformer.
// The lib.rs file serves as the public API for library consumers.

use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use file_transformer_lib::core::{AppConfig, AppState, EntryView, TransformMode};
use file_transformer_lib::utils::TargetFormat;
use file_transformer_lib::{BatchOutcome, BatchRequest, transform_files};

#[derive(Debug, Parser)]
#[command(name = "file-transformer", version, about = "Compress, convert or remove backgrounds from batches of files")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory the results are saved into
    #[arg(long, short, global = true, default_value = "output")]
    out: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Downscale and re-encode images as JPEG
    Compress {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert files to another format through the conversion service
    Convert {
        /// Target format, e.g. png, jpg, webp, pdf
        #[arg(long)]
        to: Option<TargetFormat>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove image backgrounds through the matting service
    #[command(alias = "remove-bg")]
    RemoveBackground {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Command {
    fn into_parts(self) -> (TransformMode, Vec<PathBuf>, Option<TargetFormat>) {
        match self {
            Command::Compress { files } => (TransformMode::Compress, files, None),
            Command::Convert { to, files } => (TransformMode::Convert, files, to),
            Command::RemoveBackground { files } => (TransformMode::RemoveBackground, files, None),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!("=== File Transformer Starting ===");

    let cli = Cli::parse();
    match run(cli).await {
        Ok(outcome) => {
            print_outcome(&outcome);
            if outcome.any_succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<BatchOutcome> {
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let state = AppState::new(config).context("Failed to initialize HTTP client")?;

    let (mode, inputs, target_format) = cli.command.into_parts();
    info!("Transforming {} files ({mode})", inputs.len());

    transform_files(
        &state,
        BatchRequest {
            mode,
            inputs,
            target_format,
            output_dir: cli.out,
        },
    )
    .await
}

fn print_outcome(outcome: &BatchOutcome) {
    for rejection in &outcome.rejected {
        println!("- {}: {}", rejection.file_name, rejection.reason);
    }

    for entry in &outcome.snapshot.entries {
        println!("{}", describe(entry));
    }

    for (_, path) in &outcome.downloads.saved {
        println!("  saved {}", path.display());
    }

    let progress = &outcome.snapshot.progress;
    println!(
        "{} succeeded, {} failed, {} rejected",
        progress.success,
        progress.failed,
        outcome.rejected.len()
    );
}

fn describe(entry: &EntryView) -> String {
    match (&entry.result, &entry.error) {
        (Some(artifact), _) => format!(
            "✓ {} → {} ({} → {} bytes)",
            entry.file_name, artifact.file_name, artifact.original_size, artifact.size
        ),
        (None, Some(error)) => format!("✗ {}: {}", entry.file_name, error.message),
        (None, None) => format!("? {} ({})", entry.file_name, entry.state),
    }
}

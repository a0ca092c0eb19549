//! ifv-client - Indian Food Vision classification client
//!
//! Subcommands:
//! - `serve`: local HTTP + SSE surface for a web UI
//! - `classify <FILE>`: classify one local image and print the ranking
//! - `example <NAME>`: classify a bundled example
//! - `examples`: list bundled examples
//!
//! Every mode that talks to the inference service fires the warmup request
//! once at startup.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use ifv_client::models::ImageSubmission;
use ifv_client::services::preview_decoder::sniff_mime;
use ifv_client::services::{ClassificationSession, SubmitOutcome};
use ifv_client::{build_router, build_session, AppState};
use ifv_common::config::{ConfigOverrides, ConfigSource, IfvConfig, LoggingConfig};
use ifv_common::events::{EventBus, SessionState};
use ifv_common::human_format::format_probability;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ifv-client", version, about = "Classify Indian dishes with the Indian Food Vision service")]
struct Cli {
    /// Inference service base URL (`/predict` is appended)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Directory holding the bundled example images
    #[arg(long, global = true)]
    static_assets: Option<PathBuf>,

    /// Per-request timeout in seconds (default: none)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// TOML config file (default: ~/.config/ifv/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the local HTTP surface
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Classify a local image file
    Classify { file: PathBuf },
    /// Classify a bundled example by name
    Example { name: String },
    /// List bundled examples
    Examples,
}

impl Command {
    /// Whether this mode sends anything to the inference service
    fn contacts_service(&self) -> bool {
        !matches!(self, Command::Examples)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        endpoint: cli.endpoint.clone(),
        port: match &cli.command {
            Command::Serve { port } => *port,
            _ => None,
        },
        static_assets: cli.static_assets.clone(),
        request_timeout_secs: cli.timeout_secs,
        config_file: cli.config.clone(),
    };
    let config = IfvConfig::resolve(&overrides)?;

    init_tracing(&config.logging)?;

    info!(
        "Starting ifv-client v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config.source {
        ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
        ConfigSource::Defaults => warn!("No config file found, using defaults"),
    }
    info!("Inference endpoint: {}", config.predict_url());

    let event_bus = EventBus::new(100);
    let session = build_session(&config, event_bus)?;

    if !cli.command.contacts_service() {
        for asset in session.catalog().entries() {
            println!("{:<18} {}", asset.name, session.catalog().root().join(asset.path).display());
        }
        return Ok(());
    }

    // Detached; never awaited
    session.start_warmup();

    match cli.command {
        Command::Serve { .. } => serve(session, config.port).await,
        Command::Classify { file } => {
            let submission = read_submission(&file).await?;
            report(session.submit(submission).await).await
        }
        Command::Example { name } => report(session.submit_example(&name).await?).await,
        Command::Examples => Ok(()),
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

async fn serve(session: ClassificationSession, port: u16) -> Result<()> {
    let state = AppState::new(session);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("Failed to bind to 127.0.0.1:{}", port))?;
    info!("ifv-client listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn read_submission(path: &Path) -> Result<ImageSubmission> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let declared_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let mime_type = sniff_mime(&bytes);
    if mime_type == "application/octet-stream" {
        warn!("{} does not look like an image; sending anyway", path.display());
    }

    Ok(ImageSubmission::new(bytes, declared_name, mime_type))
}

/// Wait for the submission and print the outcome
async fn report(outcome: SubmitOutcome) -> Result<()> {
    let handle = outcome
        .into_handle()
        .ok_or_else(|| anyhow!("a classification is already in progress"))?;

    match handle.settled().await? {
        SessionState::Success { result, .. } => {
            let top = result
                .top()
                .ok_or_else(|| anyhow!("classification returned no predictions"))?;
            println!("Top prediction: {} ({})", top.label, format_probability(top.probability));

            if !result.runners_up().is_empty() {
                println!("Other possibilities:");
                for prediction in result.runners_up() {
                    println!("  {:<24} {:>6}", prediction.label, prediction.percentage());
                }
            }
            println!("Processing time: {}s", result.processing_time_display());
            Ok(())
        }
        SessionState::Error { message, .. } => Err(anyhow!(message)),
        other => Err(anyhow!("submission ended in unexpected state {}", other.status_name())),
    }
}

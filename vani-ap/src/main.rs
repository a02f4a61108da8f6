//! Announcer Player (vani-ap) - Main entry point
//!
//! Serves the generation, audio and playback API by default. `say` runs a
//! single generation and writes the WAV container to disk instead.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vani_ap::api::{self, AppContext};
use vani_ap::audio::{frame, PcmBuffer};
use vani_ap::config::{Config, ConfigOverrides};
use vani_ap::generation::{GeminiSynthesizer, GenerationOrchestrator, SpeechSynthesizer};
use vani_ap::SharedState;

/// Command-line arguments for vani-ap
#[derive(Parser, Debug)]
#[command(name = "vani-ap")]
#[command(about = "Text-to-speech announcer player")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "VANI_PORT")]
    port: Option<u16>,

    /// Speech service API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Path to config.toml
    #[arg(short, long, env = "VANI_CONFIG")]
    config: Option<PathBuf>,

    /// TTS model name
    #[arg(long, env = "VANI_MODEL")]
    model: Option<String>,

    /// Prebuilt voice name
    #[arg(long, env = "VANI_VOICE")]
    voice: Option<String>,

    /// Speech service base URL
    #[arg(long, env = "VANI_API_BASE_URL")]
    api_base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Generate one announcement and write it as a WAV file
    Say {
        /// Text to speak
        #[arg(short, long)]
        text: String,

        /// Output file
        #[arg(short, long, default_value = "speech.wav")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vani_ap=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let file_config = vani_common::config::load_toml_config(args.config.as_deref())
        .context("Failed to load configuration file")?;
    let overrides = ConfigOverrides {
        port: args.port,
        api_key: args.api_key,
        model: args.model,
        voice: args.voice,
        api_base_url: args.api_base_url,
    };
    let config =
        Config::resolve(overrides, file_config).context("Invalid configuration")?;

    if config.gemini.api_key.is_none() {
        tracing::warn!("No speech service API key configured; generation requests will fail");
    }

    let synthesizer = Arc::new(
        GeminiSynthesizer::new(config.gemini.clone())
            .context("Failed to initialize speech synthesizer")?,
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, synthesizer).await,
        Command::Say { text, out } => say(&*synthesizer, &text, &out).await,
    }
}

async fn serve(config: Config, synthesizer: Arc<GeminiSynthesizer>) -> Result<()> {
    info!(
        "Starting Vani Announcer Player on port {} (model {}, voice {})",
        config.port, config.gemini.model, config.gemini.voice
    );

    let state = Arc::new(SharedState::new());
    let orchestrator = GenerationOrchestrator::new(state.clone(), synthesizer)
        .with_max_text_chars(config.max_text_chars);

    let app = api::create_router(AppContext {
        state,
        orchestrator,
        port: config.port,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn say(synthesizer: &dyn SpeechSynthesizer, text: &str, out: &Path) -> Result<()> {
    let text = text.trim();
    anyhow::ensure!(!text.is_empty(), "Announcement text is empty");

    let pcm = synthesizer.synthesize(text).await?;
    let pcm = PcmBuffer::new(pcm.bytes, pcm.format)?;
    let container = frame(&pcm);

    tokio::fs::write(out, container.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;

    info!(
        "Wrote {} ({} bytes, {:.2}s)",
        out.display(),
        container.len(),
        container.duration_seconds()
    );
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

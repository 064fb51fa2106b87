//! Storycast entry point
//!
//! Thin shell around the orchestrator: argument parsing, settings loading,
//! tracing setup (stderr plus a run log in the output directory), and
//! ctrl-c wiring into the graceful-drain cancellation flag.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use storycast_client::{AnimationService, WaspClient, WaspClientConfig};
use storycast_config::{load_settings, Settings, SynthesisBackendKind};
use storycast_core::{Script, SpeechSynthesizer};
use storycast_pipeline::{HttpSynthesizer, HttpSynthesizerConfig, Orchestrator, SilenceSynthesizer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "storycast", about = "Turn a story script into speech and animated video")]
struct Args {
    /// Path to the story JSON file
    #[arg(long, default_value = "story.json")]
    file: PathBuf,

    /// Output directory for per-segment and combined artifacts
    #[arg(long)]
    output_path: Option<String>,

    /// Stem for the combined output files
    #[arg(long)]
    output_name: Option<String>,

    /// Synthesis quality preset (ultra_fast, fast, standard, high_quality)
    #[arg(long)]
    preset: Option<String>,

    /// Use the silence synthesizer instead of the TTS sidecar
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env = std::env::var("STORYCAST_ENV").ok();
    let mut settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!("Warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };
    if let Some(output_path) = args.output_path {
        settings.run.output_dir = output_path;
    }
    if let Some(output_name) = args.output_name {
        settings.run.output_name = output_name;
    }
    if let Some(preset) = args.preset {
        settings.synthesis.preset = preset;
    }

    init_tracing(&settings)?;
    tracing::info!("storycast v{}", env!("CARGO_PKG_VERSION"));

    let script = Script::from_file(
        &args.file,
        &settings.synthesis.narrator_voice,
        &settings.synthesis.default_style,
    )
    .with_context(|| format!("failed to load story from {}", args.file.display()))?;
    tracing::info!(file = %args.file.display(), segments = script.len(), "story loaded");

    let synthesizer: Arc<dyn SpeechSynthesizer> =
        if args.dry_run || settings.synthesis.backend == SynthesisBackendKind::Silence {
            Arc::new(SilenceSynthesizer::new())
        } else {
            Arc::new(HttpSynthesizer::new(HttpSynthesizerConfig {
                url: settings.synthesis.url.clone(),
                timeout: std::time::Duration::from_millis(settings.synthesis.timeout_ms),
            })?)
        };

    let service: Arc<dyn AnimationService> = Arc::new(WaspClient::new(WaspClientConfig {
        base_url: settings.remote.base_url.clone(),
        request_timeout: std::time::Duration::from_secs(settings.remote.request_timeout_secs),
    })?);

    let orchestrator = Orchestrator::new(settings, synthesizer, service);

    // Stop issuing new segment starts on ctrl-c; in-flight background tasks
    // are joined, not abandoned.
    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing started segments");
            cancel.cancel();
        }
    });

    let report = orchestrator.run(&script).await?;

    for segment in &report.segments {
        match &segment.error {
            Some(error) => {
                tracing::error!(index = segment.index, speaker = %segment.speaker, %error, "segment failed")
            }
            None => tracing::info!(index = segment.index, speaker = %segment.speaker, "segment ok"),
        }
    }
    tracing::info!(
        run_id = %report.run_id,
        failed = report.failed_indices().len(),
        audio = ?report.combined_audio,
        video = ?report.combined_video,
        "done"
    );

    if report.all_failed() {
        anyhow::bail!("every segment failed");
    }
    Ok(())
}

/// Stderr logging plus a plain-text run log inside the output directory
fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    std::fs::create_dir_all(&settings.run.output_dir)?;
    let log_path = std::path::Path::new(&settings.run.output_dir).join("run.log");
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("failed to create {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();
    Ok(())
}

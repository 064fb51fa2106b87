//! Main settings module

use crate::ConfigError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Remote animation service configuration
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Run/output configuration
    #[serde(default)]
    pub run: RunConfig,
}

/// Remote animation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the animation service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Fixed interval between status polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Optional cap on the total wait for one job; `None` waits forever
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,

    /// Per-request HTTP timeout, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sampling temperature for motion generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Deterministic motion seed; `None` generates one per submission
    #[serde(default)]
    pub seed: Option<u32>,

    /// Pose code override; `None` uses the style's static mapping
    #[serde(default)]
    pub pose: Option<String>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_temperature() -> f32 {
    0.5
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_timeout_secs: None,
            request_timeout_secs: default_request_timeout_secs(),
            temperature: default_temperature(),
            seed: None,
            pose: None,
        }
    }
}

/// Which speech backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisBackendKind {
    /// TTS sidecar service over HTTP
    #[default]
    Http,
    /// Deterministic silent audio, for tests and dry runs
    Silence,
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Backend selection
    #[serde(default)]
    pub backend: SynthesisBackendKind,

    /// Base URL of the TTS sidecar service
    #[serde(default = "default_synthesis_url")]
    pub url: String,

    /// Synthesis request timeout, in milliseconds
    #[serde(default = "default_synthesis_timeout_ms")]
    pub timeout_ms: u64,

    /// Quality preset name (ultra_fast, fast, standard, high_quality)
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Voice used for scenario narration lines
    #[serde(default = "default_narrator_voice")]
    pub narrator_voice: String,

    /// Style used when the script does not specify a sentiment
    #[serde(default = "default_style")]
    pub default_style: String,
}

fn default_synthesis_url() -> String {
    "http://127.0.0.1:8090".to_string()
}

fn default_synthesis_timeout_ms() -> u64 {
    120_000
}

fn default_preset() -> String {
    "high_quality".to_string()
}

fn default_narrator_voice() -> String {
    "freeman".to_string()
}

fn default_style() -> String {
    "Neutral".to_string()
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            backend: SynthesisBackendKind::default(),
            url: default_synthesis_url(),
            timeout_ms: default_synthesis_timeout_ms(),
            preset: default_preset(),
            narrator_voice: default_narrator_voice(),
            default_style: default_style(),
        }
    }
}

/// Run/output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory receiving per-segment and combined outputs
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Stem for the combined audio/video files
    #[serde(default = "default_output_name")]
    pub output_name: String,

    /// Delay between segment starts, throttling burst load on the remote
    /// service and on local synthesis, in milliseconds
    #[serde(default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,
}

fn default_output_dir() -> String {
    "results".to_string()
}

fn default_output_name() -> String {
    "story".to_string()
}

fn default_pacing_delay_ms() -> u64 {
    1000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            output_name: default_output_name(),
            pacing_delay_ms: default_pacing_delay_ms(),
        }
    }
}

/// Load settings from files and environment
///
/// Priority: env vars > `config/{env}.toml` > `config/default.toml` >
/// serde defaults. Missing files are fine; unknown env values are errors.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder =
        Config::builder().add_source(File::with_name("config/default").required(false));

    if let Some(env) = env {
        builder = builder.add_source(File::with_name(&format!("config/{env}")).required(false));
    }

    let config = builder
        .add_source(Environment::with_prefix("STORYCAST").separator("__"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    tracing::debug!(
        base_url = %settings.remote.base_url,
        backend = ?settings.synthesis.backend,
        "settings loaded"
    );
    Ok(settings)
}

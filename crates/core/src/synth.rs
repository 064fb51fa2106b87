//! Speech synthesis backend trait
//!
//! The pipeline only needs `synthesize(text, voice) -> audio bytes`; the
//! engine itself (voice conditioning, model inference) lives behind this
//! trait so backends can be swapped without touching the orchestration.

use crate::artifact::Artifact;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Quality/latency preset for synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisPreset {
    UltraFast,
    Fast,
    Standard,
    #[default]
    HighQuality,
}

impl SynthesisPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisPreset::UltraFast => "ultra_fast",
            SynthesisPreset::Fast => "fast",
            SynthesisPreset::Standard => "standard",
            SynthesisPreset::HighQuality => "high_quality",
        }
    }

    pub fn from_name(name: &str) -> Option<SynthesisPreset> {
        match name {
            "ultra_fast" => Some(SynthesisPreset::UltraFast),
            "fast" => Some(SynthesisPreset::Fast),
            "standard" => Some(SynthesisPreset::Standard),
            "high_quality" => Some(SynthesisPreset::HighQuality),
            _ => None,
        }
    }

    /// Resolve a preset name, warning and substituting the default when the
    /// name is not recognized
    pub fn resolve(name: &str) -> SynthesisPreset {
        match SynthesisPreset::from_name(name) {
            Some(preset) => preset,
            None => {
                let preset = SynthesisPreset::default();
                tracing::warn!(
                    name = %name,
                    substituted = preset.as_str(),
                    "unknown synthesis preset"
                );
                preset
            }
        }
    }
}

/// Voice conditioning for one synthesis call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSpec {
    /// Voice identifier, usually the segment speaker
    pub voice: String,
    /// Quality preset
    pub preset: SynthesisPreset,
    /// Deterministic seed; `None` lets the backend choose
    pub seed: Option<u32>,
}

impl VoiceSpec {
    pub fn new(voice: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            preset: SynthesisPreset::default(),
            seed: None,
        }
    }

    pub fn with_preset(mut self, preset: SynthesisPreset) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Speech synthesis interface
///
/// Implementations:
/// - `HttpSynthesizer` - posts text to a TTS sidecar service
/// - `SilenceSynthesizer` - deterministic silent WAV, for tests and dry runs
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech for `text` with the given voice conditioning
    ///
    /// Returns a WAV [`Artifact`] of kind `Audio`.
    async fn synthesize(&self, text: &str, voice: &VoiceSpec) -> Result<Artifact>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

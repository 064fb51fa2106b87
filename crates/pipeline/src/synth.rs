//! Speech synthesizer backends
//!
//! The synthesis engine itself is out of process: `HttpSynthesizer` talks to
//! a TTS sidecar service, `SilenceSynthesizer` produces deterministic silent
//! audio for tests and dry runs.

use async_trait::async_trait;
use serde::Serialize;
use std::io::Cursor;
use std::time::Duration;
use storycast_core::{Artifact, ArtifactKind, Error, SpeechSynthesizer, VoiceSpec};

/// Configuration for the TTS sidecar backend
#[derive(Debug, Clone)]
pub struct HttpSynthesizerConfig {
    /// Base URL of the sidecar service
    pub url: String,
    /// Request timeout; synthesis of long lines can take minutes
    pub timeout: Duration,
}

impl Default for HttpSynthesizerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8090".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice: &'a str,
    preset: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
}

/// Speech backend that posts text to a TTS sidecar and receives WAV bytes
pub struct HttpSynthesizer {
    config: HttpSynthesizerConfig,
    client: reqwest::Client,
}

impl HttpSynthesizer {
    pub fn new(config: HttpSynthesizerConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Synthesis(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn with_url(url: impl Into<String>) -> Result<Self, Error> {
        Self::new(HttpSynthesizerConfig {
            url: url.into(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceSpec) -> Result<Artifact, Error> {
        let url = format!("{}/synthesize", self.config.url.trim_end_matches('/'));
        let request = SynthesizeRequest {
            text,
            voice: &voice.voice,
            preset: voice.preset.as_str(),
            seed: voice.seed,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Synthesis(format!("synthesis request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status, body = %body, "synthesis service request failed");
            return Err(Error::Synthesis(format!(
                "synthesis service returned status {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Synthesis(format!("failed to read synthesis response: {e}")))?;
        if bytes.is_empty() {
            return Err(Error::Synthesis("synthesis service returned no audio".into()));
        }
        Ok(Artifact::new(ArtifactKind::Audio, bytes.to_vec()))
    }

    fn name(&self) -> &str {
        "http-tts"
    }
}

/// Deterministic silent-audio backend
///
/// Clip length scales with text length, so pacing and assembly behave like a
/// real run without a synthesis engine attached.
pub struct SilenceSynthesizer {
    sample_rate: u32,
    ms_per_char: u32,
}

impl SilenceSynthesizer {
    pub fn new() -> Self {
        Self {
            sample_rate: 24_000,
            ms_per_char: 60,
        }
    }
}

impl Default for SilenceSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for SilenceSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &VoiceSpec) -> Result<Artifact, Error> {
        let duration_ms = (text.chars().count() as u32 * self.ms_per_char).max(200);
        let sample_count = (self.sample_rate as u64 * duration_ms as u64 / 1000) as usize;

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| Error::Synthesis(e.to_string()))?;
            for _ in 0..sample_count {
                writer
                    .write_sample(0i16)
                    .map_err(|e| Error::Synthesis(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| Error::Synthesis(e.to_string()))?;
        }
        Ok(Artifact::new(ArtifactKind::Audio, cursor.into_inner()))
    }

    fn name(&self) -> &str {
        "silence"
    }
}

//! Core types and traits for the storycast pipeline
//!
//! This crate provides the foundational types used across all other crates:
//! - Script model (segments flattened from a story file)
//! - Emotional style tags and the style → pose lookup table
//! - Artifact types produced by the pipeline stages
//! - The `SpeechSynthesizer` trait for pluggable speech backends
//! - Error types

pub mod artifact;
pub mod error;
pub mod script;
pub mod style;
pub mod synth;

pub use artifact::{Artifact, ArtifactKind};
pub use error::{Error, Result};
pub use script::{Script, Segment};
pub use style::StyleTag;
pub use synth::{SpeechSynthesizer, SynthesisPreset, VoiceSpec};

//! Script model: flattens a story file into an ordered list of segments
//!
//! A story is an ordered collection of scenarios, each with a narration text
//! and an ordered collection of dialogue lines. Flattening interleaves
//! narration (voiced by the configured narrator) with dialogue, assigning
//! stable 0-based indices in parse order.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// One unit of the script: a narration line or a dialogue line
///
/// Immutable once created. The style is carried as the raw sentiment string
/// from the script; it resolves to a [`crate::StyleTag`] (with a Neutral
/// fallback) when the segment is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Unique, 0-based, assigned by parse order
    pub index: usize,
    /// Voice/character identifier, lower-cased
    pub speaker: String,
    /// Raw emotional style name from the script
    pub style: String,
    /// Text to synthesize
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct StoryScenario {
    scenario: String,
    #[serde(default)]
    dialogue: Vec<StoryDialogue>,
}

#[derive(Debug, Deserialize)]
struct StoryDialogue {
    character: String,
    line: String,
    sentiment: Option<String>,
}

/// An ordered sequence of segments parsed from a story file
#[derive(Debug, Clone, Default)]
pub struct Script {
    segments: Vec<Segment>,
}

impl Script {
    /// Parse a story JSON string
    ///
    /// * `narrator` - speaker used for scenario narration lines
    /// * `default_style` - style for narration and dialogue without sentiment
    pub fn from_json(json: &str, narrator: &str, default_style: &str) -> Result<Script> {
        let scenarios: Vec<StoryScenario> =
            serde_json::from_str(json).map_err(|e| Error::Script(e.to_string()))?;

        let mut segments = Vec::new();
        for scenario in scenarios {
            segments.push(Segment {
                index: segments.len(),
                speaker: narrator.to_lowercase(),
                style: default_style.to_string(),
                text: scenario.scenario,
            });
            for dialogue in scenario.dialogue {
                segments.push(Segment {
                    index: segments.len(),
                    speaker: dialogue.character.to_lowercase(),
                    style: dialogue
                        .sentiment
                        .unwrap_or_else(|| default_style.to_string()),
                    text: dialogue.line,
                });
            }
        }

        tracing::debug!(segments = segments.len(), "parsed story script");
        Ok(Script { segments })
    }

    /// Parse a story JSON file
    pub fn from_file(
        path: impl AsRef<Path>,
        narrator: &str,
        default_style: &str,
    ) -> Result<Script> {
        let json = std::fs::read_to_string(path)?;
        Script::from_json(&json, narrator, default_style)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }
}

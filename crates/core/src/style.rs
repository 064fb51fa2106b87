//! Emotional style tags and the style → pose lookup table
//!
//! The animation service accepts a closed set of emotional styles plus a
//! starting pose code. Styles map deterministically to a pose; an
//! unrecognized style is downgraded to [`StyleTag::Neutral`] with a warning,
//! never an error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed enumeration of emotional styles accepted by the animation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StyleTag {
    Agreement,
    Angry,
    Disagreement,
    Distracted,
    Flirty,
    Happy,
    Laughing,
    #[default]
    Neutral,
    Old,
    Pensive,
    Relaxed,
    Sad,
    Sarcastic,
    Scared,
    Sneaky,
    Speech,
    Still,
    Threatening,
    Tired,
}

impl StyleTag {
    /// All styles, in the order the service documents them
    pub const ALL: [StyleTag; 19] = [
        StyleTag::Agreement,
        StyleTag::Angry,
        StyleTag::Disagreement,
        StyleTag::Distracted,
        StyleTag::Flirty,
        StyleTag::Happy,
        StyleTag::Laughing,
        StyleTag::Neutral,
        StyleTag::Old,
        StyleTag::Pensive,
        StyleTag::Relaxed,
        StyleTag::Sad,
        StyleTag::Sarcastic,
        StyleTag::Scared,
        StyleTag::Sneaky,
        StyleTag::Speech,
        StyleTag::Still,
        StyleTag::Threatening,
        StyleTag::Tired,
    ];

    /// Wire name of the style as the service expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleTag::Agreement => "Agreement",
            StyleTag::Angry => "Angry",
            StyleTag::Disagreement => "Disagreement",
            StyleTag::Distracted => "Distracted",
            StyleTag::Flirty => "Flirty",
            StyleTag::Happy => "Happy",
            StyleTag::Laughing => "Laughing",
            StyleTag::Neutral => "Neutral",
            StyleTag::Old => "Old",
            StyleTag::Pensive => "Pensive",
            StyleTag::Relaxed => "Relaxed",
            StyleTag::Sad => "Sad",
            StyleTag::Sarcastic => "Sarcastic",
            StyleTag::Scared => "Scared",
            StyleTag::Sneaky => "Sneaky",
            StyleTag::Speech => "Speech",
            StyleTag::Still => "Still",
            StyleTag::Threatening => "Threatening",
            StyleTag::Tired => "Tired",
        }
    }

    /// Static style → pose lookup table
    ///
    /// Pose codes are the starting skeleton poses the motion model was
    /// trained against. High-energy styles get the open stance, subdued
    /// styles the closed one, everything else the service default.
    pub fn pose_code(&self) -> &'static str {
        match self {
            StyleTag::Angry | StyleTag::Threatening | StyleTag::Scared => "pose_0",
            StyleTag::Happy | StyleTag::Laughing | StyleTag::Flirty => "pose_1",
            StyleTag::Sad | StyleTag::Tired | StyleTag::Old => "pose_2",
            StyleTag::Pensive | StyleTag::Distracted | StyleTag::Sneaky => "pose_3",
            StyleTag::Still | StyleTag::Relaxed => "pose_4",
            StyleTag::Agreement | StyleTag::Disagreement | StyleTag::Sarcastic => "pose_5",
            StyleTag::Neutral | StyleTag::Speech => "pose_6",
        }
    }

    /// Parse a style name, case-insensitively
    pub fn from_name(name: &str) -> Option<StyleTag> {
        StyleTag::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Resolve a raw sentiment string to a style
    ///
    /// Unknown styles are downgraded to `Neutral` with a warning; a bad
    /// sentiment in the script must never fail the segment.
    pub fn resolve(name: &str) -> StyleTag {
        match StyleTag::from_name(name) {
            Some(style) => style,
            None => {
                tracing::warn!(style = %name, "unknown style, substituting Neutral");
                StyleTag::Neutral
            }
        }
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Artifact types produced by the pipeline stages

use serde::{Deserialize, Serialize};

/// Kind of artifact a pipeline stage produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Synthesized speech (WAV)
    Audio,
    /// Skeletal animation (BVH)
    Motion,
    /// 3D scene export (FBX)
    Export,
    /// Rendered video clip (MP4)
    Render,
}

impl ArtifactKind {
    /// File extension used when persisting this kind
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Audio => "wav",
            ArtifactKind::Motion => "bvh",
            ArtifactKind::Export => "fbx",
            ArtifactKind::Render => "mp4",
        }
    }

    /// MIME type used when uploading this kind to the animation service
    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Audio => "audio/wav",
            ArtifactKind::Render => "video/mp4",
            _ => "application/octet-stream",
        }
    }
}

/// Raw bytes plus a kind tag
///
/// Owned exclusively by the pipeline that produced it until handed to the
/// artifact writer or the orchestrator's merge step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Upload filename for multipart requests, e.g. `audio.wav`
    pub fn upload_name(&self) -> String {
        let stem = match self.kind {
            ArtifactKind::Audio => "audio",
            ArtifactKind::Motion => "motion",
            ArtifactKind::Export => "export",
            ArtifactKind::Render => "render",
        };
        format!("{}.{}", stem, self.kind.extension())
    }
}

//! Artifact persistence
//!
//! Pure I/O: per-segment artifacts land at `{index}_{speaker}.{ext}` and
//! combined outputs at `{output_name}.{ext}` inside the output directory.
//! Writes are plain overwrites, so re-running is idempotent.

use crate::error::PipelineError;
use std::path::{Path, PathBuf};
use storycast_core::{Artifact, ArtifactKind, Segment};

pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer rooted at `root`, creating the directory if needed
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for one segment's artifact of the given kind
    pub fn segment_path(&self, segment: &Segment, kind: ArtifactKind) -> PathBuf {
        self.root.join(format!(
            "{}_{}.{}",
            segment.index,
            segment.speaker,
            kind.extension()
        ))
    }

    /// Path for a combined output with the given stem
    pub fn combined_path(&self, name: &str, kind: ArtifactKind) -> PathBuf {
        self.root.join(format!("{}.{}", name, kind.extension()))
    }

    /// Persist one segment artifact, overwriting any previous run's file
    pub fn write_segment(
        &self,
        segment: &Segment,
        artifact: &Artifact,
    ) -> Result<PathBuf, PipelineError> {
        let path = self.segment_path(segment, artifact.kind);
        std::fs::write(&path, &artifact.bytes)?;
        tracing::debug!(path = %path.display(), bytes = artifact.len(), "artifact written");
        Ok(path)
    }

    /// Persist a combined output, overwriting any previous run's file
    pub fn write_combined(
        &self,
        name: &str,
        kind: ArtifactKind,
        bytes: &[u8],
    ) -> Result<PathBuf, PipelineError> {
        let path = self.combined_path(name, kind);
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "combined output written");
        Ok(path)
    }
}

//! Pipeline error types

use storycast_client::ClientError;
use thiserror::Error;

/// Errors captured per segment
///
/// Errors are segment-local: one segment's failure never aborts other
/// pipelines already running or not yet started.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Local speech generation failed; no remote dispatch is attempted
    #[error("speech synthesis failed for segment {index}: {message}")]
    Synthesis { index: usize, message: String },

    /// A remote submit/poll/fetch failed
    #[error(transparent)]
    Remote(#[from] ClientError),

    /// The background dispatch task was cancelled or panicked
    #[error("dispatch task for segment {index} aborted: {message}")]
    TaskAborted { index: usize, message: String },

    /// Combined-audio assembly failed
    #[error("audio assembly error: {0}")]
    Audio(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

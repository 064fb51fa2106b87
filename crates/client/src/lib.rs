//! Remote job client for the animation service
//!
//! The service accepts three kinds of asynchronous jobs (motion generation,
//! 3D export, video render), each returning an opaque job id on submission.
//! Completion is observed by polling; finished artifacts are fetched as raw
//! bytes. This crate provides:
//! - [`AnimationService`] - the trait the pipeline dispatches against
//! - [`WaspClient`] - the reqwest implementation of the wire contract
//! - [`JobHandle`], [`JobStatus`], [`ClientError`]

pub mod http;

pub use http::{WaspClient, WaspClientConfig};

use async_trait::async_trait;
use std::fmt;
use std::time::{Duration, Instant};
use storycast_core::{Artifact, ArtifactKind, StyleTag};
use thiserror::Error;

/// Opaque identifier for an in-flight asynchronous job
///
/// Has no meaning beyond being passed back to poll/fetch calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of polling a job's status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Map the Celery-style state string from the poll endpoint
    ///
    /// `SUCCESS` is done, `FAILURE`/`REVOKED` are terminal failures,
    /// everything else (`PENDING`, `STARTED`, `RETRY`, ...) is still pending.
    pub fn from_state(state: &str) -> JobStatus {
        match state {
            "SUCCESS" => JobStatus::Succeeded,
            "FAILURE" | "REVOKED" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }
}

/// Errors from the remote job client
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success HTTP status
    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body could not be interpreted
    #[error("unexpected response from {endpoint}: {detail}")]
    Decode { endpoint: String, detail: String },

    /// The job reached a terminal failure state on the service side
    #[error("job {job} failed on the animation service")]
    JobFailed { job: String },

    /// The configured completion timeout elapsed while the job was pending
    #[error("job {job} did not complete within {}s", .timeout.as_secs())]
    Timeout { job: String, timeout: Duration },
}

/// Submission parameters for a motion job
#[derive(Debug, Clone)]
pub struct MotionOptions {
    /// Deterministic seed; `None` generates a random 32-bit seed so the run
    /// is still reproducible when the seed is recorded from the logs
    pub seed: Option<u32>,
    /// Sampling temperature for the motion model
    pub temperature: f32,
    /// Pose code override; `None` uses the style's static mapping
    pub pose: Option<String>,
}

impl Default for MotionOptions {
    fn default() -> Self {
        Self {
            seed: None,
            temperature: 0.5,
            pose: None,
        }
    }
}

/// Stateless request/poll/fetch operations against the animation service
#[async_trait]
pub trait AnimationService: Send + Sync {
    /// Submit a motion-generation job for a segment's audio
    async fn submit_motion(
        &self,
        audio: &Artifact,
        style: StyleTag,
        opts: &MotionOptions,
    ) -> Result<JobHandle, ClientError>;

    /// Submit a 3D-export job for a completed motion artifact
    async fn submit_export(&self, motion: &Artifact) -> Result<JobHandle, ClientError>;

    /// Submit a render job for a completed motion artifact plus its audio
    async fn submit_render(
        &self,
        motion: &Artifact,
        audio: &Artifact,
    ) -> Result<JobHandle, ClientError>;

    /// Poll a job's status; side-effect-free
    async fn poll(&self, job: &JobHandle) -> Result<JobStatus, ClientError>;

    /// Fetch a completed job's artifact; valid only after `Succeeded`
    async fn fetch(&self, job: &JobHandle, kind: ArtifactKind) -> Result<Artifact, ClientError>;

    /// Poll at a fixed interval until the job succeeds, then fetch
    ///
    /// Blocks only the calling task. A persistent poll error is fatal for
    /// the job, not treated as still-pending. `timeout` is an optional cap
    /// on the total wait; `None` waits indefinitely.
    async fn await_completion(
        &self,
        job: &JobHandle,
        kind: ArtifactKind,
        poll_interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<Artifact, ClientError> {
        let started = Instant::now();
        loop {
            match self.poll(job).await? {
                JobStatus::Succeeded => return self.fetch(job, kind).await,
                JobStatus::Failed => {
                    return Err(ClientError::JobFailed {
                        job: job.to_string(),
                    })
                }
                JobStatus::Pending => {}
            }
            if let Some(cap) = timeout {
                if started.elapsed() >= cap {
                    return Err(ClientError::Timeout {
                        job: job.to_string(),
                        timeout: cap,
                    });
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

//! Per-segment pipeline: local synthesis plus three dependent remote jobs
//!
//! The state machine is single-writer: after `start`, only the background
//! dispatch task produces results, and all external access goes through
//! accessors that join that task first. No locks are needed.
//!
//! ```text
//! NotStarted --start()--> Running (synthesizing)
//!   synthesis error -> Failed (no remote dispatch)
//!   synthesis ok    -> Running (dispatching, background task spawned)
//!     motion error            -> Failed
//!     motion ok               -> export & render submitted concurrently
//!       export ok & render ok -> Succeeded
//!       either fails          -> Failed (artifacts already produced are kept)
//! ```

use crate::error::PipelineError;
use std::sync::Arc;
use std::time::Duration;
use storycast_client::{AnimationService, MotionOptions};
use storycast_config::RemoteConfig;
use storycast_core::{Artifact, ArtifactKind, Segment, SpeechSynthesizer, StyleTag, VoiceSpec};
use tokio::task::JoinHandle;

/// Remote-dispatch parameters for one segment
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Fixed interval between status polls
    pub poll_interval: Duration,
    /// Optional cap on each job's total wait
    pub poll_timeout: Option<Duration>,
    /// Motion sampling temperature
    pub temperature: f32,
    /// Deterministic motion seed; `None` generates one per submission
    pub seed: Option<u32>,
    /// Pose code override; `None` uses the style's static mapping
    pub pose: Option<String>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            poll_timeout: None,
            temperature: 0.5,
            seed: None,
            pose: None,
        }
    }
}

impl From<&RemoteConfig> for DispatchOptions {
    fn from(config: &RemoteConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_timeout: config.poll_timeout_secs.map(Duration::from_secs),
            temperature: config.temperature,
            seed: config.seed,
            pose: config.pose.clone(),
        }
    }
}

/// Pipeline lifecycle state; monotonic, `Failed` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

/// What the background dispatch task produced
///
/// Artifacts resolved before a failure are kept so the caller can still
/// save whatever was completed.
#[derive(Debug, Default)]
struct DispatchOutcome {
    motion: Option<Artifact>,
    export: Option<Artifact>,
    render: Option<Artifact>,
    error: Option<PipelineError>,
}

/// Drives one segment through synthesis and the three remote jobs
pub struct SegmentPipeline {
    segment: Segment,
    state: PipelineState,
    audio: Option<Artifact>,
    motion: Option<Artifact>,
    export: Option<Artifact>,
    render: Option<Artifact>,
    error: Option<PipelineError>,
    task: Option<JoinHandle<DispatchOutcome>>,
}

impl SegmentPipeline {
    pub fn new(segment: Segment) -> Self {
        Self {
            segment,
            state: PipelineState::NotStarted,
            audio: None,
            motion: None,
            export: None,
            render: None,
            error: None,
            task: None,
        }
    }

    /// Synthesize speech on the caller's execution path, then spawn the
    /// remote dispatch task and return
    ///
    /// Synthesis is deliberately not backgrounded: the orchestrator paces
    /// local accelerator work one segment at a time while remote dispatch
    /// fans out. On synthesis failure the pipeline is `Failed`, the error is
    /// returned, and no remote job is ever submitted.
    pub async fn start(
        &mut self,
        synthesizer: &dyn SpeechSynthesizer,
        service: Arc<dyn AnimationService>,
        voice: &VoiceSpec,
        opts: &DispatchOptions,
    ) -> Result<(), PipelineError> {
        let index = self.segment.index;
        self.state = PipelineState::Running;

        tracing::info!(
            segment = index,
            speaker = %self.segment.speaker,
            backend = synthesizer.name(),
            "synthesizing speech"
        );
        let audio = match synthesizer.synthesize(&self.segment.text, voice).await {
            Ok(audio) => audio,
            Err(e) => {
                let message = e.to_string();
                tracing::error!(segment = index, error = %message, "synthesis failed");
                self.state = PipelineState::Failed;
                self.error = Some(PipelineError::Synthesis {
                    index,
                    message: message.clone(),
                });
                return Err(PipelineError::Synthesis { index, message });
            }
        };
        tracing::info!(segment = index, bytes = audio.len(), "synthesis complete");

        let style = StyleTag::resolve(&self.segment.style);
        self.audio = Some(audio.clone());
        self.task = Some(tokio::spawn(dispatch(
            service,
            index,
            audio,
            style,
            opts.clone(),
        )));
        Ok(())
    }

    /// Wait for the background dispatch task and fold its outcome in
    ///
    /// Idempotent; a pipeline that failed at synthesis or was never started
    /// is left untouched.
    pub async fn join(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        let index = self.segment.index;
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => DispatchOutcome {
                error: Some(PipelineError::TaskAborted {
                    index,
                    message: e.to_string(),
                }),
                ..Default::default()
            },
        };
        self.motion = outcome.motion;
        self.export = outcome.export;
        self.render = outcome.render;
        match outcome.error {
            Some(error) => {
                tracing::error!(segment = index, error = %error, "segment failed");
                self.state = PipelineState::Failed;
                self.error = Some(error);
            }
            None => {
                tracing::info!(segment = index, "segment complete");
                self.state = PipelineState::Succeeded;
            }
        }
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    /// Audio is produced synchronously in `start`, so this never blocks
    pub fn audio(&self) -> Option<&Artifact> {
        self.audio.as_ref()
    }

    pub async fn motion(&mut self) -> Option<&Artifact> {
        self.join().await;
        self.motion.as_ref()
    }

    /// Resolved motion artifact; populated once the task has been joined
    pub fn motion_ref(&self) -> Option<&Artifact> {
        self.motion.as_ref()
    }

    /// Resolved export artifact; populated once the task has been joined
    pub fn export_ref(&self) -> Option<&Artifact> {
        self.export.as_ref()
    }

    /// Resolved render artifact; populated once the task has been joined
    pub fn render_ref(&self) -> Option<&Artifact> {
        self.render.as_ref()
    }

    pub async fn export(&mut self) -> Option<&Artifact> {
        self.join().await;
        self.export.as_ref()
    }

    pub async fn render(&mut self) -> Option<&Artifact> {
        self.join().await;
        self.render.as_ref()
    }
}

/// Background task body: motion, then export and render concurrently
///
/// Never propagates an error out of the task; failures are captured in the
/// returned outcome along with every artifact resolved before the failure.
async fn dispatch(
    service: Arc<dyn AnimationService>,
    index: usize,
    audio: Artifact,
    style: StyleTag,
    opts: DispatchOptions,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    let motion_opts = MotionOptions {
        seed: opts.seed,
        temperature: opts.temperature,
        pose: opts.pose.clone(),
    };

    let job = match service.submit_motion(&audio, style, &motion_opts).await {
        Ok(job) => job,
        Err(e) => {
            outcome.error = Some(e.into());
            return outcome;
        }
    };
    tracing::info!(segment = index, job = %job, "motion job submitted");

    let motion = match service
        .await_completion(&job, ArtifactKind::Motion, opts.poll_interval, opts.poll_timeout)
        .await
    {
        Ok(motion) => motion,
        Err(e) => {
            outcome.error = Some(e.into());
            return outcome;
        }
    };
    tracing::info!(segment = index, bytes = motion.len(), "motion complete");
    outcome.motion = Some(motion.clone());

    // Export and render both depend only on the motion artifact, not on
    // each other, so they run concurrently.
    let export_fut = async {
        let job = service.submit_export(&motion).await?;
        tracing::info!(segment = index, job = %job, "export job submitted");
        service
            .await_completion(&job, ArtifactKind::Export, opts.poll_interval, opts.poll_timeout)
            .await
    };
    let render_fut = async {
        let job = service.submit_render(&motion, &audio).await?;
        tracing::info!(segment = index, job = %job, "render job submitted");
        service
            .await_completion(&job, ArtifactKind::Render, opts.poll_interval, opts.poll_timeout)
            .await
    };
    let (export_result, render_result) = tokio::join!(export_fut, render_fut);

    match export_result {
        Ok(export) => {
            tracing::info!(segment = index, bytes = export.len(), "export complete");
            outcome.export = Some(export);
        }
        Err(e) => outcome.error = Some(e.into()),
    }
    match render_result {
        Ok(render) => {
            tracing::info!(segment = index, bytes = render.len(), "render complete");
            outcome.render = Some(render);
        }
        Err(e) => {
            if outcome.error.is_none() {
                outcome.error = Some(e.into());
            }
        }
    }
    outcome
}

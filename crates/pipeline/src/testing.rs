//! Test doubles shared across pipeline tests

use crate::orchestrator::CancelFlag;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use storycast_client::{AnimationService, ClientError, JobHandle, JobStatus, MotionOptions};
use storycast_core::{
    Artifact, ArtifactKind, Error, Segment, SpeechSynthesizer, StyleTag, VoiceSpec,
};
use tokio::sync::Barrier;

/// A one-sample 16-bit mono WAV; the sample value marks which segment the
/// clip came from so tests can verify assembly order
pub fn tiny_wav(sample: i16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 24_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        writer.write_sample(sample).unwrap();
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub fn test_segment(index: usize, style: &str, text: &str) -> Segment {
    Segment {
        index,
        speaker: "tester".to_string(),
        style: style.to_string(),
        text: text.to_string(),
    }
}

/// Synthesizer whose output sample encodes the first byte of the text;
/// fails when the text contains the configured marker
pub struct TestSynthesizer {
    pub fail_on: Option<String>,
}

impl TestSynthesizer {
    pub fn ok() -> Self {
        Self { fail_on: None }
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for TestSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &VoiceSpec) -> Result<Artifact, Error> {
        if let Some(marker) = &self.fail_on {
            if text.contains(marker.as_str()) {
                return Err(Error::Synthesis("engine refused the text".to_string()));
            }
        }
        let sample = text.bytes().next().unwrap_or(0) as i16;
        Ok(Artifact::new(ArtifactKind::Audio, tiny_wav(sample)))
    }

    fn name(&self) -> &str {
        "test"
    }
}

/// Synthesizer that flips the cancel flag while handling the nth call,
/// emulating an interrupt arriving while earlier segments are in flight
pub struct CancellingSynthesizer {
    cancel: CancelFlag,
    cancel_at: usize,
    calls: Mutex<usize>,
}

impl CancellingSynthesizer {
    pub fn new(cancel: CancelFlag, cancel_at: usize) -> Self {
        Self {
            cancel,
            cancel_at,
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for CancellingSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &VoiceSpec) -> Result<Artifact, Error> {
        let nth = {
            let mut calls = self.calls.lock().unwrap();
            let nth = *calls;
            *calls += 1;
            nth
        };
        if nth == self.cancel_at {
            self.cancel.cancel();
        }
        let sample = text.bytes().next().unwrap_or(0) as i16;
        Ok(Artifact::new(ArtifactKind::Audio, tiny_wav(sample)))
    }

    fn name(&self) -> &str {
        "cancelling"
    }
}

struct JobInfo {
    payload: Vec<u8>,
    fails: bool,
    remaining_pending: usize,
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<String, JobInfo>,
    counter: usize,
    calls: Vec<String>,
    /// Pending-poll counts handed to motion jobs in submission order;
    /// lets tests force out-of-order completion across segments
    motion_pending_plan: Vec<usize>,
    fail_motion_submit: bool,
    fail_export_job: bool,
    fail_render_job: bool,
    /// Fail the motion job of the nth motion submission (0-based)
    fail_motion_job_at: Option<usize>,
    motion_submissions: usize,
}

/// Scriptable in-memory animation service
///
/// Motion artifacts echo the submitted audio bytes, and export/render echo
/// the motion bytes, so every fetched artifact stays traceable to its
/// originating segment.
#[derive(Default)]
pub struct MockService {
    state: Mutex<Inner>,
    /// When set, `submit_export` and `submit_render` rendezvous here,
    /// proving both are in flight at the same time
    pub fanout_barrier: Option<Arc<Barrier>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_motion_submit(self) -> Self {
        self.state.lock().unwrap().fail_motion_submit = true;
        self
    }

    pub fn fail_export_job(self) -> Self {
        self.state.lock().unwrap().fail_export_job = true;
        self
    }

    pub fn fail_render_job(self) -> Self {
        self.state.lock().unwrap().fail_render_job = true;
        self
    }

    pub fn fail_motion_job_at(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_motion_job_at = Some(n);
        self
    }

    pub fn with_motion_pending_plan(self, plan: Vec<usize>) -> Self {
        self.state.lock().unwrap().motion_pending_plan = plan;
        self
    }

    pub fn with_fanout_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.fanout_barrier = Some(barrier);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn insert_job(inner: &mut Inner, payload: Vec<u8>, fails: bool, pending: usize) -> JobHandle {
        let id = format!("job-{}", inner.counter);
        inner.counter += 1;
        inner.jobs.insert(
            id.clone(),
            JobInfo {
                payload,
                fails,
                remaining_pending: pending,
            },
        );
        JobHandle::new(id)
    }
}

#[async_trait]
impl AnimationService for MockService {
    async fn submit_motion(
        &self,
        audio: &Artifact,
        style: StyleTag,
        _opts: &MotionOptions,
    ) -> Result<JobHandle, ClientError> {
        let mut inner = self.state.lock().unwrap();
        inner.calls.push(format!("motion:{}", style.as_str()));
        if inner.fail_motion_submit {
            return Err(ClientError::Status {
                endpoint: "/generate_bvh/".to_string(),
                status: 500,
                body: "mock refused".to_string(),
            });
        }
        let nth = inner.motion_submissions;
        inner.motion_submissions += 1;
        let fails = inner.fail_motion_job_at == Some(nth);
        let pending = if inner.motion_pending_plan.is_empty() {
            0
        } else {
            inner.motion_pending_plan.remove(0)
        };
        Ok(Self::insert_job(
            &mut inner,
            audio.bytes.clone(),
            fails,
            pending,
        ))
    }

    async fn submit_export(&self, motion: &Artifact) -> Result<JobHandle, ClientError> {
        if let Some(barrier) = self.fanout_barrier.clone() {
            barrier.wait().await;
        }
        let mut inner = self.state.lock().unwrap();
        inner.calls.push("export".to_string());
        let fails = inner.fail_export_job;
        Ok(Self::insert_job(&mut inner, motion.bytes.clone(), fails, 0))
    }

    async fn submit_render(
        &self,
        motion: &Artifact,
        _audio: &Artifact,
    ) -> Result<JobHandle, ClientError> {
        if let Some(barrier) = self.fanout_barrier.clone() {
            barrier.wait().await;
        }
        let mut inner = self.state.lock().unwrap();
        inner.calls.push("render".to_string());
        let fails = inner.fail_render_job;
        Ok(Self::insert_job(&mut inner, motion.bytes.clone(), fails, 0))
    }

    async fn poll(&self, job: &JobHandle) -> Result<JobStatus, ClientError> {
        let mut inner = self.state.lock().unwrap();
        let info = inner
            .jobs
            .get_mut(job.as_str())
            .ok_or_else(|| ClientError::Status {
                endpoint: format!("/job_id/{job}/"),
                status: 404,
                body: "unknown job".to_string(),
            })?;
        if info.remaining_pending > 0 {
            info.remaining_pending -= 1;
            return Ok(JobStatus::Pending);
        }
        if info.fails {
            return Ok(JobStatus::Failed);
        }
        Ok(JobStatus::Succeeded)
    }

    async fn fetch(&self, job: &JobHandle, kind: ArtifactKind) -> Result<Artifact, ClientError> {
        let inner = self.state.lock().unwrap();
        let info = inner
            .jobs
            .get(job.as_str())
            .ok_or_else(|| ClientError::Status {
                endpoint: format!("/get_files/{job}/"),
                status: 404,
                body: "unknown job".to_string(),
            })?;
        Ok(Artifact::new(kind, info.payload.clone()))
    }
}

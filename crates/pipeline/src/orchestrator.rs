//! Run orchestrator
//!
//! Starts one [`SegmentPipeline`] per script segment in index order, paced
//! by a fixed delay so local synthesis stays sequential while remote
//! dispatch fans out, then joins every pipeline and assembles the combined
//! audio and video timelines in original script order. Total remote time is
//! bounded by the slowest remaining job, not the sum of all jobs.

use crate::error::PipelineError;
use crate::timeline;
use crate::worker::{DispatchOptions, PipelineState, SegmentPipeline};
use crate::writer::ArtifactWriter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storycast_client::AnimationService;
use storycast_config::Settings;
use storycast_core::{ArtifactKind, Script, SpeechSynthesizer, SynthesisPreset, VoiceSpec};
use uuid::Uuid;

/// Cooperative cancellation flag
///
/// Checked only at segment-start boundaries, never mid-flight; once set, the
/// orchestrator starts no new pipelines and drains every background task
/// before returning, so no dangling remote work goes unaccounted.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one segment, for the run summary
#[derive(Debug, Clone, Serialize)]
pub struct SegmentReport {
    pub index: usize,
    pub speaker: String,
    pub succeeded: bool,
    /// Error display string when the segment failed
    pub error: Option<String>,
}

/// Aggregate result of a run
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
    pub segments: Vec<SegmentReport>,
    pub combined_audio: Option<PathBuf>,
    pub combined_video: Option<PathBuf>,
}

impl RunReport {
    pub fn failed_indices(&self) -> Vec<usize> {
        self.segments
            .iter()
            .filter(|s| !s.succeeded)
            .map(|s| s.index)
            .collect()
    }

    pub fn all_failed(&self) -> bool {
        !self.segments.is_empty() && self.segments.iter().all(|s| !s.succeeded)
    }
}

/// Drives a whole script through per-segment pipelines
pub struct Orchestrator {
    settings: Settings,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    service: Arc<dyn AnimationService>,
    cancel: CancelFlag,
}

impl Orchestrator {
    pub fn new(
        settings: Settings,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        service: Arc<dyn AnimationService>,
    ) -> Self {
        Self {
            settings,
            synthesizer,
            service,
            cancel: CancelFlag::new(),
        }
    }

    /// Use an externally controlled cancellation flag (e.g. wired to ctrl-c)
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run the whole script and write per-segment plus combined outputs
    ///
    /// Errors are segment-local: a failed segment is reported and skipped in
    /// the combined video (its audio still contributes if synthesis
    /// succeeded), and the run always writes whatever is producible.
    pub async fn run(&self, script: &Script) -> Result<RunReport, PipelineError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let writer = ArtifactWriter::new(&self.settings.run.output_dir)?;
        let opts = DispatchOptions::from(&self.settings.remote);
        let preset = SynthesisPreset::resolve(&self.settings.synthesis.preset);
        let pacing = Duration::from_millis(self.settings.run.pacing_delay_ms);

        tracing::info!(
            %run_id,
            segments = script.len(),
            output_dir = %self.settings.run.output_dir,
            backend = self.synthesizer.name(),
            "starting run"
        );

        // Phase 1: start pipelines in index order. Synthesis runs here, one
        // segment at a time; remote dispatch continues in the background
        // while later segments are still being paced.
        let mut pipelines: Vec<SegmentPipeline> = Vec::with_capacity(script.len());
        let mut cancelled = false;
        for segment in script.iter() {
            if self.cancel.is_cancelled() {
                tracing::warn!(
                    %run_id,
                    started = pipelines.len(),
                    remaining = script.len() - pipelines.len(),
                    "cancellation requested, draining started pipelines"
                );
                cancelled = true;
                break;
            }

            let voice = VoiceSpec::new(segment.speaker.clone()).with_preset(preset);
            let mut pipeline = SegmentPipeline::new(segment.clone());
            if let Err(e) = pipeline
                .start(self.synthesizer.as_ref(), self.service.clone(), &voice, &opts)
                .await
            {
                // Captured in the pipeline; the run continues with the rest.
                tracing::error!(segment = segment.index, error = %e, "segment start failed");
            }
            let is_last = pipeline.segment().index + 1 == script.len();
            pipelines.push(pipeline);

            if !is_last {
                tokio::time::sleep(pacing).await;
            }
        }

        // Phase 2: global barrier, in index order.
        for pipeline in pipelines.iter_mut() {
            pipeline.join().await;
        }

        // Phase 3: persist per-segment artifacts. Every pipeline is joined
        // by now, so the resolved views are final.
        for pipeline in &pipelines {
            let segment = pipeline.segment();
            let artifacts = [
                pipeline.audio(),
                pipeline.motion_ref(),
                pipeline.export_ref(),
                pipeline.render_ref(),
            ];
            for artifact in artifacts.into_iter().flatten() {
                writer.write_segment(segment, artifact)?;
            }
        }

        // Phase 4: combined audio, every synthesized clip in index order.
        let audio_clips = pipelines.iter().filter_map(|p| p.audio());
        let combined_audio = match timeline::combine_audio(audio_clips)? {
            Some(bytes) => Some(writer.write_combined(
                &self.settings.run.output_name,
                ArtifactKind::Audio,
                &bytes,
            )?),
            None => {
                tracing::warn!(%run_id, "no audio produced, skipping combined audio");
                None
            }
        };

        // Phase 5: combined video, successful segments only, index order.
        let render_clips = pipelines
            .iter()
            .filter(|p| p.state() == PipelineState::Succeeded)
            .filter_map(|p| p.render_ref());
        let combined_video = match timeline::combine_video(render_clips) {
            Some(bytes) => Some(writer.write_combined(
                &self.settings.run.output_name,
                ArtifactKind::Render,
                &bytes,
            )?),
            None => {
                tracing::warn!(%run_id, "no renders succeeded, skipping combined video");
                None
            }
        };

        let segments: Vec<SegmentReport> = pipelines
            .iter()
            .map(|p| SegmentReport {
                index: p.segment().index,
                speaker: p.segment().speaker.clone(),
                succeeded: p.state() == PipelineState::Succeeded,
                error: p.error().map(|e| e.to_string()),
            })
            .collect();

        let failed = segments.iter().filter(|s| !s.succeeded).count();
        tracing::info!(
            %run_id,
            total = segments.len(),
            succeeded = segments.len() - failed,
            failed,
            cancelled,
            "run finished"
        );

        Ok(RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            cancelled,
            segments,
            combined_audio,
            combined_video,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tiny_wav, CancellingSynthesizer, MockService, TestSynthesizer};
    use std::io::Cursor;
    use storycast_config::{RemoteConfig, RunConfig};

    // Three segments: "alpha" (narrator), "bravo" (bob), "charlie" (eve).
    // Each synthesized clip carries one sample equal to the text's first
    // byte, so assembly order is observable in the combined outputs.
    const STORY: &str = r#"[{
        "scenario": "alpha",
        "dialogue": [
            {"character": "Bob", "line": "bravo", "sentiment": "Happy"},
            {"character": "Eve", "line": "charlie"}
        ]
    }]"#;

    fn test_script() -> Script {
        Script::from_json(STORY, "freeman", "Neutral").unwrap()
    }

    fn test_settings(dir: &std::path::Path) -> Settings {
        Settings {
            remote: RemoteConfig {
                poll_interval_ms: 1,
                ..Default::default()
            },
            run: RunConfig {
                output_dir: dir.to_string_lossy().into_owned(),
                output_name: "story".to_string(),
                pacing_delay_ms: 0,
            },
            ..Default::default()
        }
    }

    fn decode_samples(bytes: &[u8]) -> Vec<i16> {
        hound::WavReader::new(Cursor::new(bytes))
            .unwrap()
            .samples::<i16>()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[tokio::test]
    async fn test_merge_order_is_invariant_to_completion_order() {
        let dir = tempfile::tempdir().unwrap();
        // Segment 0 finishes last, segment 2 first.
        let service = Arc::new(MockService::new().with_motion_pending_plan(vec![30, 15, 0]));
        let orchestrator = Orchestrator::new(
            test_settings(dir.path()),
            Arc::new(TestSynthesizer::ok()),
            service,
        );

        let report = orchestrator.run(&test_script()).await.unwrap();
        assert!(report.failed_indices().is_empty());
        assert!(!report.cancelled);

        let audio = std::fs::read(report.combined_audio.unwrap()).unwrap();
        assert_eq!(decode_samples(&audio), vec![b'a' as i16, b'b' as i16, b'c' as i16]);

        let video = std::fs::read(report.combined_video.unwrap()).unwrap();
        let expected: Vec<u8> = [b'a', b'b', b'c']
            .into_iter()
            .flat_map(|m| tiny_wav(m as i16))
            .collect();
        assert_eq!(video, expected);
    }

    #[tokio::test]
    async fn test_failed_segment_is_skipped_in_video_but_kept_in_audio() {
        let dir = tempfile::tempdir().unwrap();
        // The second motion submission (segment 1) fails on the service.
        let service = Arc::new(MockService::new().fail_motion_job_at(1));
        let orchestrator = Orchestrator::new(
            test_settings(dir.path()),
            Arc::new(TestSynthesizer::ok()),
            service,
        );

        let report = orchestrator.run(&test_script()).await.unwrap();
        assert_eq!(report.failed_indices(), vec![1]);
        assert!(report.segments[1].error.is_some());

        // all three synthesized clips are in the combined audio, in order
        let audio = std::fs::read(report.combined_audio.unwrap()).unwrap();
        assert_eq!(decode_samples(&audio), vec![b'a' as i16, b'b' as i16, b'c' as i16]);

        // only segments 0 and 2 contribute to the combined video, in order
        let video = std::fs::read(report.combined_video.unwrap()).unwrap();
        let expected: Vec<u8> = [b'a', b'c']
            .into_iter()
            .flat_map(|m| tiny_wav(m as i16))
            .collect();
        assert_eq!(video, expected);

        // the failed segment's audio is still individually retrievable
        assert!(dir.path().join("1_bob.wav").exists());
        assert!(!dir.path().join("1_bob.mp4").exists());
    }

    #[tokio::test]
    async fn test_cancellation_mid_run_drains_started_segments() {
        let dir = tempfile::tempdir().unwrap();
        // Segment 0's motion job stays pending for several polls, so its
        // background task is still in flight when the flag is set during
        // segment 1's synthesis.
        let service = Arc::new(MockService::new().with_motion_pending_plan(vec![5, 0]));
        let cancel = CancelFlag::new();
        let orchestrator = Orchestrator::new(
            test_settings(dir.path()),
            Arc::new(CancellingSynthesizer::new(cancel.clone(), 1)),
            service,
        )
        .with_cancel_flag(cancel);

        let report = orchestrator.run(&test_script()).await.unwrap();
        assert!(report.cancelled);
        // the third segment never started
        assert_eq!(report.segments.len(), 2);
        assert!(report.failed_indices().is_empty());

        // in-flight work was joined and persisted, not abandoned
        let audio = std::fs::read(report.combined_audio.unwrap()).unwrap();
        assert_eq!(decode_samples(&audio), vec![b'a' as i16, b'b' as i16]);
        let video = std::fs::read(report.combined_video.unwrap()).unwrap();
        let expected: Vec<u8> = [b'a', b'b']
            .into_iter()
            .flat_map(|m| tiny_wav(m as i16))
            .collect();
        assert_eq!(video, expected);
        assert!(dir.path().join("0_freeman.mp4").exists());
        assert!(!dir.path().join("2_eve.wav").exists());
    }

    #[tokio::test]
    async fn test_cancellation_before_start_drains_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockService::new());
        let orchestrator = Orchestrator::new(
            test_settings(dir.path()),
            Arc::new(TestSynthesizer::ok()),
            service.clone(),
        );
        orchestrator.cancel_flag().cancel();

        let report = orchestrator.run(&test_script()).await.unwrap();
        assert!(report.cancelled);
        assert!(report.segments.is_empty());
        assert!(report.combined_audio.is_none());
        assert!(report.combined_video.is_none());
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_all_synthesis_failures_still_complete_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockService::new());
        let orchestrator = Orchestrator::new(
            test_settings(dir.path()),
            // every text contains the empty marker, so every segment fails
            Arc::new(TestSynthesizer::failing_on("")),
            service.clone(),
        );

        let report = orchestrator.run(&test_script()).await.unwrap();
        assert!(report.all_failed());
        assert_eq!(report.failed_indices(), vec![0, 1, 2]);
        assert!(report.combined_audio.is_none());
        assert!(report.combined_video.is_none());
        assert!(service.calls().is_empty());
    }
}

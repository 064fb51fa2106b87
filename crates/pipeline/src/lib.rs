//! Per-segment job pipeline and run orchestrator
//!
//! Each script segment is driven through local speech synthesis and three
//! dependent remote jobs (motion → export & render) by its own
//! [`SegmentPipeline`]; the [`Orchestrator`] starts one pipeline per segment
//! in script order, lets the remote dispatch run concurrently across
//! segments, and merges the finished artifacts back into index order.

pub mod error;
pub mod orchestrator;
pub mod synth;
pub mod timeline;
pub mod worker;
pub mod writer;

pub use error::PipelineError;
pub use orchestrator::{CancelFlag, Orchestrator, RunReport, SegmentReport};
pub use synth::{HttpSynthesizer, HttpSynthesizerConfig, SilenceSynthesizer};
pub use worker::{DispatchOptions, PipelineState, SegmentPipeline};
pub use writer::ArtifactWriter;

#[cfg(test)]
pub(crate) mod testing;

pub mod consensus;
pub mod context;
pub mod domain;
pub mod orchestration;
pub mod sampling;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use consensus::ConsensusAggregator;
pub use domain::{AnalysisResult, ConsensusResult, FrameOutcome};
pub use orchestration::{FrameAnalyzer, PipelineReport, ProcessingPipeline, ProgressEvent};
pub use sampling::{FrameSampler, MediaSource, SampleRequest};

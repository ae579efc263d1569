pub mod common;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use common::{CaptureStatus, Frame};
pub use config::{Configuration, ConfigurationBuilder};
pub use error::{AnalysisError, AppError, CaptureError};
pub use logging::init_logging;
pub use pipeline::{
    AnalysisResult, ConsensusAggregator, ConsensusResult, FrameAnalyzer, FrameOutcome,
    FrameSampler, MediaSource, PipelineReport, ProcessingPipeline, ProgressEvent, SampleRequest,
};

pub mod analyzer;
pub mod driver;
pub mod processing_pipeline;
pub mod service;

pub use analyzer::FrameAnalyzer;
pub use driver::{AnalysisDriver, ProgressEvent};
pub use processing_pipeline::{PipelineReport, ProcessingPipeline, ProcessingPipelineBuilder};

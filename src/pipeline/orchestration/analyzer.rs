use async_trait::async_trait;

use crate::common::Frame;
use crate::error::AnalysisError;
use crate::pipeline::domain::AnalysisResult;

/// The image-understanding collaborator: one still in, one analysis out.
#[async_trait]
pub trait FrameAnalyzer: Send + Sync {
    async fn analyze(&self, frame: &Frame) -> Result<AnalysisResult, AnalysisError>;
    fn name(&self) -> &'static str;
}

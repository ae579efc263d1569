use crate::common::Frame;
use crate::error::AnalysisError;
use crate::pipeline::context::FrameMetrics;

use super::AnalysisResult;

pub const ANALYZING: &str = "analyzing...";
pub const CAPTURE_FAILED: &str = "frame capture failed";

/// A frame paired with what the analysis service made of it.
///
/// At most one of `result` and `error` is set. Both are empty only when the
/// capture failed and the placeholder was not sent for analysis.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    frame: Frame,
    result: Option<AnalysisResult>,
    error: Option<AnalysisError>,
    metrics: FrameMetrics,
}

impl FrameOutcome {
    pub fn analyzed(frame: Frame, result: AnalysisResult, metrics: FrameMetrics) -> Self {
        Self {
            frame,
            result: Some(result),
            error: None,
            metrics,
        }
    }

    pub fn rejected(frame: Frame, error: AnalysisError, metrics: FrameMetrics) -> Self {
        Self {
            frame,
            result: None,
            error: Some(error),
            metrics,
        }
    }

    pub fn skipped(frame: Frame) -> Self {
        Self {
            frame,
            result: None,
            error: None,
            metrics: FrameMetrics::new(),
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        self.error.as_ref()
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    /// One line for progress displays.
    pub fn description(&self) -> String {
        match (&self.result, &self.error) {
            (Some(result), _) => result
                .summary
                .text()
                .map(str::to_string)
                .unwrap_or_else(|| "analysis complete".to_string()),
            (None, Some(error)) => format!("analysis error: {error}"),
            (None, None) => CAPTURE_FAILED.to_string(),
        }
    }
}

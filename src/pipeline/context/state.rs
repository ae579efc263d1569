use crate::error::AnalysisError;
use crate::pipeline::domain::AnalysisResult;

// Markers to track where a frame is in the driver
pub struct CapturedState;
pub struct AnalyzedState {
    pub(super) result: AnalysisResult,
}
pub struct RejectedState {
    pub(super) error: AnalysisError,
}
pub struct SkippedState;

pub trait ProcessingState: 'static {
    fn state_name() -> &'static str;
}

impl ProcessingState for CapturedState {
    fn state_name() -> &'static str {
        "Captured"
    }
}

impl ProcessingState for AnalyzedState {
    fn state_name() -> &'static str {
        "Analyzed"
    }
}

impl ProcessingState for RejectedState {
    fn state_name() -> &'static str {
        "Rejected"
    }
}

impl ProcessingState for SkippedState {
    fn state_name() -> &'static str {
        "Skipped"
    }
}

use crate::common::Frame;
use crate::error::AnalysisError;
use crate::pipeline::context::metrics::FrameMetrics;
use crate::pipeline::context::state::{
    AnalyzedState, CapturedState, ProcessingState, RejectedState, SkippedState,
};
use crate::pipeline::domain::{AnalysisResult, FrameOutcome};
use std::time::{Duration, Instant};

// FrameContext with compile-time tracking of the driver stage via the state parameter
pub struct FrameContext<S> {
    index: usize,
    frame: Frame,
    metrics: FrameMetrics,
    processing_start: Instant,
    state: S,
}

impl<S: ProcessingState> FrameContext<S> {
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    pub fn elapsed(&self) -> Duration {
        self.processing_start.elapsed()
    }

    pub fn stage(&self) -> &'static str {
        S::state_name()
    }

    fn into_state<T>(self, state: T) -> FrameContext<T> {
        FrameContext {
            index: self.index,
            frame: self.frame,
            metrics: self.metrics,
            processing_start: self.processing_start,
            state,
        }
    }
}

impl FrameContext<CapturedState> {
    pub fn new(index: usize, frame: Frame) -> Self {
        Self {
            index,
            frame,
            metrics: FrameMetrics::new(),
            processing_start: Instant::now(),
            state: CapturedState,
        }
    }

    pub fn into_analyzed(mut self, result: AnalysisResult) -> FrameContext<AnalyzedState> {
        self.metrics.record_analysis_duration(self.elapsed());
        self.into_state(AnalyzedState { result })
    }

    pub fn into_rejected(mut self, error: AnalysisError) -> FrameContext<RejectedState> {
        self.metrics.record_analysis_duration(self.elapsed());
        self.into_state(RejectedState { error })
    }

    pub fn into_skipped(self) -> FrameContext<SkippedState> {
        self.into_state(SkippedState)
    }
}

impl FrameContext<AnalyzedState> {
    pub fn result(&self) -> &AnalysisResult {
        &self.state.result
    }

    pub fn into_outcome(self) -> FrameOutcome {
        FrameOutcome::analyzed(self.frame, self.state.result, self.metrics)
    }
}

impl FrameContext<RejectedState> {
    pub fn error(&self) -> &AnalysisError {
        &self.state.error
    }

    pub fn into_outcome(self) -> FrameOutcome {
        FrameOutcome::rejected(self.frame, self.state.error, self.metrics)
    }
}

impl FrameContext<SkippedState> {
    pub fn into_outcome(self) -> FrameOutcome {
        FrameOutcome::skipped(self.frame)
    }
}

use std::time::Duration;

/// Metrics collected while a frame moves through the driver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameMetrics {
    analysis_duration: Option<Duration>,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self {
            analysis_duration: None,
        }
    }

    pub fn record_analysis_duration(&mut self, duration: Duration) {
        self.analysis_duration = Some(duration);
    }

    pub fn analysis_duration(&self) -> Option<Duration> {
        self.analysis_duration
    }
}

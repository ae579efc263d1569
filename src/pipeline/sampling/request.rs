use crate::config::SamplingSettings;
use crate::error::AppError;

/// How many stills to take and which slice of the video they cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRequest {
    count: usize,
    coverage_start: f64,
    coverage_end: f64,
}

impl SampleRequest {
    pub fn new(count: usize, coverage_start: f64, coverage_end: f64) -> Result<Self, AppError> {
        if count < 2 {
            return Err(AppError::InvalidRequest(format!(
                "at least 2 frames are needed, got {count}"
            )));
        }
        let in_range = coverage_start >= 0.0 && coverage_end <= 1.0;
        if !(in_range && coverage_start < coverage_end) {
            return Err(AppError::InvalidRequest(format!(
                "coverage {coverage_start}..{coverage_end} must satisfy 0 <= start < end <= 1"
            )));
        }
        Ok(Self {
            count,
            coverage_start,
            coverage_end,
        })
    }

    pub fn from_settings(settings: &SamplingSettings) -> Result<Self, AppError> {
        Self::new(
            settings.frame_count,
            settings.coverage_start,
            settings.coverage_end,
        )
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn coverage_start(&self) -> f64 {
        self.coverage_start
    }

    pub fn coverage_end(&self) -> f64 {
        self.coverage_end
    }

    /// Evenly spaced sample times across the covered slice, first to last inclusive.
    pub fn timestamps(&self, duration: f64) -> Vec<f64> {
        let first = self.coverage_start * duration;
        let last = self.coverage_end * duration;
        let interval = (self.coverage_end - self.coverage_start) * duration / (self.count - 1) as f64;
        (0..self.count)
            .map(|i| (first + i as f64 * interval).min(last))
            .collect()
    }
}

impl Default for SampleRequest {
    fn default() -> Self {
        Self {
            count: 3,
            coverage_start: 0.1,
            coverage_end: 0.9,
        }
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::AppError;

const ENV_PREFIX: &str = "GFA";
const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub sampling: SamplingSettings,
    pub analysis: AnalysisSettings,
    pub consensus: ConsensusSettings,
    pub logging: LoggingSettings,
}

/// Frame sampling and seek handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    pub frame_count: usize,
    pub coverage_start: f64,
    pub coverage_end: f64,
    /// Assumed length when the video reports no usable duration.
    pub default_duration_secs: f64,
    pub seek_epsilon_secs: f64,
    pub max_seek_attempts: u32,
    pub retry_backoff_ms: u64,
    pub frame_timeout_ms: u64,
    pub ready_timeout_ms: u64,
    pub fallback_width: u32,
    pub fallback_height: u32,
    pub jpeg_quality: u8,
    pub max_video_duration_secs: f64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            frame_count: 3,
            coverage_start: 0.1,
            coverage_end: 0.9,
            default_duration_secs: 60.0,
            seek_epsilon_secs: 0.1,
            max_seek_attempts: 3,
            retry_backoff_ms: 500,
            frame_timeout_ms: 8_000,
            ready_timeout_ms: 5_000,
            fallback_width: 640,
            fallback_height: 360,
            jpeg_quality: 80,
            max_video_duration_secs: 90.0,
        }
    }
}

impl SamplingSettings {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

/// Vision service access and driver behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub request_size_limit_bytes: usize,
    /// Unset means the call's own lifetime bounds it.
    pub timeout_secs: Option<u64>,
    pub analyze_failed_captures: bool,
    pub progress_buffer: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            temperature: 0.1,
            request_size_limit_bytes: 10 * 1024 * 1024,
            timeout_secs: None,
            analyze_failed_captures: true,
            progress_buffer: 32,
        }
    }
}

impl AnalysisSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusSettings {
    pub max_tags: usize,
}

impl Default for ConsensusSettings {
    fn default() -> Self {
        Self { max_tags: 7 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Configuration {
    /// Defaults, then the optional file, then `GFA__SECTION__KEY` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut configuration: Configuration = builder.build()?.try_deserialize()?;
        if configuration.analysis.api_key.is_none() {
            configuration.analysis.api_key = std::env::var(API_KEY_VAR).ok();
        }
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let sampling = &self.sampling;
        if sampling.frame_count < 2 {
            return Err(invalid("sampling.frame_count must be at least 2"));
        }
        if !(0.0..=1.0).contains(&sampling.coverage_start)
            || !(0.0..=1.0).contains(&sampling.coverage_end)
            || sampling.coverage_start >= sampling.coverage_end
        {
            return Err(invalid(
                "sampling coverage must satisfy 0 <= coverage_start < coverage_end <= 1",
            ));
        }
        if sampling.max_seek_attempts == 0 {
            return Err(invalid("sampling.max_seek_attempts must be at least 1"));
        }
        if sampling.jpeg_quality == 0 || sampling.jpeg_quality > 100 {
            return Err(invalid("sampling.jpeg_quality must be within 1..=100"));
        }
        if sampling.default_duration_secs <= 0.0 {
            return Err(invalid("sampling.default_duration_secs must be positive"));
        }
        if self.analysis.progress_buffer == 0 {
            return Err(invalid("analysis.progress_buffer must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(ConfigError::Message(message.to_string()))
}

pub struct ConfigurationBuilder {
    configuration: Configuration,
}

impl ConfigurationBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self { configuration }
    }

    // Sets how many frames are sampled from a video, this will override the default configuration.
    pub fn frame_count(mut self, frame_count: usize) -> Self {
        self.configuration.sampling.frame_count = frame_count;
        self
    }

    // Sets the fraction of the video the samples are spread over.
    pub fn coverage(mut self, start: f64, end: f64) -> Self {
        self.configuration.sampling.coverage_start = start;
        self.configuration.sampling.coverage_end = end;
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.configuration.analysis.api_key = Some(api_key.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.configuration.analysis.endpoint = endpoint.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.configuration.analysis.model = model.into();
        self
    }

    pub fn analysis_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.configuration.analysis.timeout_secs = timeout_secs;
        self
    }

    pub fn analyze_failed_captures(mut self, enabled: bool) -> Self {
        self.configuration.analysis.analyze_failed_captures = enabled;
        self
    }

    pub fn max_tags(mut self, max_tags: usize) -> Self {
        self.configuration.consensus.max_tags = max_tags;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.configuration.logging.level = level.into();
        self
    }

    pub fn build(self) -> Result<Configuration, AppError> {
        self.configuration.validate()?;
        Ok(self.configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_capture_policy() {
        let configuration = Configuration::default();
        assert_eq!(configuration.sampling.frame_count, 3);
        assert_eq!(configuration.sampling.max_seek_attempts, 3);
        assert_eq!(configuration.sampling.retry_backoff(), Duration::from_millis(500));
        assert_eq!(configuration.sampling.frame_timeout(), Duration::from_secs(8));
        assert_eq!(configuration.consensus.max_tags, 7);
        assert!(configuration.analysis.timeout().is_none());
        assert!(configuration.validate().is_ok());
    }

    #[test]
    fn builder_rejects_inverted_coverage() {
        let result = ConfigurationBuilder::new(Configuration::default())
            .coverage(0.8, 0.2)
            .build();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn builder_rejects_single_frame() {
        let result = ConfigurationBuilder::new(Configuration::default())
            .frame_count(1)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_overrides_defaults() {
        let configuration = ConfigurationBuilder::new(Configuration::default())
            .frame_count(5)
            .model("gpt-4o-mini")
            .analysis_timeout(Some(30))
            .max_tags(3)
            .build()
            .unwrap();
        assert_eq!(configuration.sampling.frame_count, 5);
        assert_eq!(configuration.analysis.model, "gpt-4o-mini");
        assert_eq!(configuration.analysis.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(configuration.consensus.max_tags, 3);
    }

    #[test]
    fn load_merges_file_over_defaults() {
        let dir = std::env::temp_dir().join(format!("gfa-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("analyzer.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[sampling]\nframe_count = 5\n\n[consensus]\nmax_tags = 4").unwrap();

        let configuration = Configuration::load(Some(&path)).unwrap();
        assert_eq!(configuration.sampling.frame_count, 5);
        assert_eq!(configuration.sampling.coverage_start, 0.1);
        assert_eq!(configuration.consensus.max_tags, 4);
        assert_eq!(configuration.analysis.model, "gpt-4o");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

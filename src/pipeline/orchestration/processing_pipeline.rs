use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::common::Frame;
use crate::config::Configuration;
use crate::error::AppError;
use crate::pipeline::consensus::ConsensusAggregator;
use crate::pipeline::domain::{ConsensusResult, FrameOutcome};
use crate::pipeline::orchestration::analyzer::FrameAnalyzer;
use crate::pipeline::orchestration::driver::{AnalysisDriver, ProgressEvent};
use crate::pipeline::sampling::{known_duration, FrameSampler, MediaSource, SampleRequest};
use crate::pipeline::services::OpenAiVisionAnalyzer;

/// Sample, analyze, aggregate. One run at a time.
pub struct ProcessingPipeline {
    sampler: FrameSampler,
    request: SampleRequest,
    driver: AnalysisDriver,
    aggregator: ConsensusAggregator,
    max_video_duration: f64,
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    run_id: Uuid,
    outcomes: Vec<FrameOutcome>,
    consensus: Option<ConsensusResult>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl PipelineReport {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn outcomes(&self) -> &[FrameOutcome] {
        &self.outcomes
    }

    pub fn analyzed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result().is_some()).count()
    }

    /// The consensus, or `InsufficientData` when some frame has no analysis.
    pub fn consensus(&self) -> Result<&ConsensusResult, AppError> {
        self.consensus
            .as_ref()
            .ok_or(AppError::InsufficientData {
                analyzed: self.analyzed_count(),
                total: self.outcomes.len(),
            })
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }
}

impl ProcessingPipeline {
    pub fn builder(configuration: Configuration) -> ProcessingPipelineBuilder {
        ProcessingPipelineBuilder::new(configuration)
    }

    /// A pipeline analyzing frames with the configured vision service.
    pub fn from_configuration(configuration: Configuration) -> Result<Self, AppError> {
        let analyzer = OpenAiVisionAnalyzer::new(&configuration.analysis)?;
        Self::builder(configuration)
            .analyzer(Arc::new(analyzer))
            .build()
    }

    pub async fn analyze_video<S: MediaSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<PipelineReport, AppError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!("Run {}: analyzing video", run_id);

        self.check_length(source)?;
        self.sampler.prepare(source).await;
        // Metadata may only have arrived while waiting.
        self.check_length(source)?;

        let frames: Vec<Frame> = self.sampler.sample(source, &self.request).collect().await;
        let failed = frames.iter().filter(|f| f.is_failed()).count();
        if failed > 0 {
            tracing::warn!(
                "Run {}: {} of {} captures fell back to placeholders",
                run_id,
                failed,
                frames.len()
            );
        }
        Ok(self.finish(run_id, started_at, frames).await)
    }

    fn check_length<S: MediaSource + ?Sized>(&self, source: &S) -> Result<(), AppError> {
        match known_duration(source.duration()) {
            Some(duration) if duration > self.max_video_duration => Err(AppError::VideoTooLong {
                duration,
                max: self.max_video_duration,
            }),
            _ => Ok(()),
        }
    }

    /// Runs the same analysis over hand-picked stills.
    pub async fn analyze_images(&mut self, images: Vec<Bytes>) -> Result<PipelineReport, AppError> {
        if images.is_empty() {
            return Err(AppError::NoFrames);
        }
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!("Run {}: analyzing {} images", run_id, images.len());

        let frames = images
            .into_iter()
            .map(Frame::from_still)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.finish(run_id, started_at, frames).await)
    }

    async fn finish(
        &mut self,
        run_id: Uuid,
        started_at: DateTime<Utc>,
        frames: Vec<Frame>,
    ) -> PipelineReport {
        let outcomes = self.driver.drive(frames).await;
        let consensus = self.aggregator.aggregate(&outcomes);
        let report = PipelineReport {
            run_id,
            outcomes,
            consensus,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            "Run {}: {} of {} frames analyzed, consensus {}",
            run_id,
            report.analyzed_count(),
            report.outcomes.len(),
            if report.consensus.is_some() {
                "available"
            } else {
                "withheld"
            }
        );
        report
    }
}

pub struct ProcessingPipelineBuilder {
    configuration: Configuration,
    analyzer: Option<Arc<dyn FrameAnalyzer>>,
    progress: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProcessingPipelineBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            analyzer: None,
            progress: None,
        }
    }

    pub fn analyzer(mut self, analyzer: Arc<dyn FrameAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn progress(mut self, sender: mpsc::Sender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn build(self) -> Result<ProcessingPipeline, AppError> {
        let analyzer = self
            .analyzer
            .ok_or(AppError::Pipeline("Analyzer not set".to_string()))?;
        let configuration = self.configuration;
        configuration.validate()?;

        let mut driver = AnalysisDriver::new(analyzer, configuration.analysis.timeout())
            .analyze_failed_captures(configuration.analysis.analyze_failed_captures);
        if let Some(sender) = self.progress {
            driver = driver.with_progress(sender);
        }

        Ok(ProcessingPipeline {
            request: SampleRequest::from_settings(&configuration.sampling)?,
            max_video_duration: configuration.sampling.max_video_duration_secs,
            sampler: FrameSampler::new(configuration.sampling),
            driver,
            aggregator: ConsensusAggregator::from_settings(&configuration.consensus),
        })
    }
}

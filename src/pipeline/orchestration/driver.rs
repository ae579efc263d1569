use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::util::BoxService;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt};
use tracing::{debug, info, warn};

use crate::common::Frame;
use crate::error::AnalysisError;
use crate::pipeline::context::state::CapturedState;
use crate::pipeline::context::FrameContext;
use crate::pipeline::domain::{AnalysisResult, FrameOutcome, ANALYZING};
use crate::pipeline::orchestration::analyzer::FrameAnalyzer;
use crate::pipeline::orchestration::service::AnalyzerService;

/// Incremental updates for whoever is displaying the run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Captured {
        index: usize,
        frame: Frame,
        description: &'static str,
    },
    Analyzed {
        index: usize,
        outcome: FrameOutcome,
    },
}

/// Sends frames to the analyzer strictly one after another, in order.
///
/// The analyzer sits behind a concurrency limit of one, and each response is
/// awaited before the next frame is submitted. A failed call is recorded on
/// its frame's outcome and never ends the batch.
pub struct AnalysisDriver {
    service: BoxService<Frame, AnalysisResult, BoxError>,
    analyzer_name: &'static str,
    analyze_failed_captures: bool,
    progress: Option<mpsc::Sender<ProgressEvent>>,
}

impl AnalysisDriver {
    pub fn new(analyzer: Arc<dyn FrameAnalyzer>, timeout: Option<Duration>) -> Self {
        let analyzer_name = analyzer.name();
        let stack = ServiceBuilder::new()
            .concurrency_limit(1)
            .option_layer(timeout.map(TimeoutLayer::new))
            .service(AnalyzerService::new(analyzer));

        Self {
            service: BoxService::new(stack),
            analyzer_name,
            analyze_failed_captures: true,
            progress: None,
        }
    }

    pub fn analyze_failed_captures(mut self, enabled: bool) -> Self {
        self.analyze_failed_captures = enabled;
        self
    }

    pub fn with_progress(mut self, sender: mpsc::Sender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub async fn drive(&mut self, frames: Vec<Frame>) -> Vec<FrameOutcome> {
        for (index, frame) in frames.iter().enumerate() {
            self.publish(ProgressEvent::Captured {
                index,
                frame: frame.clone(),
                description: ANALYZING,
            });
        }

        let total = frames.len();
        let mut outcomes = Vec::with_capacity(total);
        for (index, frame) in frames.into_iter().enumerate() {
            let outcome = self.analyze_one(FrameContext::new(index, frame), total).await;
            self.publish(ProgressEvent::Analyzed {
                index,
                outcome: outcome.clone(),
            });
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn analyze_one(
        &mut self,
        context: FrameContext<CapturedState>,
        total: usize,
    ) -> FrameOutcome {
        let position = context.index() + 1;
        if context.frame().is_failed() && !self.analyze_failed_captures {
            debug!("Frame {}/{} is a placeholder, not analyzing", position, total);
            return context.into_skipped().into_outcome();
        }

        let response = match self.service.ready().await {
            Ok(service) => service.call(context.frame().clone()).await,
            Err(error) => Err(error),
        };
        match response {
            Ok(result) => {
                let analyzed = context.into_analyzed(result);
                info!(
                    "Frame {}/{} analyzed by {} in {:?}",
                    position,
                    total,
                    self.analyzer_name,
                    analyzed.metrics().analysis_duration().unwrap_or_default()
                );
                analyzed.into_outcome()
            }
            Err(error) => {
                let error = into_analysis_error(error);
                warn!("Frame {}/{} analysis failed: {}", position, total, error);
                context.into_rejected(error).into_outcome()
            }
        }
    }

    fn publish(&self, event: ProgressEvent) {
        let Some(sender) = &self.progress else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Progress channel full, dropping update"),
            Err(TrySendError::Closed(_)) => debug!("Progress receiver gone"),
        }
    }
}

fn into_analysis_error(error: BoxError) -> AnalysisError {
    match error.downcast::<AnalysisError>() {
        Ok(error) => *error,
        Err(error) if error.is::<Elapsed>() => AnalysisError::TimedOut,
        Err(error) => AnalysisError::Transport(error.to_string()),
    }
}

use std::pin::Pin;
use std::sync::Arc;

use crate::common::Frame;
use crate::pipeline::domain::AnalysisResult;
use crate::pipeline::orchestration::analyzer::FrameAnalyzer;
use futures::Future;
use futures::task::Context;
use futures::task::Poll;
use tower::BoxError;
use tower::Service;

#[derive(Clone)]
pub struct AnalyzerService {
    inner: Arc<dyn FrameAnalyzer>,
}

impl AnalyzerService {
    pub fn new(inner: Arc<dyn FrameAnalyzer>) -> Self {
        Self { inner }
    }
}

impl Service<Frame> for AnalyzerService {
    type Response = AnalysisResult;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, frame: Frame) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            tracing::debug!("{} analyzing frame {}", inner.name(), frame.id());
            let result = inner.analyze(&frame).await?;
            Ok(result)
        })
    }
}

//! Scripted collaborators for exercising the sampler and driver without a
//! real video or vision service.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use image::Rgb;

use crate::common::Frame;
use crate::error::{AnalysisError, CaptureError};
use crate::pipeline::domain::{AnalysisResult, Field};
use crate::pipeline::orchestration::FrameAnalyzer;
use crate::pipeline::sampling::{DrawingSurface, MediaSource, ReadyState, SourceEvent};

#[derive(Debug, Clone, Copy)]
pub enum SeekOutcome {
    Settle,
    Error(&'static str),
    Silent,
    Reject,
}

pub struct ScriptedSource {
    duration: Option<f64>,
    position: f64,
    ready: ReadyState,
    dimensions: (u32, u32),
    outcomes: VecDeque<SeekOutcome>,
    draw_failures: usize,
    events: VecDeque<SourceEvent>,
    seeks: Vec<f64>,
    draws: usize,
}

impl ScriptedSource {
    /// A source that loads, reports it can play, and settles every seek.
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            duration,
            position: 0.0,
            ready: ReadyState::HaveMetadata,
            dimensions: (64, 36),
            outcomes: VecDeque::new(),
            draw_failures: 0,
            events: VecDeque::from([SourceEvent::MetadataLoaded, SourceEvent::CanPlay]),
            seeks: Vec::new(),
            draws: 0,
        }
    }

    pub fn positioned_at(mut self, seconds: f64) -> Self {
        self.position = seconds;
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = (width, height);
        self
    }

    /// Outcomes for the next seeks, in order. Later seeks settle.
    pub fn with_seek_outcomes(mut self, outcomes: impl IntoIterator<Item = SeekOutcome>) -> Self {
        self.outcomes = outcomes.into_iter().collect();
        self
    }

    pub fn with_draw_failures(mut self, count: usize) -> Self {
        self.draw_failures = count;
        self
    }

    pub fn with_ready_state(mut self, ready: ReadyState) -> Self {
        self.ready = ready;
        self
    }

    /// Never reports that it can play.
    pub fn never_ready(mut self) -> Self {
        self.events.clear();
        self
    }

    pub fn seeks(&self) -> &[f64] {
        &self.seeks
    }

    pub fn draws(&self) -> usize {
        self.draws
    }
}

#[async_trait]
impl MediaSource for ScriptedSource {
    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn request_seek(&mut self, seconds: f64) -> Result<(), CaptureError> {
        self.seeks.push(seconds);
        match self.outcomes.pop_front().unwrap_or(SeekOutcome::Settle) {
            SeekOutcome::Settle => {
                self.position = seconds;
                self.ready = ReadyState::HaveEnoughData;
                self.events.push_back(SourceEvent::Seeked);
            }
            SeekOutcome::Error(message) => {
                self.events.push_back(SourceEvent::Error(message.to_string()))
            }
            SeekOutcome::Silent => {}
            SeekOutcome::Reject => return Err(CaptureError::Seek("seek rejected".into())),
        }
        Ok(())
    }

    fn draw(&mut self, surface: &mut DrawingSurface) -> Result<(), CaptureError> {
        if self.draw_failures > 0 {
            self.draw_failures -= 1;
            return Err(CaptureError::Draw("canvas tainted".into()));
        }
        self.draws += 1;
        let shade = (self.position * 10.0).clamp(0.0, 255.0) as u8;
        surface.fill(Rgb([shade, 90, 160]));
        Ok(())
    }

    async fn next_event(&mut self) -> Option<SourceEvent> {
        match self.events.pop_front() {
            Some(SourceEvent::CanPlay) => {
                self.ready = ReadyState::HaveEnoughData;
                Some(SourceEvent::CanPlay)
            }
            Some(event) => Some(event),
            None => {
                std::future::pending::<()>().await;
                None
            }
        }
    }
}

/// Replays canned responses; once they run out every call gets an empty response.
pub struct ScriptedAnalyzer {
    responses: Mutex<VecDeque<Result<AnalysisResult, AnalysisError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    seen: Mutex<Vec<f64>>,
}

impl ScriptedAnalyzer {
    pub fn new(
        responses: impl IntoIterator<Item = Result<AnalysisResult, AnalysisError>>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn seen_timestamps(&self) -> Vec<f64> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl FrameAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, frame: &Frame) -> Result<AnalysisResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.seen.lock().unwrap().push(frame.timestamp());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AnalysisError::EmptyResponse));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// A result naming only the game.
pub fn result_for(game: &str) -> AnalysisResult {
    AnalysisResult {
        game: Field::Present(game.to_string()),
        ..AnalysisResult::default()
    }
}

/// Parses a result from JSON text, the way the vision service would send it.
pub fn result_from_json(json: &str) -> AnalysisResult {
    serde_json::from_str(json).unwrap()
}

use async_trait::async_trait;

use super::surface::DrawingSurface;
use crate::error::CaptureError;

/// How much of the video the source can currently render, least to most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

/// Notifications a source pushes while it loads and seeks.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    MetadataLoaded,
    CanPlay,
    Seeked,
    Error(String),
}

/// A seekable video the sampler can draw stills from.
///
/// Seeking is asynchronous: `request_seek` only asks for a new position, and
/// the source later reports `SourceEvent::Seeked` (or `SourceEvent::Error`)
/// through `next_event`.
#[async_trait]
pub trait MediaSource: Send {
    /// Total length in seconds, `None` when not known.
    fn duration(&self) -> Option<f64>;
    fn position(&self) -> f64;
    fn ready_state(&self) -> ReadyState;
    /// Native frame size, zero while unknown.
    fn dimensions(&self) -> (u32, u32);
    fn request_seek(&mut self, seconds: f64) -> Result<(), CaptureError>;
    /// Renders the current frame onto the surface.
    fn draw(&mut self, surface: &mut DrawingSurface) -> Result<(), CaptureError>;
    /// Next notification, `None` once the source has nothing more to say.
    async fn next_event(&mut self) -> Option<SourceEvent>;
}

/// The duration if it is usable for planning samples.
pub fn known_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|d| d.is_finite() && *d > 0.0)
}

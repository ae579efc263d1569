use bytes::Bytes;
use futures::stream::{self, Stream};
use tokio::time::{sleep_until, timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use super::capture::{CaptureCommand, CaptureInput, CaptureMachine};
use super::media_source::{known_duration, MediaSource, ReadyState, SourceEvent};
use super::request::SampleRequest;
use super::surface::DrawingSurface;
use crate::common::{placeholder_image, Frame};
use crate::config::SamplingSettings;
use crate::error::CaptureError;

/// Pulls evenly spaced stills out of a media source, one capture at a time.
pub struct FrameSampler {
    settings: SamplingSettings,
}

struct SampleRun<'a, S: ?Sized> {
    source: &'a mut S,
    surface: DrawingSurface,
    timestamps: std::vec::IntoIter<f64>,
}

impl FrameSampler {
    pub fn new(settings: SamplingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SamplingSettings {
        &self.settings
    }

    /// Waits until the source can render its current frame, giving up quietly
    /// after the ready timeout.
    ///
    /// Returns whether the source reported itself ready. Sampling still
    /// proceeds when it did not; each capture has its own timeout.
    pub async fn prepare<S: MediaSource + ?Sized>(&self, source: &mut S) -> bool {
        if source.ready_state() >= ReadyState::HaveCurrentData {
            return true;
        }
        let wait = async {
            loop {
                match source.next_event().await {
                    Some(SourceEvent::CanPlay) => return true,
                    Some(SourceEvent::Error(message)) => {
                        warn!("Video reported an error while loading: {}", message)
                    }
                    Some(event) => debug!("Waiting for playback, got {:?}", event),
                    None => return false,
                }
            }
        };
        match timeout(self.settings.ready_timeout(), wait).await {
            Ok(ready) => ready,
            Err(_) => {
                warn!(
                    "Video not ready after {:?}, sampling anyway",
                    self.settings.ready_timeout()
                );
                false
            }
        }
    }

    /// Lazily captures one frame per planned timestamp, in order.
    ///
    /// Every timestamp yields exactly one frame. A capture that fails yields a
    /// placeholder frame marked as failed instead of ending the stream.
    pub fn sample<'a, S: MediaSource + ?Sized>(
        &'a self,
        source: &'a mut S,
        request: &SampleRequest,
    ) -> impl Stream<Item = Frame> + 'a {
        let duration = known_duration(source.duration()).unwrap_or_else(|| {
            debug!(
                "Duration unknown, assuming {}s",
                self.settings.default_duration_secs
            );
            self.settings.default_duration_secs
        });
        let timestamps = request.timestamps(duration);
        let (width, height) = match source.dimensions() {
            (0, _) | (_, 0) => (self.settings.fallback_width, self.settings.fallback_height),
            dimensions => dimensions,
        };
        info!(
            "Sampling {} frames from {:.1}s of video at {}x{}",
            timestamps.len(),
            duration,
            width,
            height
        );

        let run = SampleRun {
            source,
            surface: DrawingSurface::new(width, height, self.settings.jpeg_quality),
            timestamps: timestamps.into_iter(),
        };
        stream::unfold(run, move |mut run| async move {
            let target = run.timestamps.next()?;
            let frame = self
                .capture_at(&mut *run.source, &mut run.surface, target)
                .await;
            Some((frame, run))
        })
    }

    pub async fn capture_at<S: MediaSource + ?Sized>(
        &self,
        source: &mut S,
        surface: &mut DrawingSurface,
        target: f64,
    ) -> Frame {
        match self.try_capture(source, surface, target).await {
            Ok(image) => {
                debug!("Captured frame at {:.2}s ({} bytes)", target, image.len());
                Frame::captured(target, image)
            }
            Err(error) => {
                warn!("Capture at {:.2}s failed: {}", target, error);
                let (width, height) = surface.dimensions();
                Frame::failed(
                    placeholder_image(width, height, self.settings.jpeg_quality),
                    error,
                )
            }
        }
    }

    async fn try_capture<S: MediaSource + ?Sized>(
        &self,
        source: &mut S,
        surface: &mut DrawingSurface,
        target: f64,
    ) -> Result<Bytes, CaptureError> {
        let deadline = Instant::now() + self.settings.frame_timeout();
        let mut machine = CaptureMachine::new(target, &self.settings);
        let mut encoded = None;
        let mut command = machine.start(source.ready_state(), source.position());

        loop {
            command = match command {
                CaptureCommand::Seek(seconds) => match source.request_seek(seconds) {
                    Ok(()) => CaptureCommand::AwaitSettle,
                    Err(error) => machine.on(CaptureInput::SourceError(detail(error))),
                },
                CaptureCommand::AwaitSettle => {
                    let input = timeout_at(deadline, await_settle(&mut *source))
                        .await
                        .unwrap_or(CaptureInput::TimedOut);
                    machine.on(input)
                }
                CaptureCommand::Draw => {
                    match source.draw(surface).and_then(|()| surface.encode()) {
                        Ok(image) => {
                            encoded = Some(image);
                            machine.on(CaptureInput::Drawn)
                        }
                        Err(error) => machine.on(CaptureInput::DrawFailed(detail(error))),
                    }
                }
                CaptureCommand::RetryAfter(delay) => {
                    let wake = Instant::now() + delay;
                    if wake >= deadline {
                        sleep_until(deadline).await;
                        machine.on(CaptureInput::TimedOut)
                    } else {
                        sleep_until(wake).await;
                        machine.on(CaptureInput::RetryElapsed)
                    }
                }
                CaptureCommand::Finish => {
                    return encoded.ok_or_else(|| CaptureError::Encode("no image drawn".into()));
                }
                CaptureCommand::Abandon(error) => return Err(error),
            };
        }
    }
}

async fn await_settle<S: MediaSource + ?Sized>(source: &mut S) -> CaptureInput {
    loop {
        match source.next_event().await {
            Some(SourceEvent::Seeked) => return CaptureInput::Settled,
            Some(SourceEvent::Error(message)) => return CaptureInput::SourceError(message),
            Some(event) => debug!("Ignoring {:?} while seeking", event),
            None => return CaptureInput::SourceError(CaptureError::EventsClosed.to_string()),
        }
    }
}

fn detail(error: CaptureError) -> String {
    match error {
        CaptureError::Seek(message) | CaptureError::Draw(message) | CaptureError::Encode(message) => {
            message
        }
        other => other.to_string(),
    }
}

pub mod capture;
pub mod media_source;
pub mod request;
pub mod sampler;
pub mod surface;

pub use capture::{CaptureCommand, CaptureInput, CaptureMachine, CaptureState};
pub use media_source::{known_duration, MediaSource, ReadyState, SourceEvent};
pub use request::SampleRequest;
pub use sampler::FrameSampler;
pub use surface::DrawingSurface;

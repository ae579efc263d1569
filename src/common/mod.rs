pub mod frame;
pub mod placeholder;

pub use frame::{CaptureStatus, Frame};
pub use placeholder::placeholder_image;

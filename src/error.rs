use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid sample request: {0}")]
    InvalidRequest(String),
    #[error("Video is {duration:.1}s long, only videos up to {max:.0}s can be analyzed")]
    VideoTooLong { duration: f64, max: f64 },
    #[error("No frames were supplied for analysis")]
    NoFrames,
    #[error("Unsupported image input: {0}")]
    UnsupportedImage(String),
    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Logging Error: {0}")]
    Logging(String),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
    #[error("Analysis client error: {0}")]
    AnalysisClient(String),
    #[error("Insufficient data: {analyzed} of {total} frames produced an analysis")]
    InsufficientData { analyzed: usize, total: usize },
}

// Capture Error Type, recorded on the frame and never propagated past the sampler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Failed to seek the video: {0}")]
    Seek(String),
    #[error("Failed to draw the frame: {0}")]
    Draw(String),
    #[error("Failed to encode the frame: {0}")]
    Encode(String),
    #[error("Video event stream closed")]
    EventsClosed,
    #[error("Gave up after {attempts} seek attempts: {last}")]
    AttemptsExhausted { attempts: u32, last: String },
    #[error("Frame capture timed out")]
    TimedOut,
}

// Analysis Error Type, recorded on the frame outcome by the driver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Failed to reach the analysis service: {0}")]
    Transport(String),
    #[error("Analysis service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Could not parse the analysis response: {0}")]
    Unparseable(String),
    #[error("Analysis service returned an empty response")]
    EmptyResponse,
    #[error("Image payload is {size} bytes, limit is {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("Analysis request timed out")]
    TimedOut,
}

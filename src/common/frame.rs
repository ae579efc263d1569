use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, CaptureError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Ok,
    Failed,
}

/// One still taken from a video (or handed in by the user) and its encoded image.
///
/// Frames are immutable once built. The encoded image is reference counted, so
/// cloning a frame to hand it to the analyzer does not copy pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    id: Uuid,
    timestamp: f64,
    image: Bytes,
    status: CaptureStatus,
    failure: Option<CaptureError>,
    captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn captured(timestamp: f64, image: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp.max(0.0),
            image,
            status: CaptureStatus::Ok,
            failure: None,
            captured_at: Utc::now(),
        }
    }

    /// A placeholder frame standing in for a capture that gave up.
    pub fn failed(placeholder: Bytes, reason: CaptureError) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: 0.0,
            image: placeholder,
            status: CaptureStatus::Failed,
            failure: Some(reason),
            captured_at: Utc::now(),
        }
    }

    /// A user supplied still. Stills carry no timeline, so the timestamp is 0.
    pub fn from_still(image: Bytes) -> Result<Self, AppError> {
        image::guess_format(&image)
            .map_err(|e| AppError::UnsupportedImage(e.to_string()))?;
        Ok(Self::captured(0.0, image))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn image(&self) -> &Bytes {
        &self.image
    }

    pub fn status(&self) -> CaptureStatus {
        self.status
    }

    pub fn is_failed(&self) -> bool {
        self.status == CaptureStatus::Failed
    }

    pub fn failure(&self) -> Option<&CaptureError> {
        self.failure.as_ref()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn mime_type(&self) -> &'static str {
        image::guess_format(&self.image)
            .map(|format| format.to_mime_type())
            .unwrap_or("image/jpeg")
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            STANDARD.encode(&self.image)
        )
    }

    /// `m:ss` position in the video, `None` for stills and placeholders.
    pub fn display_time(&self) -> Option<String> {
        if self.timestamp <= 0.0 {
            return None;
        }
        let whole = self.timestamp.floor() as u64;
        Some(format!("{}:{:02}", whole / 60, whole % 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes() -> Bytes {
        let img: DynamicImage = DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(16, 16, Rgb([1, 2, 3])),
        );
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        Bytes::from(buffer.into_inner())
    }

    #[test]
    fn cloning_frame_shares_image_buffer() {
        let f1 = Frame::captured(1.5, png_bytes());
        let f2 = f1.clone();
        assert_eq!(f1.image().as_ptr(), f2.image().as_ptr());
        assert_eq!(f1.id(), f2.id());
    }

    #[test]
    fn still_has_no_timeline() {
        let frame = Frame::from_still(png_bytes()).unwrap();
        assert_eq!(frame.timestamp(), 0.0);
        assert_eq!(frame.status(), CaptureStatus::Ok);
        assert!(frame.display_time().is_none());
    }

    #[test]
    fn still_rejects_non_image_bytes() {
        let result = Frame::from_still(Bytes::from_static(b"definitely not an image"));
        assert!(matches!(result, Err(AppError::UnsupportedImage(_))));
    }

    #[test]
    fn failed_frame_is_pinned_to_zero() {
        let frame = Frame::failed(png_bytes(), CaptureError::TimedOut);
        assert!(frame.is_failed());
        assert_eq!(frame.timestamp(), 0.0);
        assert_eq!(frame.failure(), Some(&CaptureError::TimedOut));
    }

    #[test]
    fn data_url_carries_detected_mime_type() {
        let frame = Frame::captured(3.0, png_bytes());
        assert!(frame.to_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn display_time_formats_minutes_and_seconds() {
        let frame = Frame::captured(75.8, png_bytes());
        assert_eq!(frame.display_time().as_deref(), Some("1:15"));
    }
}

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

use crate::error::CaptureError;

/// The reusable canvas stills are drawn onto before encoding.
pub struct DrawingSurface {
    canvas: RgbImage,
    quality: u8,
}

impl DrawingSurface {
    pub fn new(width: u32, height: u32, quality: u8) -> Self {
        Self {
            canvas: RgbImage::new(width.max(1), height.max(1)),
            quality,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    pub fn fill(&mut self, color: Rgb<u8>) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = color;
        }
    }

    /// Draws `image` stretched over the whole canvas.
    pub fn draw_image(&mut self, image: &DynamicImage) {
        let (width, height) = self.canvas.dimensions();
        let frame = if image.dimensions() == (width, height) {
            image.to_rgb8()
        } else {
            image.resize_exact(width, height, FilterType::Triangle).to_rgb8()
        };
        imageops::replace(&mut self.canvas, &frame, 0, 0);
    }

    pub fn encode(&self) -> Result<Bytes, CaptureError> {
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.quality)
            .encode_image(&self.canvas)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        Ok(Bytes::from(encoded))
    }
}

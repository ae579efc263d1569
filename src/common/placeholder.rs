use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

pub const CAPTION: &str = "CAPTURE FAILED";

const BACKGROUND: Rgb<u8> = Rgb([0xf0, 0xf0, 0xf0]);
const INK: Rgb<u8> = Rgb([0xff, 0x00, 0x00]);
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

// 1x1 grey GIF, used only if JPEG encoding of the generated placeholder fails.
const MINIMAL_PLACEHOLDER: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xf0, 0xf0,
    0xf0, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// Neutral still with a red failure caption, substituted for a frame that could not be captured.
pub fn placeholder_image(width: u32, height: u32, quality: u8) -> Bytes {
    let width = width.max(1);
    let height = height.max(1);
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
    draw_caption(&mut canvas, CAPTION);

    let mut encoded = Vec::new();
    match JpegEncoder::new_with_quality(&mut encoded, quality).encode_image(&canvas) {
        Ok(()) => Bytes::from(encoded),
        Err(e) => {
            tracing::warn!("Failed to encode placeholder image: {}", e);
            Bytes::from_static(MINIMAL_PLACEHOLDER)
        }
    }
}

fn draw_caption(canvas: &mut RgbImage, text: &str) {
    let (width, height) = canvas.dimensions();
    let columns = (text.len() as u32 * (GLYPH_WIDTH + 1)).saturating_sub(1);
    let scale = ((width * 4 / 5) / columns.max(1))
        .min(height / (GLYPH_HEIGHT * 4))
        .max(1);

    let text_width = columns * scale;
    let text_height = GLYPH_HEIGHT * scale;
    let origin_x = width.saturating_sub(text_width) / 2;
    let origin_y = height.saturating_sub(text_height) / 2;

    for (index, ch) in text.chars().enumerate() {
        let rows = glyph(ch);
        let glyph_x = origin_x + index as u32 * (GLYPH_WIDTH + 1) * scale;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let x0 = glyph_x + col * scale;
                let y0 = origin_y + row as u32 * scale;
                for y in y0..(y0 + scale).min(height) {
                    for x in x0..(x0 + scale).min(width) {
                        canvas.put_pixel(x, y, INK);
                    }
                }
            }
        }
    }
}

fn glyph(ch: char) -> [u8; 7] {
    match ch {
        'A' => [0x0e, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11],
        'C' => [0x0e, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0e],
        'D' => [0x1e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1e],
        'E' => [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x1f],
        'F' => [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x10],
        'I' => [0x0e, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0e],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1f],
        'P' => [0x1e, 0x11, 0x11, 0x1e, 0x10, 0x10, 0x10],
        'R' => [0x1e, 0x11, 0x11, 0x1e, 0x14, 0x12, 0x11],
        'T' => [0x1f, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e],
        _ => [0; 7],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_decodes_at_requested_size() {
        let bytes = placeholder_image(640, 360, 80);
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (640, 360));

        // Corners stay neutral grey.
        let corner = decoded.get_pixel(2, 2);
        assert!(corner.0.iter().all(|c| (*c as i32 - 0xf0).abs() < 12));
    }

    #[test]
    fn placeholder_carries_red_caption() {
        let bytes = placeholder_image(640, 360, 90);
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        let reddish = decoded
            .pixels()
            .filter(|p| p.0[0] > 200 && p.0[1] < 80 && p.0[2] < 80)
            .count();
        assert!(reddish > 500);
    }

    #[test]
    fn zero_sized_request_still_produces_an_image() {
        let bytes = placeholder_image(0, 0, 80);
        assert!(image::load_from_memory(&bytes).is_ok());
    }
}

//! Image preparation before the vision call.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use tracing::{debug, warn};

use crate::models::config::ImageConfig;

/// Shrinks and re-encodes uploads to bound payload size and cost.
pub struct ImagePreparer {
    max_dimension: u32,
    jpeg_quality: u8,
}

impl ImagePreparer {
    /// Create a preparer from image configuration.
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Prepare upload bytes for the vision call: decode, shrink to the
    /// maximum dimension preserving aspect ratio, re-encode as JPEG.
    ///
    /// Bytes that cannot be decoded as an image (PDFs included) pass
    /// through unchanged; the service receives the original upload.
    pub fn prepare(&self, bytes: &[u8]) -> Vec<u8> {
        let decoded = match image::load_from_memory(bytes) {
            Ok(img) => img,
            Err(e) => {
                warn!("could not decode upload ({}), sending original bytes", e);
                return bytes.to_vec();
            }
        };

        let (orig_width, orig_height) = decoded.dimensions();
        let (new_width, new_height) =
            resize_dimensions(orig_width, orig_height, self.max_dimension);

        let resized = if (new_width, new_height) == (orig_width, orig_height) {
            decoded
        } else {
            debug!(
                "resizing {}x{} -> {}x{}",
                orig_width, orig_height, new_width, new_height
            );
            decoded.resize(new_width, new_height, FilterType::Lanczos3)
        };

        let rgb = resized.to_rgb8();
        let mut out = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
        if let Err(e) = rgb.write_with_encoder(encoder) {
            warn!("JPEG re-encode failed ({}), sending original bytes", e);
            return bytes.to_vec();
        }
        out.into_inner()
    }
}

impl Default for ImagePreparer {
    fn default() -> Self {
        Self::new(&ImageConfig::default())
    }
}

fn resize_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dim = width.max(height);

    if max_dim <= max_dimension {
        return (width, height);
    }

    let scale = max_dimension as f32 / max_dim as f32;
    let new_width = (width as f32 * scale) as u32;
    let new_height = (height as f32 * scale) as u32;

    (new_width.max(1), new_height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_resize_dimensions() {
        // Smaller than the cap stays untouched
        assert_eq!(resize_dimensions(500, 300, 1920), (500, 300));
        // Longer edge is clamped, aspect ratio kept
        assert_eq!(resize_dimensions(3840, 1920, 1920), (1920, 960));
        assert_eq!(resize_dimensions(1000, 4000, 2000), (500, 2000));
    }

    #[test]
    fn test_prepare_shrinks_and_reencodes() {
        let preparer = ImagePreparer::new(&ImageConfig {
            max_dimension: 64,
            jpeg_quality: 85,
        });
        let prepared = preparer.prepare(&png_bytes(200, 100));
        let img = image::load_from_memory(&prepared).unwrap();
        assert_eq!(img.dimensions(), (64, 32));
        assert_eq!(
            image::guess_format(&prepared).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_prepare_small_image_still_jpeg() {
        let preparer = ImagePreparer::default();
        let prepared = preparer.prepare(&png_bytes(10, 10));
        let img = image::load_from_memory(&prepared).unwrap();
        assert_eq!(img.dimensions(), (10, 10));
        assert_eq!(
            image::guess_format(&prepared).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_prepare_undecodable_passthrough() {
        let preparer = ImagePreparer::default();
        let bytes = b"%PDF-1.4 not an image".to_vec();
        assert_eq!(preparer.prepare(&bytes), bytes);
    }
}

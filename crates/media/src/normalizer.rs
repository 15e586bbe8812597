//! Image normalization: decode any supported format, shrink so the longest
//! side fits the limit, re-encode as JPEG.

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use relaycord_core::error::MediaError;
use relaycord_core::media::ImageNormalizer;
use tracing::debug;

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Default)]
pub struct JpegNormalizer;

impl JpegNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl ImageNormalizer for JpegNormalizer {
    fn media_type(&self) -> &str {
        "image/jpeg"
    }

    fn normalize(&self, data: &[u8], max_dimension: u32) -> Result<Vec<u8>, MediaError> {
        let decoded = image::load_from_memory(data)
            .map_err(|e| MediaError::Encoding(format!("decode failed: {e}")))?;

        let (width, height) = (decoded.width(), decoded.height());
        let resized = if width.max(height) > max_dimension {
            // `resize` keeps the aspect ratio and fits within the bounds.
            decoded.resize(max_dimension, max_dimension, FilterType::Lanczos3)
        } else {
            decoded
        };

        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

        let mut out = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
            .map_err(|e| MediaError::Encoding(format!("encode failed: {e}")))?;

        debug!(
            width,
            height,
            new_width = rgb.width(),
            new_height = rgb.height(),
            bytes = out.len(),
            "Normalized image"
        );
        Ok(out)
    }
}

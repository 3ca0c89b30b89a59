use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use stowage_core::{CompressionSettings, UploadError, UploadResult};

/// Image compression service
pub struct ImageCompressor;

impl ImageCompressor {
    /// JPEG quality used when none is configured.
    pub const DEFAULT_JPEG_QUALITY: u8 = 75;

    /// Recompress image bytes according to `settings`.
    ///
    /// The source format is sniffed from the content. Images larger than the
    /// configured bounds are shrunk to fit, keeping their aspect ratio. JPEG
    /// sources are always re-encoded at the configured quality; other formats are
    /// re-encoded only when they were resized, otherwise the input is returned
    /// unchanged.
    pub fn compress(data: &[u8], settings: &CompressionSettings) -> UploadResult<Vec<u8>> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| UploadError::Compression(format!("Failed to read image: {}", e)))?;
        let format = reader
            .format()
            .ok_or_else(|| UploadError::Compression("Unrecognized image format".to_string()))?;
        let img = reader
            .decode()
            .map_err(|e| UploadError::Compression(format!("Failed to decode image: {}", e)))?;

        let (width, height) = img.dimensions();
        let target = fit_within(width, height, settings.max_width, settings.max_height);
        let resized = target.is_some();
        let img = match target {
            Some((w, h)) => {
                tracing::debug!(
                    from_width = width,
                    from_height = height,
                    to_width = w,
                    to_height = h,
                    "Resizing image"
                );
                img.resize_exact(w, h, FilterType::Lanczos3)
            }
            None => img,
        };

        match format {
            ImageFormat::Jpeg => Self::encode_jpeg(&img, settings.quality),
            _ if resized => Self::encode(&img, format),
            _ => Ok(data.to_vec()),
        }
    }

    /// Run [`compress`](Self::compress) on the blocking thread pool.
    pub async fn compress_blocking(
        data: Vec<u8>,
        settings: CompressionSettings,
    ) -> UploadResult<Vec<u8>> {
        tokio::task::spawn_blocking(move || Self::compress(&data, &settings))
            .await
            .map_err(|e| UploadError::Compression(format!("Compression task failed: {}", e)))?
    }

    /// Encode to JPEG at the given quality (clamped to 1-100).
    fn encode_jpeg(img: &DynamicImage, quality: Option<u8>) -> UploadResult<Vec<u8>> {
        let quality = quality
            .unwrap_or(Self::DEFAULT_JPEG_QUALITY)
            .clamp(1, 100);
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        img.to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|e| UploadError::Compression(format!("Failed to encode JPEG: {}", e)))?;
        Ok(buffer)
    }

    fn encode(img: &DynamicImage, format: ImageFormat) -> UploadResult<Vec<u8>> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format)
            .map_err(|e| {
                UploadError::Compression(format!("Failed to encode {:?}: {}", format, e))
            })?;
        Ok(buffer)
    }
}

/// Dimensions that fit `width x height` inside the bounds, or `None` when no
/// bound is set or the image already fits. Never enlarges.
fn fit_within(
    width: u32,
    height: u32,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> Option<(u32, u32)> {
    if width == 0 || height == 0 || (max_width.is_none() && max_height.is_none()) {
        return None;
    }

    let scale_w = max_width.map_or(f64::INFINITY, |m| m as f64 / width as f64);
    let scale_h = max_height.map_or(f64::INFINITY, |m| m as f64 / height as f64);
    let scale = scale_w.min(scale_h);
    if scale >= 1.0 {
        return None;
    }

    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    Some((w, h))
}

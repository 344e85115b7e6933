use async_trait::async_trait;
use image::RgbImage;

use crate::application::ports::StillEncoderPort;
use crate::domain::errors::{DomainError, DomainResult};

/// Rasteriza frames RGB a JPEG fuera del hilo asíncrono.
#[derive(Default)]
pub struct JpegStillEncoder;

impl JpegStillEncoder {
    pub fn new() -> Self { Self }
}

pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> DomainResult<Vec<u8>> {
    let mut jpeg = Vec::new();
    let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
    enc.encode(frame.as_raw(), frame.width(), frame.height(), image::ExtendedColorType::Rgb8)
        .map_err(|e| DomainError::CaptureFailed(e.to_string()))?;
    Ok(jpeg)
}

#[async_trait]
impl StillEncoderPort for JpegStillEncoder {
    async fn encode_jpeg(&self, frame: RgbImage, quality: u8) -> DomainResult<Vec<u8>> {
        tokio::task::spawn_blocking(move || encode_jpeg(&frame, quality))
            .await
            .map_err(|e| DomainError::CaptureFailed(e.to_string()))?
    }
}

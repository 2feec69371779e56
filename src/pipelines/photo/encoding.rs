// SPDX-License-Identifier: GPL-3.0-only

//! Async PNG encoding for captured photos

use image::RgbaImage;
use tracing::{debug, info};

/// MIME type of every encoded photo
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Encoded image data ready for storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder (lossless PNG)
#[derive(Debug, Default, Clone, Copy)]
pub struct PhotoEncoder;

impl PhotoEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode an image off the async executor
    pub async fn encode(&self, image: RgbaImage) -> Result<EncodedImage, String> {
        let (width, height) = image.dimensions();
        info!(width, height, "Starting PNG encoding");

        tokio::task::spawn_blocking(move || {
            let data = Self::encode_png(&image)?;
            debug!(size = data.len(), "Encoding complete");
            Ok(EncodedImage {
                data,
                width,
                height,
            })
        })
        .await
        .map_err(|e| format!("Encoding task error: {}", e))?
    }

    /// Encode image as PNG
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, String> {
        let mut buffer = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut buffer),
                image::ImageFormat::Png,
            )
            .map_err(|e| format!("PNG encoding failed: {}", e))?;
        Ok(buffer)
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Async photo capture pipeline
//!
//! ```text
//! Camera frame → Capture surface (negotiated size) → PNG encoding
//! ```
//!
//! Both stages are CPU-bound and run on the blocking thread pool.

pub mod encoding;
pub mod surface;

pub use encoding::{EncodedImage, PNG_CONTENT_TYPE, PhotoEncoder};
pub use surface::CaptureSurface;

use crate::backends::camera::types::{CameraFrame, Resolution};

/// Frame → PNG pipeline
#[derive(Debug, Default, Clone, Copy)]
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
}

impl PhotoPipeline {
    pub fn new() -> Self {
        Self {
            encoder: PhotoEncoder::new(),
        }
    }

    /// Draw `frame` onto a surface of `resolution` and encode it
    pub async fn process(
        &self,
        frame: CameraFrame,
        resolution: Resolution,
    ) -> Result<EncodedImage, String> {
        let surface = CaptureSurface::new(resolution);
        let image = tokio::task::spawn_blocking(move || surface.draw(&frame))
            .await
            .map_err(|e| format!("Capture task error: {}", e))??;

        self.encoder.encode(image).await
    }
}

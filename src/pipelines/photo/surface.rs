// SPDX-License-Identifier: GPL-3.0-only

//! Capture surface
//!
//! The surface is sized to the stream's negotiated resolution. Frames of a
//! different size are scaled onto it, so photo dimensions always follow
//! what the device negotiated.

use crate::backends::camera::types::{CameraFrame, Resolution};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::debug;

/// Drawing target for one still capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSurface {
    resolution: Resolution,
}

impl CaptureSurface {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Draw a frame onto the surface
    pub fn draw(&self, frame: &CameraFrame) -> Result<RgbaImage, String> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(format!("Empty capture surface {}", self.resolution));
        }

        let pixels = RgbaImage::from_raw(frame.width, frame.height, frame.packed_rgba())
            .ok_or_else(|| {
                format!(
                    "Frame data does not fill {}x{}",
                    frame.width, frame.height
                )
            })?;

        if frame.resolution() == self.resolution {
            return Ok(pixels);
        }

        debug!(
            frame = %frame.resolution(),
            surface = %self.resolution,
            "Scaling frame onto capture surface"
        );
        Ok(imageops::resize(
            &pixels,
            self.resolution.width,
            self.resolution.height,
            FilterType::Triangle,
        ))
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera backend
//!
//! Cameras are discovered through `pw-cli` and streamed with a GStreamer
//! `pipewiresrc` pipeline. PipeWire mediates device access, including the
//! desktop portal permission prompt.

mod enumeration;
mod pipeline;

pub use enumeration::{enumerate_pipewire_cameras, is_pipewire_available, parse_pw_cli_nodes};
pub use pipeline::{PipeWirePipeline, pipeline_description};

use super::CameraBackend;
use super::types::*;
use tracing::{debug, info};

/// PipeWire backend implementation
pub struct PipeWireBackend {
    /// Active pipeline, if a stream is open
    pipeline: Option<PipeWirePipeline>,
}

impl PipeWireBackend {
    pub fn new() -> Self {
        Self { pipeline: None }
    }
}

impl Default for PipeWireBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for PipeWireBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        enumerate_pipewire_cameras().unwrap_or_default()
    }

    fn open(&mut self, request: &StreamRequest) -> BackendResult<NegotiatedStream> {
        self.close();

        let cameras = enumerate_pipewire_cameras()
            .ok_or_else(|| BackendError::NotAvailable("PipeWire is not running".into()))?;
        let device = select_device(&cameras, request.facing)
            .cloned()
            .ok_or_else(|| BackendError::DeviceNotFound("No cameras found".into()))?;

        info!(device = %device.name, facing = %request.facing, "Opening PipeWire stream");

        let pipeline = PipeWirePipeline::start(&device, &request.abort)?;
        let resolution = pipeline.resolution();
        self.pipeline = Some(pipeline);

        Ok(NegotiatedStream { device, resolution })
    }

    fn grab_frame(&self) -> BackendResult<CameraFrame> {
        let pipeline = self.pipeline.as_ref().ok_or(BackendError::NotOpen)?;
        pipeline
            .latest_frame()
            .ok_or_else(|| BackendError::NoFrame("No frame received yet".into()))
    }

    fn close(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            debug!("Closing PipeWire stream");
            pipeline.stop();
        }
    }

    fn is_open(&self) -> bool {
        self.pipeline.is_some()
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::PipeWire
    }

    fn is_available(&self) -> bool {
        is_pipewire_available()
    }
}

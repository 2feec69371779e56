// SPDX-License-Identifier: GPL-3.0-only

//! Still image camera source
//!
//! Serves a decoded image file as an endless stream of identical frames.
//! Useful on machines without a camera and for headless runs.

use super::CameraBackend;
use super::types::*;
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load an image file as an RGBA camera frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !file_formats::is_image_extension(&extension) {
        return Err(BackendError::DeviceNotFound(format!(
            "Unsupported file format: {}",
            extension
        )));
    }

    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
            BackendError::PermissionDenied(format!("{}: {}", path.display(), io))
        }
        image::ImageError::IoError(io) => {
            BackendError::DeviceNotFound(format!("{}: {}", path.display(), io))
        }
        other => BackendError::InitializationFailed(other.to_string()),
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!(path = %path.display(), width, height, "Loaded still image");

    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}

/// Backend that plays a still image file as a camera
pub struct StillImageBackend {
    path: PathBuf,
    frame: Option<CameraFrame>,
}

impl StillImageBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path, frame: None }
    }

    fn device(&self) -> CameraDevice {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        CameraDevice {
            name: format!("Still image ({})", name),
            path: self.path.display().to_string(),
            metadata_path: None,
            location: CameraLocation::External,
        }
    }
}

impl CameraBackend for StillImageBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        if self.path.is_file() {
            vec![self.device()]
        } else {
            Vec::new()
        }
    }

    fn open(&mut self, request: &StreamRequest) -> BackendResult<NegotiatedStream> {
        self.close();

        if request.abort.is_aborted() {
            return Err(BackendError::Cancelled);
        }

        let frame = load_image_as_frame(&self.path)?;
        let resolution = frame.resolution();
        self.frame = Some(frame);

        info!(
            path = %self.path.display(),
            facing = %request.facing,
            %resolution,
            "Still image stream opened"
        );

        Ok(NegotiatedStream {
            device: self.device(),
            resolution,
        })
    }

    fn grab_frame(&self) -> BackendResult<CameraFrame> {
        self.frame.clone().ok_or(BackendError::NotOpen)
    }

    fn close(&mut self) {
        if self.frame.take().is_some() {
            debug!(path = %self.path.display(), "Still image stream closed");
        }
    }

    fn is_open(&self) -> bool {
        self.frame.is_some()
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::StillImage
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }
}

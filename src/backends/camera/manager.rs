// SPDX-License-Identifier: GPL-3.0-only

//! Camera session manager
//!
//! Owns the backend and the single live [`CameraSession`]. Every open starts
//! by tearing the previous session down, so at most one hardware stream is
//! live at any time.

use super::CameraBackend;
use super::types::*;
use crate::errors::CameraError;
use crate::pipelines::photo::{EncodedImage, PhotoPipeline};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

type SharedBackend = Arc<Mutex<Box<dyn CameraBackend>>>;

fn lock_backend(backend: &SharedBackend) -> MutexGuard<'_, Box<dyn CameraBackend>> {
    backend.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The currently open capture stream
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSession {
    /// Facing that was requested for this stream
    pub facing_mode: FacingMode,
    /// Size the device actually delivers
    pub negotiated_resolution: Resolution,
    pub device: CameraDevice,
}

/// Camera session manager
pub struct CameraSessionManager {
    backend: SharedBackend,
    session: Option<CameraSession>,
    facing: FacingMode,
    abort: AbortFlag,
    /// Set while a backend open runs on the blocking pool
    negotiating: bool,
    pipeline: PhotoPipeline,
}

impl CameraSessionManager {
    /// Create a manager with no open session
    pub fn new(backend: Box<dyn CameraBackend>, facing: FacingMode) -> Self {
        info!(backend = %backend.backend_type(), %facing, "Creating camera session manager");

        Self {
            backend: Arc::new(Mutex::new(backend)),
            session: None,
            facing,
            abort: AbortFlag::new(),
            negotiating: false,
            pipeline: PhotoPipeline::new(),
        }
    }

    /// Facing used by the next open
    pub fn facing_mode(&self) -> FacingMode {
        self.facing
    }

    pub fn session(&self) -> Option<&CameraSession> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Handle that aborts a pending open from another thread
    ///
    /// An abort raised before `open` starts cancels that open. The flag is
    /// cleared once the open attempt finishes.
    pub fn abort_handle(&self) -> AbortFlag {
        self.abort.clone()
    }

    /// Enumerate cameras on the backend
    pub fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        lock_backend(&self.backend).enumerate_cameras()
    }

    /// Open a stream with a preferred facing
    ///
    /// Completes once the device has reported its negotiated resolution.
    pub async fn open(&mut self, facing: FacingMode) -> Result<CameraSession, CameraError> {
        self.close();
        self.facing = facing;

        if self.abort.is_aborted() {
            self.abort.reset();
            info!(%facing, "Camera open aborted before negotiation");
            return Err(CameraError::Cancelled);
        }

        let request = StreamRequest {
            facing,
            abort: self.abort.clone(),
        };
        let backend = Arc::clone(&self.backend);

        debug!(%facing, "Requesting camera stream");
        self.negotiating = true;
        let result =
            tokio::task::spawn_blocking(move || lock_backend(&backend).open(&request)).await;
        self.negotiating = false;
        self.abort.reset();

        let negotiated = result
            .map_err(|e| CameraError::DeviceUnavailable(format!("Open task error: {}", e)))?
            .map_err(|e| {
                warn!(error = %e, %facing, "Failed to open camera");
                CameraError::from(e)
            })?;

        info!(
            device = %negotiated.device.name,
            resolution = %negotiated.resolution,
            %facing,
            "Camera session opened"
        );

        let session = CameraSession {
            facing_mode: facing,
            negotiated_resolution: negotiated.resolution,
            device: negotiated.device,
        };
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Capture the current frame as PNG and end the session
    pub async fn capture_frame(&mut self) -> Result<EncodedImage, CameraError> {
        let session = self.session.clone().ok_or(CameraError::NoActiveSession)?;

        let frame = lock_backend(&self.backend).grab_frame();
        self.close();
        let frame = frame?;

        debug!(
            frame = %frame.resolution(),
            surface = %session.negotiated_resolution,
            "Drawing frame onto capture surface"
        );

        self.pipeline
            .process(frame, session.negotiated_resolution)
            .await
            .map_err(CameraError::CaptureFailed)
    }

    /// Toggle facing and reopen
    pub async fn flip(&mut self) -> Result<CameraSession, CameraError> {
        let next = self.facing.flipped();
        info!(from = %self.facing, to = %next, "Flipping camera");
        self.open(next).await
    }

    /// Latest live frame for preview rendering
    pub fn preview_frame(&self) -> Option<CameraFrame> {
        self.session.as_ref()?;
        lock_backend(&self.backend).grab_frame().ok()
    }

    /// Stop the stream; safe to call any number of times
    pub fn close(&mut self) {
        // Unblocks a negotiation left running by a dropped open
        let dropped_open = self.negotiating;
        if dropped_open {
            self.abort.abort();
        }

        let mut backend = lock_backend(&self.backend);
        if backend.is_open() {
            backend.close();
        }
        drop(backend);
        if dropped_open {
            self.negotiating = false;
            self.abort.reset();
        }
        if self.session.take().is_some() {
            info!("Camera session closed");
        }
    }
}

impl Drop for CameraSessionManager {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CameraSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSessionManager")
            .field("facing", &self.facing)
            .field("session", &self.session)
            .finish()
    }
}

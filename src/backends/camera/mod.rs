// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌──────────────────────┐
//! │ UI State Controller  │
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ CameraSessionManager │  ← one live session, open/capture/close/flip
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │  CameraBackend trait │
//! └──────────┬───────────┘
//!       ┌────┴──────┐
//!       ▼           ▼
//!   ┌────────┐ ┌────────────┐
//!   │PipeWire│ │Still image │
//!   └────────┘ └────────────┘
//! ```

pub mod file_source;
pub mod manager;
pub mod pipewire;
pub mod types;

pub use manager::{CameraSession, CameraSessionManager};
pub use types::*;

use std::path::PathBuf;

/// Camera backend trait
///
/// Calls may block (device negotiation, pipeline teardown); the session
/// manager runs them off the async executor.
pub trait CameraBackend: Send {
    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Start a stream for the preferred facing
    ///
    /// Returns once the device has reported the resolution it actually
    /// delivers. Any stream already open is stopped first.
    fn open(&mut self, request: &StreamRequest) -> BackendResult<NegotiatedStream>;

    /// Latest frame of the open stream
    fn grab_frame(&self) -> BackendResult<CameraFrame>;

    /// Stop the stream and release the device. No-op when nothing is open.
    fn close(&mut self);

    /// Whether a stream is currently open
    fn is_open(&self) -> bool;

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Check if this backend is usable on the current system
    fn is_available(&self) -> bool;
}

/// Create a backend of the given type
///
/// `still_image` is the source file for [`CameraBackendType::StillImage`].
pub fn get_backend(
    backend_type: CameraBackendType,
    still_image: Option<PathBuf>,
) -> Box<dyn CameraBackend> {
    match (backend_type, still_image) {
        (CameraBackendType::StillImage, Some(path)) => {
            Box::new(file_source::StillImageBackend::new(path))
        }
        (CameraBackendType::StillImage, None) => {
            tracing::warn!("Still image backend selected without a source, using PipeWire");
            Box::new(pipewire::PipeWireBackend::new())
        }
        (CameraBackendType::PipeWire, _) => Box::new(pipewire::PipeWireBackend::new()),
    }
}

// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// Live cameras through PipeWire (modern Linux standard)
    #[default]
    PipeWire,
    /// A still image file standing in for a camera
    StillImage,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::PipeWire => write!(f, "PipeWire"),
            CameraBackendType::StillImage => write!(f, "still image"),
        }
    }
}

/// Which physical camera a stream is requested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Outward-facing (rear) camera
    #[default]
    Environment,
    /// Inward-facing (selfie) camera
    User,
}

impl FacingMode {
    /// The other facing direction
    pub fn flipped(self) -> Self {
        match self {
            FacingMode::Environment => FacingMode::User,
            FacingMode::User => FacingMode::Environment,
        }
    }

    /// Device location that satisfies this facing
    pub fn location(self) -> CameraLocation {
        match self {
            FacingMode::Environment => CameraLocation::Back,
            FacingMode::User => CameraLocation::Front,
        }
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Environment => write!(f, "environment"),
            FacingMode::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "environment" | "back" | "rear" => Ok(FacingMode::Environment),
            "user" | "front" | "selfie" => Ok(FacingMode::User),
            other => Err(format!("unknown facing mode: {}", other)),
        }
    }
}

/// Physical mounting of a camera, as reported by libcamera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraLocation {
    Front,
    Back,
    /// USB webcams and anything without a location property
    #[default]
    External,
}

impl CameraLocation {
    /// Parse libcamera's `api.libcamera.location` values
    pub fn from_property(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "front" => CameraLocation::Front,
            "back" => CameraLocation::Back,
            _ => CameraLocation::External,
        }
    }
}

/// Frame size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String, // PipeWire target ("pipewire-serial-N") or a file path
    pub metadata_path: Option<String>, // PipeWire node ID
    pub location: CameraLocation,
}

/// Pick the device for a preferred facing
///
/// Facing is a preference, not a constraint: when no device sits at the
/// matching location the first device is used.
pub fn select_device(devices: &[CameraDevice], facing: FacingMode) -> Option<&CameraDevice> {
    let wanted = facing.location();
    devices
        .iter()
        .find(|d| d.location == wanted)
        .or_else(|| devices.first())
}

/// Shared flag that aborts an in-flight stream negotiation
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Parameters for opening a stream
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Preferred (ideal) facing direction
    pub facing: FacingMode,
    pub abort: AbortFlag,
}

/// What the device actually delivered once the stream is running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedStream {
    pub device: CameraDevice,
    pub resolution: Resolution,
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, `stride` bytes per row
    pub data: Arc<[u8]>,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// When the frame was produced
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a frame from tightly packed RGBA pixels
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(pixels),
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Pixel at (x, y) as RGBA
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y * self.stride + x * 4) as usize;
        match self.data.get(offset..offset + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0, 0, 0, 255],
        }
    }

    /// Copy into tightly packed RGBA rows, dropping stride padding
    pub fn packed_rgba(&self) -> Vec<u8> {
        let row_bytes = (self.width * 4) as usize;
        if self.stride as usize == row_bytes {
            return self.data.to_vec();
        }
        let mut out = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * self.stride as usize;
            if let Some(slice) = self.data.get(start..start + row_bytes) {
                out.extend_from_slice(slice);
            }
        }
        out
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Access to the device was refused
    PermissionDenied(String),
    /// Failed to start the stream
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Operation needs an open stream
    NotOpen,
    /// Negotiation aborted through the request's abort flag
    Cancelled,
    /// Stream is open but produced no usable frame
    NoFrame(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::NotOpen => write!(f, "No stream open"),
            BackendError::Cancelled => write!(f, "Stream negotiation cancelled"),
            BackendError::NoFrame(msg) => write!(f, "No frame: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str, location: CameraLocation) -> CameraDevice {
        CameraDevice {
            name: name.to_string(),
            path: format!("pipewire-{}", name),
            metadata_path: None,
            location,
        }
    }

    #[test]
    fn test_select_device_prefers_matching_location() {
        let devices = vec![
            device("front", CameraLocation::Front),
            device("back", CameraLocation::Back),
        ];
        assert_eq!(
            select_device(&devices, FacingMode::Environment).map(|d| d.name.as_str()),
            Some("back")
        );
        assert_eq!(
            select_device(&devices, FacingMode::User).map(|d| d.name.as_str()),
            Some("front")
        );
    }

    #[test]
    fn test_select_device_falls_back_to_first() {
        let devices = vec![device("webcam", CameraLocation::External)];
        assert_eq!(
            select_device(&devices, FacingMode::User).map(|d| d.name.as_str()),
            Some("webcam")
        );
        assert!(select_device(&[], FacingMode::User).is_none());
    }

    #[test]
    fn test_facing_mode_parsing() {
        assert_eq!("user".parse::<FacingMode>(), Ok(FacingMode::User));
        assert_eq!("Environment".parse::<FacingMode>(), Ok(FacingMode::Environment));
        assert!("sideways".parse::<FacingMode>().is_err());
        assert_eq!(FacingMode::User.flipped(), FacingMode::Environment);
    }

    #[test]
    fn test_packed_rgba_drops_padding() {
        // 1x2 frame with 8-byte stride (4 bytes of padding per row)
        let frame = CameraFrame {
            width: 1,
            height: 2,
            data: Arc::from(vec![1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0]),
            stride: 8,
            captured_at: Instant::now(),
        };
        assert_eq!(frame.packed_rgba(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(frame.pixel(0, 1), [5, 6, 7, 8]);
    }
}

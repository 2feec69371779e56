// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera application

use crate::backends::camera::types::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for photo cache operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Photo cache / shell cache errors
    Storage(StorageError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Errors from the camera session manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The user or the portal refused camera access
    PermissionDenied,
    /// No usable capture device, or the device failed to start
    DeviceUnavailable(String),
    /// Capture requested without a live session
    NoActiveSession,
    /// An in-flight open was aborted
    Cancelled,
    /// Frame grab or encoding failed
    CaptureFailed(String),
}

/// Errors from the named blob caches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The storage root could not be opened
    Unavailable(String),
    /// Writing an entry failed
    WriteFailed(String),
    /// No entry under the requested key
    NotFound(String),
    /// Entry metadata could not be decoded
    Corrupt(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "Camera permission denied"),
            CameraError::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            CameraError::NoActiveSession => write!(f, "No active camera stream"),
            CameraError::Cancelled => write!(f, "Camera open cancelled"),
            CameraError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            StorageError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            StorageError::NotFound(key) => write!(f, "No entry for key: {}", key),
            StorageError::Corrupt(msg) => write!(f, "Corrupt entry: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for StorageError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied(_) => CameraError::PermissionDenied,
            BackendError::NotAvailable(msg)
            | BackendError::DeviceNotFound(msg)
            | BackendError::InitializationFailed(msg) => CameraError::DeviceUnavailable(msg),
            BackendError::NotOpen => CameraError::NoActiveSession,
            BackendError::Cancelled => CameraError::Cancelled,
            BackendError::NoFrame(msg) | BackendError::Other(msg) => {
                CameraError::CaptureFailed(msg)
            }
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err.into())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

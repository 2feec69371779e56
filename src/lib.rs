// SPDX-License-Identifier: GPL-3.0-only

//! Camara - camera capture with a persistent photo cache
//!
//! Opens a camera, takes a still photo, keeps it in a named on-disk cache
//! and shows previously taken photos in a gallery.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: UI state controller, gallery and startup
//! - [`backends`]: Camera backend abstraction and session manager
//! - [`pipelines`]: Frame to PNG capture pipeline
//! - [`storage`]: Named blob caches, photo store and app shell cache
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal front end
//!
//! # Example
//!
//! ```ignore
//! // Interactive terminal UI:
//! // camara
//! // Headless capture:
//! // camara photo --facing user
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{AppContext, Intent, UiController, UiState};
pub use config::Config;
pub use errors::{AppError, AppResult, CameraError, StorageError};

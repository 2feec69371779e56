// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! The backend layer abstracts hardware access, providing a consistent API
//! regardless of the underlying capture method:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  App Layer                   │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌────────────────┐   │
//! │  │ Camera (PipeWire)│  │ Camera (image) │   │
//! │  └──────────────────┘  └────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Camera backends, device selection and the session manager

pub mod camera;

// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! - [`photo`]: still capture from a camera frame to PNG bytes

pub mod photo;

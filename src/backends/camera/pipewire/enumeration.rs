// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera enumeration

use super::super::types::{CameraDevice, CameraLocation};
use tracing::{debug, info, warn};

/// Enumerate cameras using PipeWire
///
/// Returns `None` when PipeWire (or its GStreamer source element) is missing.
pub fn enumerate_pipewire_cameras() -> Option<Vec<CameraDevice>> {
    if !is_pipewire_available() {
        return None;
    }

    if let Some(cameras) = try_enumerate_with_pw_cli() {
        debug!(count = cameras.len(), "Found PipeWire cameras");
        return Some(cameras);
    }

    // pw-cli missing or silent: let PipeWire pick its default camera
    info!("Using PipeWire auto-selection (default camera)");
    Some(vec![CameraDevice {
        name: "Default Camera (PipeWire)".to_string(),
        path: String::new(),
        metadata_path: None,
        location: CameraLocation::External,
    }])
}

/// Check that GStreamer initialises and provides `pipewiresrc`
pub fn is_pipewire_available() -> bool {
    if gstreamer::init().is_err() {
        warn!("GStreamer init failed");
        return false;
    }
    gstreamer::ElementFactory::find("pipewiresrc").is_some()
}

fn try_enumerate_with_pw_cli() -> Option<Vec<CameraDevice>> {
    debug!("Trying pw-cli for camera enumeration");

    let output = std::process::Command::new("pw-cli")
        .args(["ls", "Node"])
        .output()
        .ok()?;

    if !output.status.success() {
        debug!("pw-cli command failed");
        return None;
    }

    let cameras = parse_pw_cli_nodes(&String::from_utf8_lossy(&output.stdout));
    if cameras.is_empty() { None } else { Some(cameras) }
}

/// Node properties collected while scanning `pw-cli ls Node`
#[derive(Default)]
struct NodeProps {
    id: Option<String>,
    serial: Option<String>,
    name: Option<String>,
    location: Option<String>,
    is_video_source: bool,
}

impl NodeProps {
    fn into_device(self) -> Option<CameraDevice> {
        if !self.is_video_source {
            return None;
        }
        let id = self.id?;
        let name = self.name?;

        let path = match self.serial {
            Some(serial) => format!("pipewire-serial-{}", serial),
            None => format!("pipewire-{}", id),
        };
        let location = self
            .location
            .as_deref()
            .map(CameraLocation::from_property)
            .unwrap_or_default();

        debug!(id = %id, name = %name, path = %path, ?location, "Found video camera");
        Some(CameraDevice {
            name,
            path,
            metadata_path: Some(id),
            location,
        })
    }
}

/// Parse `pw-cli ls Node` output into video source devices
pub fn parse_pw_cli_nodes(output: &str) -> Vec<CameraDevice> {
    let mut cameras = Vec::new();
    let mut current = NodeProps::default();

    for line in output.lines() {
        let trimmed = line.trim();

        // "id 76, type PipeWire:Interface:Node/3"
        if let Some(rest) = trimmed.strip_prefix("id ")
            && trimmed.contains("type PipeWire:Interface:Node")
        {
            cameras.extend(std::mem::take(&mut current).into_device());
            current.id = rest.split(',').next().map(|id| id.trim().to_string());
            continue;
        }

        if trimmed.contains("media.class") && trimmed.contains("\"Video/Source\"") {
            current.is_video_source = true;
        } else if trimmed.contains("object.serial") {
            current.serial = extract_quoted_value(trimmed);
        } else if trimmed.contains("node.description") {
            current.name = extract_quoted_value(trimmed);
        } else if trimmed.contains("api.libcamera.location") {
            current.location = extract_quoted_value(trimmed);
        }
    }
    cameras.extend(current.into_device());

    cameras
}

/// Extract quoted value from a property line (`property = "value"` → `value`)
fn extract_quoted_value(line: &str) -> Option<String> {
    let start = line.find('"')? + 1;
    let end = line[start..].find('"')? + start;
    Some(line[start..end].to_string())
}

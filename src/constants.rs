// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identity
pub mod app_info {
    /// Directory name under the user config and cache dirs
    pub const APP_DIR: &str = "camara";

    /// Configuration file inside the app config dir
    pub const CONFIG_FILE: &str = "config.json";

    /// Log file used while the terminal UI owns the screen
    pub const LOG_FILE: &str = "camara.log";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

/// Named cache layout
pub mod storage {
    /// Cache holding captured photos
    pub const DYNAMIC_CACHE_NAME: &str = "camara-dynamic-v2";

    /// Cache holding the bundled app shell resources
    pub const SHELL_CACHE_NAME: &str = "camara-shell-v4";

    /// Resources precached by the app shell on install
    pub const SHELL_MANIFEST: &[&str] = &["./help.txt", "./about.txt", "./manifest.json"];

    /// Shell resource shown as help text
    pub const HELP_RESOURCE: &str = "./help.txt";

    /// Shell resource shown as about text
    pub const ABOUT_RESOURCE: &str = "./about.txt";
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Number of videoconvert threads from the available CPU threads
    pub fn videoconvert_threads() -> u32 {
        std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(4)
    }

    /// Output pixel format for appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// How often a pending negotiation checks for abort and bus errors
    pub const NEGOTIATION_POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Terminal event poll interval (~60 FPS redraw)
    pub const UI_POLL_INTERVAL: Duration = Duration::from_millis(16);
}

/// Supported still image formats for the still image backend
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

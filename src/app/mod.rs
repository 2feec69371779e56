// SPDX-License-Identifier: GPL-3.0-only

//! Application controller
//!
//! [`UiController`] is the state machine between user intents and the
//! camera, the photo store and the gallery. Front ends (terminal UI, CLI)
//! only dispatch [`Intent`]s and render what the controller exposes.
//!
//! # Capture flow
//!
//! ```text
//! TakePhoto ─▶ capture_frame() ─▶ state = PhotoTaken
//!                                   ├─▶ store.put()      (spawned, eventual)
//!                                   └─▶ gallery.append() (immediate)
//! ```
//!
//! - `state`: UI states, intents and the visible-controls projection
//! - `gallery`: append-only gallery presenter

pub mod gallery;
pub mod state;

pub use gallery::{EntryOrigin, Gallery, GalleryEntry};
pub use state::{Control, ControlSet, Intent, UiState, visible_controls};

use crate::backends::camera::{CameraBackend, CameraSessionManager};
use crate::config::Config;
use crate::errors::CameraError;
use crate::storage::{CacheStorage, KeyGenerator, PhotoKey, PhotoStore, ShellCache};
use futures::future::join_all;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// The photo on display after a capture
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub key: PhotoKey,
    /// PNG payload
    pub image: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
}

/// Blocking user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Camera access was refused
    PermissionDenied,
    /// No camera could be opened
    CameraUnavailable(String),
    /// Capture without a live stream
    NoActiveSession,
    /// Capture or encoding failed
    CaptureFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PermissionDenied => write!(
                f,
                "Could not access the camera. Make sure camera permission is granted."
            ),
            Notice::CameraUnavailable(reason) => {
                write!(f, "Could not access the camera: {}", reason)
            }
            Notice::NoActiveSession => write!(f, "No active camera stream."),
            Notice::CaptureFailed(reason) => write!(f, "Could not take the photo: {}", reason),
        }
    }
}

impl From<&CameraError> for Notice {
    fn from(err: &CameraError) -> Self {
        match err {
            CameraError::PermissionDenied => Notice::PermissionDenied,
            CameraError::DeviceUnavailable(reason) => Notice::CameraUnavailable(reason.clone()),
            CameraError::NoActiveSession => Notice::NoActiveSession,
            CameraError::Cancelled => Notice::CameraUnavailable(err.to_string()),
            CameraError::CaptureFailed(reason) => Notice::CaptureFailed(reason.clone()),
        }
    }
}

/// UI state controller
pub struct UiController {
    state: UiState,
    camera: CameraSessionManager,
    store: PhotoStore,
    gallery: Gallery,
    keys: KeyGenerator,
    last_photo: Option<CapturedPhoto>,
    notices: VecDeque<Notice>,
    pending: JoinSet<()>,
    gallery_loaded: bool,
}

impl UiController {
    pub fn new(camera: CameraSessionManager, store: PhotoStore) -> Self {
        Self {
            state: UiState::Idle,
            camera,
            store,
            gallery: Gallery::new(),
            keys: KeyGenerator::new(),
            last_photo: None,
            notices: VecDeque::new(),
            pending: JoinSet::new(),
            gallery_loaded: false,
        }
    }

    /// Replace the photo key generator
    pub fn with_key_generator(mut self, keys: KeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn camera(&self) -> &CameraSessionManager {
        &self.camera
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    pub fn last_photo(&self) -> Option<&CapturedPhoto> {
        self.last_photo.as_ref()
    }

    /// Controls for the current state, plus the gallery once it has entries
    pub fn visible_controls(&self) -> ControlSet {
        let controls = visible_controls(self.state);
        if self.gallery.is_visible() {
            controls.with_gallery()
        } else {
            controls
        }
    }

    /// Oldest notice not yet dismissed
    pub fn notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    /// Dismiss and return the oldest notice
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    pub fn pending_notices(&self) -> usize {
        self.notices.len()
    }

    /// Handle one user intent; intents the current state does not accept are ignored
    pub async fn dispatch(&mut self, intent: Intent) {
        self.reap_persists();

        if !self.state.accepts(intent) {
            debug!(?intent, state = %self.state, "Ignoring intent");
            return;
        }

        match intent {
            Intent::OpenCamera | Intent::RetakePhoto => self.open_camera().await,
            Intent::FlipCamera => self.flip_camera().await,
            Intent::TakePhoto => self.take_photo().await,
        }
    }

    async fn open_camera(&mut self) {
        // Affordances switch before negotiation completes
        self.state = UiState::CameraActive;
        let facing = self.camera.facing_mode();

        match self.camera.open(facing).await {
            Ok(session) => {
                info!(
                    %facing,
                    resolution = %session.negotiated_resolution,
                    "Camera active"
                );
            }
            Err(e) => self.revert_to_idle(e),
        }
    }

    async fn flip_camera(&mut self) {
        match self.camera.flip().await {
            Ok(session) => info!(facing = %session.facing_mode, "Camera flipped"),
            Err(e) => self.revert_to_idle(e),
        }
    }

    async fn take_photo(&mut self) {
        let encoded = match self.camera.capture_frame().await {
            Ok(encoded) => encoded,
            Err(CameraError::NoActiveSession) => {
                warn!("Capture requested without an active session");
                self.notices.push_back(Notice::NoActiveSession);
                return;
            }
            Err(e) => {
                error!(error = %e, "Capture failed");
                self.notices.push_back(Notice::from(&e));
                self.camera.close();
                self.state = UiState::Idle;
                return;
            }
        };

        let key = self.keys.next_key();
        let image: Arc<[u8]> = Arc::from(encoded.data);
        info!(%key, width = encoded.width, height = encoded.height, "Photo captured");

        self.state = UiState::PhotoTaken;
        self.last_photo = Some(CapturedPhoto {
            key,
            image: Arc::clone(&image),
            width: encoded.width,
            height: encoded.height,
        });

        let store = self.store.clone();
        let payload = image.to_vec();
        let persist_key = key.to_string();
        self.pending.spawn(async move {
            if let Err(e) = store.put(&persist_key, payload).await {
                warn!(key = %persist_key, error = %e, "Photo not persisted");
            }
        });

        self.gallery.append(GalleryEntry {
            key: key.to_string(),
            origin: EntryOrigin::Captured,
            image,
        });
    }

    fn revert_to_idle(&mut self, err: CameraError) {
        self.camera.close();
        self.state = UiState::Idle;
        if err == CameraError::Cancelled {
            info!("Camera open cancelled");
            return;
        }
        warn!(error = %err, "Camera could not be opened");
        self.notices.push_back(Notice::from(&err));
    }

    /// Append every stored photo to the gallery
    ///
    /// Runs once, from `Idle`, and never changes the UI state. All fetches
    /// run concurrently; append order follows the key listing. Returns the
    /// number of entries added.
    pub async fn load_gallery(&mut self) -> usize {
        if self.gallery_loaded || self.state != UiState::Idle {
            debug!("Gallery already loaded or camera in use");
            return 0;
        }
        self.gallery_loaded = true;

        let keys: Vec<String> = self
            .store
            .list_keys()
            .await
            .into_iter()
            .filter(|key| PhotoKey::parse(key).is_some())
            .collect();

        let store = self.store.clone();
        let fetches = keys.into_iter().map(|key| {
            let store = store.clone();
            async move {
                let result = store.get_by_key(&key).await;
                (key, result)
            }
        });

        let mut loaded = 0;
        for (key, result) in join_all(fetches).await {
            match result {
                Ok(bytes) => {
                    self.gallery.append(GalleryEntry {
                        key,
                        origin: EntryOrigin::Stored,
                        image: Arc::from(bytes),
                    });
                    loaded += 1;
                }
                Err(e) => warn!(%key, error = %e, "Skipping stored photo"),
            }
        }

        info!(count = loaded, "Gallery loaded from store");
        loaded
    }

    /// Wait for every spawned persist to finish
    pub async fn flush_pending(&mut self) {
        while let Some(result) = self.pending.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Persist task failed");
            }
        }
    }

    fn reap_persists(&mut self) {
        while let Some(result) = self.pending.try_join_next() {
            if let Err(e) = result {
                error!(error = %e, "Persist task failed");
            }
        }
    }

    /// Close the camera unconditionally and wait for pending persists
    pub async fn teardown(&mut self) {
        self.camera.close();
        self.flush_pending().await;
        info!("Controller torn down");
    }
}

impl fmt::Debug for UiController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiController")
            .field("state", &self.state)
            .field("camera", &self.camera)
            .field("gallery", &self.gallery.len())
            .field("notices", &self.notices)
            .finish()
    }
}

/// Everything a front end needs after startup
pub struct AppContext {
    pub controller: UiController,
    /// `None` when the storage root could not be opened
    pub shell: Option<ShellCache>,
}

impl AppContext {
    /// Open storage, install and activate the app shell, load the gallery
    ///
    /// Storage problems are logged and degrade to an empty, non-persisting
    /// store; they never prevent startup.
    pub async fn start(config: &Config, backend: Box<dyn CameraBackend>) -> Self {
        let root = config.storage_root();
        let (store, shell) = match CacheStorage::open(&root).await {
            Ok(storage) => {
                let shell = match install_shell(&storage, config).await {
                    Ok(shell) => Some(shell),
                    Err(e) => {
                        warn!(error = %e, "App shell unavailable");
                        None
                    }
                };
                let store = PhotoStore::open(&storage, &config.dynamic_cache).await;
                (store, shell)
            }
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Storage unavailable, photos will not persist");
                (PhotoStore::unavailable(), None)
            }
        };

        let camera = CameraSessionManager::new(backend, config.default_facing);
        let mut controller = UiController::new(camera, store);
        controller.load_gallery().await;

        Self { controller, shell }
    }
}

async fn install_shell(
    storage: &CacheStorage,
    config: &Config,
) -> crate::errors::StorageResult<ShellCache> {
    let shell = ShellCache::open(storage, &config.shell_cache, &config.dynamic_cache).await?;
    shell.install().await?;
    let deleted = shell.activate().await?;
    if !deleted.is_empty() {
        info!(count = deleted.len(), "Purged stale caches");
    }
    Ok(shell)
}

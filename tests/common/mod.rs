// SPDX-License-Identifier: GPL-3.0-only

//! Shared test fixtures: a scripted camera backend and temp storage helpers

#![allow(dead_code)]

use camara::app::UiController;
use camara::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraBackendType, CameraDevice, CameraFrame,
    CameraLocation, CameraSessionManager, FacingMode, NegotiatedStream, Resolution, StreamRequest,
    select_device,
};
use camara::storage::{CacheStorage, KeyGenerator, PhotoStore};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_CACHE: &str = "camara-dynamic-v2";

/// Observations and scripted behavior shared with a [`FakeBackend`]
#[derive(Debug, Default)]
pub struct Probe {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
    pub facings: Mutex<Vec<FacingMode>>,
    /// Errors returned by the next opens, in order
    pub open_failures: Mutex<VecDeque<BackendError>>,
    /// Error returned by the next frame grab
    pub frame_failure: Mutex<Option<BackendError>>,
    /// Make open wait until the request is aborted
    pub hang_open: AtomicBool,
}

impl Probe {
    pub fn fail_next_open(&self, err: BackendError) {
        self.open_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_next_frame(&self, err: BackendError) {
        *self.frame_failure.lock().unwrap() = Some(err);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub fn facings(&self) -> Vec<FacingMode> {
        self.facings.lock().unwrap().clone()
    }
}

/// Camera backend driven entirely by a [`Probe`]
pub struct FakeBackend {
    probe: Arc<Probe>,
    negotiated: Resolution,
    frame_size: Resolution,
    devices: Vec<CameraDevice>,
    open: bool,
}

impl FakeBackend {
    /// Backend that negotiates `negotiated` but delivers frames of `frame_size`
    pub fn new(probe: Arc<Probe>, negotiated: Resolution, frame_size: Resolution) -> Self {
        Self {
            probe,
            negotiated,
            frame_size,
            devices: vec![
                device("Back Camera", CameraLocation::Back),
                device("Front Camera", CameraLocation::Front),
            ],
            open: false,
        }
    }
}

fn device(name: &str, location: CameraLocation) -> CameraDevice {
    CameraDevice {
        name: name.to_string(),
        path: format!("fake-{}", name.to_lowercase().replace(' ', "-")),
        metadata_path: None,
        location,
    }
}

impl CameraBackend for FakeBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.devices.clone()
    }

    fn open(&mut self, request: &StreamRequest) -> BackendResult<NegotiatedStream> {
        self.close();
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        self.probe.facings.lock().unwrap().push(request.facing);

        if let Some(err) = self.probe.open_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        while self.probe.hang_open.load(Ordering::SeqCst) {
            if request.abort.is_aborted() {
                return Err(BackendError::Cancelled);
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        let device = select_device(&self.devices, request.facing)
            .cloned()
            .ok_or_else(|| BackendError::DeviceNotFound("no devices".into()))?;

        self.open = true;
        let live = self.probe.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_live.fetch_max(live, Ordering::SeqCst);

        Ok(NegotiatedStream {
            device,
            resolution: self.negotiated,
        })
    }

    fn grab_frame(&self) -> BackendResult<CameraFrame> {
        if !self.open {
            return Err(BackendError::NotOpen);
        }
        if let Some(err) = self.probe.frame_failure.lock().unwrap().take() {
            return Err(err);
        }
        let Resolution { width, height } = self.frame_size;
        Ok(CameraFrame::from_rgba(
            width,
            height,
            vec![128; (width * height * 4) as usize],
        ))
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.probe.live.fetch_sub(1, Ordering::SeqCst);
            self.probe.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::PipeWire
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Fake backend negotiating 1280x720 with 640x360 frames
pub fn fake_backend() -> (Box<dyn CameraBackend>, Arc<Probe>) {
    let probe = Arc::new(Probe::default());
    let backend = FakeBackend::new(
        Arc::clone(&probe),
        Resolution::new(1280, 720),
        Resolution::new(640, 360),
    );
    (Box::new(backend), probe)
}

pub fn fake_manager() -> (CameraSessionManager, Arc<Probe>) {
    let (backend, probe) = fake_backend();
    (
        CameraSessionManager::new(backend, FacingMode::Environment),
        probe,
    )
}

/// Photo store on a fresh temp directory
pub async fn temp_store() -> (PhotoStore, CacheStorage, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let storage = CacheStorage::open(dir.path()).await.unwrap();
    let store = PhotoStore::open(&storage, TEST_CACHE).await;
    (store, storage, dir)
}

/// Key generator on a settable clock
pub fn manual_keys(start: i64) -> (KeyGenerator, Arc<AtomicI64>) {
    let now = Arc::new(AtomicI64::new(start));
    let clock = Arc::clone(&now);
    (
        KeyGenerator::with_clock(Box::new(move || clock.load(Ordering::SeqCst))),
        now,
    )
}

/// Controller on a fake camera and a temp store
pub async fn controller() -> (UiController, Arc<Probe>, PhotoStore, tempfile::TempDir) {
    let (manager, probe) = fake_manager();
    let (store, _storage, dir) = temp_store().await;
    let (keys, _) = manual_keys(1000);
    let controller = UiController::new(manager, store.clone()).with_key_generator(keys);
    (controller, probe, store, dir)
}

/// Write a solid-color PNG of the given size
pub fn write_png(path: &std::path::Path, width: u32, height: u32) {
    image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]))
        .save(path)
        .unwrap();
}

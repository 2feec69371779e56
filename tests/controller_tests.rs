// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the UI state controller

mod common;

use camara::app::{AppContext, Control, EntryOrigin, Intent, Notice, UiController, UiState};
use camara::backends::camera::{BackendError, FacingMode};
use camara::config::Config;
use camara::constants::storage::{DYNAMIC_CACHE_NAME, SHELL_CACHE_NAME};
use camara::storage::{CacheStorage, PhotoStore};
use common::{TEST_CACHE, controller, fake_backend, fake_manager, manual_keys, temp_store};
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn test_starts_idle_with_open_control() {
    let (controller, _probe, _store, _dir) = controller().await;

    assert_eq!(controller.state(), UiState::Idle);
    let controls = controller.visible_controls();
    assert!(controls.contains(Control::OpenCamera));
    assert!(!controls.contains(Control::Gallery));
}

#[tokio::test]
async fn test_open_then_flip() {
    let (mut controller, probe, _store, _dir) = controller().await;

    controller.dispatch(Intent::OpenCamera).await;
    assert_eq!(controller.state(), UiState::CameraActive);
    assert!(controller.visible_controls().contains(Control::LivePreview));

    controller.dispatch(Intent::FlipCamera).await;
    assert_eq!(controller.state(), UiState::CameraActive);
    assert_eq!(controller.camera().facing_mode(), FacingMode::User);
    assert_eq!(probe.opens(), 2);
    assert_eq!(probe.closes(), 1);
    assert_eq!(probe.max_live(), 1);
}

#[tokio::test]
async fn test_permission_denied_reverts_to_idle_with_one_notice() {
    let (mut controller, probe, _store, _dir) = controller().await;
    probe.fail_next_open(BackendError::PermissionDenied("refused".into()));

    controller.dispatch(Intent::OpenCamera).await;

    assert_eq!(controller.state(), UiState::Idle);
    assert!(controller.camera().session().is_none());
    assert_eq!(controller.pending_notices(), 1);
    assert_eq!(controller.take_notice(), Some(Notice::PermissionDenied));
    assert!(controller.visible_controls().contains(Control::OpenCamera));
}

#[tokio::test]
async fn test_flip_failure_reverts_to_idle() {
    let (mut controller, probe, _store, _dir) = controller().await;
    controller.dispatch(Intent::OpenCamera).await;
    probe.fail_next_open(BackendError::DeviceNotFound("no front camera".into()));

    controller.dispatch(Intent::FlipCamera).await;

    assert_eq!(controller.state(), UiState::Idle);
    assert!(!controller.camera().is_open());
    assert!(matches!(
        controller.take_notice(),
        Some(Notice::CameraUnavailable(_))
    ));
    assert_eq!(probe.live(), 0);
}

#[tokio::test]
async fn test_intents_in_wrong_state_are_ignored() {
    let (mut controller, probe, _store, _dir) = controller().await;

    controller.dispatch(Intent::TakePhoto).await;
    controller.dispatch(Intent::FlipCamera).await;
    controller.dispatch(Intent::RetakePhoto).await;
    assert_eq!(controller.state(), UiState::Idle);
    assert_eq!(probe.opens(), 0);
    assert_eq!(controller.pending_notices(), 0);

    controller.dispatch(Intent::OpenCamera).await;
    controller.dispatch(Intent::OpenCamera).await;
    controller.dispatch(Intent::RetakePhoto).await;
    assert_eq!(probe.opens(), 1);
}

#[tokio::test]
async fn test_capture_shows_photo_and_persists() {
    let (mut controller, probe, store, _dir) = controller().await;
    controller.dispatch(Intent::OpenCamera).await;

    controller.dispatch(Intent::TakePhoto).await;

    assert_eq!(controller.state(), UiState::PhotoTaken);
    assert_eq!(probe.live(), 0);
    let photo = controller.last_photo().unwrap();
    assert_eq!(photo.key.to_string(), "photo-1000.png");
    assert_eq!((photo.width, photo.height), (1280, 720));

    let controls = controller.visible_controls();
    assert!(controls.contains(Control::PhotoDisplay));
    assert!(controls.contains(Control::RetakePhoto));
    assert!(controls.contains(Control::Gallery));

    let entry = controller.gallery().last().unwrap().clone();
    assert_eq!(entry.origin, EntryOrigin::Captured);

    controller.flush_pending().await;
    let stored = store.get_by_key("photo-1000.png").await.unwrap();
    assert_eq!(stored.as_slice(), &*entry.image);
}

#[tokio::test]
async fn test_retake_reopens_with_current_facing() {
    let (mut controller, probe, _store, _dir) = controller().await;
    controller.dispatch(Intent::OpenCamera).await;
    controller.dispatch(Intent::FlipCamera).await;
    controller.dispatch(Intent::TakePhoto).await;

    controller.dispatch(Intent::RetakePhoto).await;

    assert_eq!(controller.state(), UiState::CameraActive);
    assert_eq!(probe.facings().last(), Some(&FacingMode::User));
    assert_eq!(probe.live(), 1);
}

#[tokio::test]
async fn test_capture_failure_returns_to_idle() {
    let (mut controller, probe, _store, _dir) = controller().await;
    controller.dispatch(Intent::OpenCamera).await;
    probe.fail_next_frame(BackendError::NoFrame("stalled".into()));

    controller.dispatch(Intent::TakePhoto).await;

    assert_eq!(controller.state(), UiState::Idle);
    assert!(controller.gallery().is_empty());
    assert!(matches!(
        controller.take_notice(),
        Some(Notice::CaptureFailed(_))
    ));
}

#[tokio::test]
async fn test_unavailable_store_keeps_photo_in_session() {
    let (manager, _probe) = fake_manager();
    let mut controller = UiController::new(manager, PhotoStore::unavailable());

    controller.dispatch(Intent::OpenCamera).await;
    controller.dispatch(Intent::TakePhoto).await;
    controller.flush_pending().await;

    assert_eq!(controller.state(), UiState::PhotoTaken);
    assert_eq!(controller.gallery().len(), 1);
    assert_eq!(controller.pending_notices(), 0);
}

#[tokio::test]
async fn test_two_captures_append_in_order() {
    let (manager, _probe) = fake_manager();
    let (store, _storage, _dir) = temp_store().await;
    let (keys, clock) = manual_keys(1000);
    let mut controller = UiController::new(manager, store.clone()).with_key_generator(keys);

    controller.dispatch(Intent::OpenCamera).await;
    controller.dispatch(Intent::TakePhoto).await;
    clock.store(2000, Ordering::SeqCst);
    controller.dispatch(Intent::RetakePhoto).await;
    controller.dispatch(Intent::TakePhoto).await;
    controller.flush_pending().await;

    let keys: Vec<_> = controller
        .gallery()
        .entries()
        .iter()
        .map(|e| e.key.clone())
        .collect();
    assert_eq!(keys, ["photo-1000.png", "photo-2000.png"]);

    let mut stored = store.list_keys().await;
    stored.sort();
    assert_eq!(stored, ["photo-1000.png", "photo-2000.png"]);
}

#[tokio::test]
async fn test_startup_load_appends_every_stored_photo() {
    let (store, _storage, _dir) = temp_store().await;
    store.put("photo-1000.png", vec![1]).await.unwrap();
    store.put("photo-2000.png", vec![2]).await.unwrap();
    store.put("./help.txt", b"not a photo".to_vec()).await.unwrap();

    let (manager, _probe) = fake_manager();
    let mut controller = UiController::new(manager, store);
    let loaded = controller.load_gallery().await;

    assert_eq!(loaded, 2);
    assert_eq!(controller.state(), UiState::Idle);
    assert_eq!(controller.gallery().len(), 2);
    assert!(
        controller
            .gallery()
            .entries()
            .iter()
            .all(|e| e.origin == EntryOrigin::Stored)
    );
    assert!(controller.visible_controls().contains(Control::Gallery));
}

#[tokio::test]
async fn test_teardown_closes_camera() {
    let (mut controller, probe, _store, _dir) = controller().await;
    controller.dispatch(Intent::OpenCamera).await;

    controller.teardown().await;
    controller.teardown().await;

    assert!(!controller.camera().is_open());
    assert_eq!(probe.live(), 0);
}

#[tokio::test]
async fn test_teardown_after_aborting_a_pending_open() {
    let (mut controller, probe, _store, _dir) = controller().await;
    probe.hang_open.store(true, Ordering::SeqCst);

    let abort = controller.camera().abort_handle();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        abort.abort();
    });

    controller.dispatch(Intent::OpenCamera).await;
    controller.teardown().await;

    assert_eq!(controller.state(), UiState::Idle);
    assert_eq!(controller.pending_notices(), 0);
    assert!(!controller.camera().is_open());
    assert_eq!(probe.live(), 0);
}

#[tokio::test]
async fn test_gallery_loads_only_once() {
    let (store, _storage, _dir) = temp_store().await;
    store.put("photo-1000.png", vec![1]).await.unwrap();
    store.put("photo-2000.png", vec![2]).await.unwrap();

    let (manager, _probe) = fake_manager();
    let mut controller = UiController::new(manager, store);

    assert_eq!(controller.load_gallery().await, 2);
    assert_eq!(controller.load_gallery().await, 0);
    assert_eq!(controller.gallery().len(), 2);
}

#[tokio::test]
async fn test_app_context_start() {
    let dir = tempfile::tempdir().unwrap();
    {
        let storage = CacheStorage::open(dir.path()).await.unwrap();
        storage.open_cache("camara-shell-v3").await.unwrap();
        let store = PhotoStore::open(&storage, TEST_CACHE).await;
        store.put("photo-1000.png", vec![7]).await.unwrap();
    }

    let config = Config {
        storage_root: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    let (backend, _probe) = fake_backend();
    let ctx = AppContext::start(&config, backend).await;

    assert!(ctx.shell.is_some());
    assert_eq!(ctx.controller.gallery().len(), 1);

    let storage = CacheStorage::open(dir.path()).await.unwrap();
    let mut caches = storage.keys().await.unwrap();
    caches.sort();
    assert_eq!(caches, [DYNAMIC_CACHE_NAME, SHELL_CACHE_NAME]);
}

#[tokio::test]
async fn test_app_context_without_storage() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let config = Config {
        storage_root: Some(blocker),
        ..Config::default()
    };
    let (backend, _probe) = fake_backend();
    let ctx = AppContext::start(&config, backend).await;

    assert!(ctx.shell.is_none());
    assert!(!ctx.controller.store().is_available());
    assert!(ctx.controller.gallery().is_empty());
}

// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the camera session manager

mod common;

use camara::backends::camera::file_source::StillImageBackend;
use camara::backends::camera::{BackendError, CameraSessionManager, FacingMode, Resolution};
use camara::errors::CameraError;
use common::{fake_manager, write_png};
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn test_open_reports_negotiated_resolution() {
    let (mut manager, probe) = fake_manager();

    let session = manager.open(FacingMode::Environment).await.unwrap();

    assert_eq!(session.negotiated_resolution, Resolution::new(1280, 720));
    assert_eq!(session.device.name, "Back Camera");
    assert!(manager.is_open());
    assert_eq!(probe.live(), 1);
}

#[tokio::test]
async fn test_open_prefers_matching_facing() {
    let (mut manager, _probe) = fake_manager();
    let session = manager.open(FacingMode::User).await.unwrap();
    assert_eq!(session.device.name, "Front Camera");
    assert_eq!(session.facing_mode, FacingMode::User);
}

#[tokio::test]
async fn test_reopen_closes_previous_session_first() {
    let (mut manager, probe) = fake_manager();

    manager.open(FacingMode::Environment).await.unwrap();
    manager.open(FacingMode::Environment).await.unwrap();
    manager.open(FacingMode::User).await.unwrap();

    assert_eq!(probe.opens(), 3);
    assert_eq!(probe.closes(), 2);
    assert_eq!(probe.max_live(), 1, "two streams were live at once");
}

#[tokio::test]
async fn test_flip_toggles_facing_and_reopens() {
    let (mut manager, probe) = fake_manager();
    manager.open(FacingMode::Environment).await.unwrap();

    let session = manager.flip().await.unwrap();

    assert_eq!(session.facing_mode, FacingMode::User);
    assert_eq!(manager.facing_mode(), FacingMode::User);
    assert_eq!(probe.closes(), 1);
    assert_eq!(
        probe.facings(),
        vec![FacingMode::Environment, FacingMode::User]
    );
    assert_eq!(probe.max_live(), 1);
}

#[tokio::test]
async fn test_capture_uses_negotiated_resolution() {
    // Frames arrive at 640x360, the stream negotiated 1280x720
    let (mut manager, _probe) = fake_manager();
    manager.open(FacingMode::Environment).await.unwrap();

    let encoded = manager.capture_frame().await.unwrap();

    assert_eq!((encoded.width, encoded.height), (1280, 720));
    let decoded = image::load_from_memory(&encoded.data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1280, 720));
}

#[tokio::test]
async fn test_capture_ends_session() {
    let (mut manager, probe) = fake_manager();
    manager.open(FacingMode::Environment).await.unwrap();

    manager.capture_frame().await.unwrap();

    assert!(!manager.is_open());
    assert_eq!(probe.live(), 0);
}

#[tokio::test]
async fn test_capture_without_session() {
    let (mut manager, _probe) = fake_manager();
    assert_eq!(
        manager.capture_frame().await.unwrap_err(),
        CameraError::NoActiveSession
    );
}

#[tokio::test]
async fn test_capture_failure_still_closes() {
    let (mut manager, probe) = fake_manager();
    manager.open(FacingMode::Environment).await.unwrap();
    probe.fail_next_frame(BackendError::NoFrame("no frame yet".into()));

    let err = manager.capture_frame().await.unwrap_err();

    assert!(matches!(err, CameraError::CaptureFailed(_)));
    assert!(!manager.is_open());
    assert_eq!(probe.live(), 0);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (mut manager, probe) = fake_manager();
    manager.close();
    manager.open(FacingMode::Environment).await.unwrap();
    manager.close();
    manager.close();

    assert!(manager.session().is_none());
    assert_eq!(probe.closes(), 1);
}

#[tokio::test]
async fn test_permission_denied() {
    let (mut manager, probe) = fake_manager();
    probe.fail_next_open(BackendError::PermissionDenied("portal refused".into()));

    let err = manager.open(FacingMode::Environment).await.unwrap_err();

    assert_eq!(err, CameraError::PermissionDenied);
    assert!(manager.session().is_none());
    assert_eq!(probe.live(), 0);
}

#[tokio::test]
async fn test_abort_cancels_pending_open() {
    let (mut manager, probe) = fake_manager();
    probe.hang_open.store(true, Ordering::SeqCst);

    let abort = manager.abort_handle();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        abort.abort();
    });

    let err = manager.open(FacingMode::Environment).await.unwrap_err();
    assert_eq!(err, CameraError::Cancelled);
    assert!(!manager.is_open());
}

#[tokio::test]
async fn test_abort_before_open_cancels_it() {
    let (mut manager, probe) = fake_manager();

    manager.abort_handle().abort();
    let err = manager.open(FacingMode::Environment).await.unwrap_err();

    assert_eq!(err, CameraError::Cancelled);
    assert_eq!(probe.opens(), 0);
    assert!(!manager.is_open());

    // The abort is spent on the cancelled open
    manager.open(FacingMode::Environment).await.unwrap();
    assert_eq!(probe.live(), 1);
}

#[tokio::test]
async fn test_open_after_aborted_negotiation_succeeds() {
    let (mut manager, probe) = fake_manager();
    probe.hang_open.store(true, Ordering::SeqCst);

    let abort = manager.abort_handle();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        abort.abort();
    });
    assert_eq!(
        manager.open(FacingMode::Environment).await.unwrap_err(),
        CameraError::Cancelled
    );

    probe.hang_open.store(false, Ordering::SeqCst);
    manager.open(FacingMode::Environment).await.unwrap();
    assert!(manager.is_open());
}

#[tokio::test]
async fn test_still_image_backend_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("source.png");
    write_png(&path, 320, 240);

    let mut manager =
        CameraSessionManager::new(Box::new(StillImageBackend::new(path)), FacingMode::User);
    let session = manager.open(FacingMode::User).await.unwrap();
    assert_eq!(session.negotiated_resolution, Resolution::new(320, 240));

    let encoded = manager.capture_frame().await.unwrap();
    assert_eq!((encoded.width, encoded.height), (320, 240));
}

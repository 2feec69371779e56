// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a single photo into the photo cache
//! - Listing or exporting the stored photos

use camara::app::{AppContext, Intent, UiState};
use camara::backends::camera::get_backend;
use camara::config::Config;
use camara::errors::AppError;
use camara::storage::{CacheStorage, PhotoKey, PhotoStore};
use std::path::Path;

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend = get_backend(config.backend, config.still_image_path.clone());
    if !backend.is_available() {
        return Err(format!("{} backend is not available", backend.backend_type()).into());
    }

    let cameras = backend.enumerate_cameras();
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Location: {:?}", camera.location);
        if !camera.path.is_empty() {
            println!("      Path: {}", camera.path);
        }
    }

    Ok(())
}

/// Open the camera, take one photo and store it in the photo cache
pub async fn take_photo(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend = get_backend(config.backend, config.still_image_path.clone());
    let mut ctx = AppContext::start(config, backend).await;

    // Ctrl+C aborts a pending camera negotiation
    let abort = ctx.controller.camera().abort_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nCancelling...");
        abort.abort();
    })?;

    println!("Opening camera ({})...", config.default_facing);
    ctx.controller.dispatch(Intent::OpenCamera).await;
    if let Some(session) = ctx.controller.camera().session() {
        println!(
            "Using camera: {} at {}",
            session.device.name, session.negotiated_resolution
        );
    }

    ctx.controller.dispatch(Intent::TakePhoto).await;
    let taken = ctx
        .controller
        .last_photo()
        .filter(|_| ctx.controller.state() == UiState::PhotoTaken)
        .map(|photo| format!("{} ({}x{})", photo.key, photo.width, photo.height));
    let outcome = match taken {
        Some(summary) => {
            println!("Photo taken: {}", summary);
            Ok(())
        }
        None => Err(ctx
            .controller
            .take_notice()
            .map(|notice| notice.to_string())
            .unwrap_or_else(|| "Camera open cancelled".to_string())),
    };

    ctx.controller.teardown().await;
    if !ctx.controller.store().is_available() {
        eprintln!("Warning: photo storage is unavailable, the photo was not saved");
    }

    outcome.map_err(|msg| AppError::Other(msg).into())
}

/// List stored photos, optionally exporting them to `export`
pub async fn gallery(
    config: &Config,
    export: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = CacheStorage::open(config.storage_root()).await?;
    let store = PhotoStore::open(&storage, &config.dynamic_cache).await;

    let mut keys: Vec<PhotoKey> = store
        .list_keys()
        .await
        .iter()
        .filter_map(|key| PhotoKey::parse(key))
        .collect();
    keys.sort();

    if keys.is_empty() {
        println!("No photos stored.");
        return Ok(());
    }

    if let Some(dir) = export {
        tokio::fs::create_dir_all(dir).await?;
    }

    for key in keys {
        let taken = chrono::DateTime::from_timestamp_millis(key.millis())
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!("  {}  {}", key, taken);

        if let Some(dir) = export {
            let bytes = store.get_by_key(&key.to_string()).await?;
            let path = dir.join(key.to_string());
            tokio::fs::write(&path, bytes).await?;
            println!("      exported to {}", path.display());
        }
    }

    Ok(())
}

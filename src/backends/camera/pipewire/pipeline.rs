// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire GStreamer pipeline for camera capture

use super::super::types::*;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Most recent frame delivered by the appsink
type LatestFrame = Arc<Mutex<Option<CameraFrame>>>;

/// Build the gst-launch description for a device
///
/// No resolution is requested: the device picks its natural mode and the
/// pipeline reports back what it negotiated.
pub fn pipeline_description(device: &CameraDevice) -> String {
    let target = device
        .path
        .strip_prefix("pipewire-serial-")
        .or_else(|| device.path.strip_prefix("pipewire-"))
        .filter(|t| !t.is_empty());

    let source = match target {
        Some(t) => format!("pipewiresrc target-object={} do-timestamp=true", t),
        None => "pipewiresrc do-timestamp=true".to_string(),
    };

    format!(
        "{} ! decodebin ! videoconvert n-threads={} ! video/x-raw,format={} ! appsink name=sink",
        source,
        pipeline::videoconvert_threads(),
        pipeline::OUTPUT_FORMAT
    )
}

/// Map a GStreamer error message to a backend error
fn classify_gst_error(err: &gstreamer::glib::Error) -> BackendError {
    match err.kind::<gstreamer::ResourceError>() {
        Some(gstreamer::ResourceError::NotAuthorized) => {
            BackendError::PermissionDenied(err.to_string())
        }
        Some(gstreamer::ResourceError::NotFound) => BackendError::DeviceNotFound(err.to_string()),
        _ => BackendError::InitializationFailed(err.to_string()),
    }
}

/// PipeWire camera pipeline
///
/// Owns a playing `pipewiresrc ! … ! appsink` pipeline and keeps the latest
/// RGBA frame around for preview and capture.
pub struct PipeWirePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    latest: LatestFrame,
    resolution: Resolution,
}

impl PipeWirePipeline {
    /// Start a pipeline and wait for the first frame
    ///
    /// There is no deadline: a pending portal permission prompt keeps this
    /// blocked until it is answered, the pipeline errors, or `abort` is set.
    pub fn start(device: &CameraDevice, abort: &AbortFlag) -> BackendResult<Self> {
        info!(device = %device.name, "Creating PipeWire pipeline");

        gstreamer::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;

        let description = pipeline_description(device);
        debug!(%description, "Launching pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| BackendError::InitializationFailed("Not a pipeline".into()))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".into()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| BackendError::InitializationFailed("Failed to cast appsink".into()))?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);

        let latest: LatestFrame = Arc::new(Mutex::new(None));
        let (first_tx, first_rx) = mpsc::channel::<Resolution>();
        let first_tx = Mutex::new(Some(first_tx));
        let slot = Arc::clone(&latest);

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
                    let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
                    let frame = frame_from_sample(&sample).map_err(|e| {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            error!(frame = frame_num, error = %e, "Dropping unreadable sample");
                        }
                        gstreamer::FlowError::Error
                    })?;

                    let resolution = frame.resolution();
                    if let Ok(mut slot) = slot.lock() {
                        *slot = Some(frame);
                    }
                    if let Some(tx) = first_tx.lock().ok().and_then(|mut tx| tx.take()) {
                        let _ = tx.send(resolution);
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| BackendError::InitializationFailed(format!("Failed to start: {}", e)))?;

        let bus = pipeline
            .bus()
            .ok_or_else(|| BackendError::InitializationFailed("No bus on pipeline".into()))?;

        let resolution = loop {
            if abort.is_aborted() {
                info!("Stream negotiation aborted");
                let _ = pipeline.set_state(gstreamer::State::Null);
                return Err(BackendError::Cancelled);
            }

            match first_rx.recv_timeout(timing::NEGOTIATION_POLL_INTERVAL) {
                Ok(resolution) => break resolution,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    let _ = pipeline.set_state(gstreamer::State::Null);
                    return Err(BackendError::InitializationFailed(
                        "Stream ended before the first frame".into(),
                    ));
                }
            }

            if let Some(msg) =
                bus.pop_filtered(&[gstreamer::MessageType::Error, gstreamer::MessageType::Eos])
            {
                let err = match msg.view() {
                    gstreamer::MessageView::Error(err) => {
                        warn!(
                            error = %err.error(),
                            debug = ?err.debug(),
                            "GStreamer error during negotiation"
                        );
                        classify_gst_error(&err.error())
                    }
                    _ => BackendError::InitializationFailed("End of stream".into()),
                };
                let _ = pipeline.set_state(gstreamer::State::Null);
                return Err(err);
            }
        };

        info!(%resolution, "PipeWire stream negotiated");

        Ok(Self {
            pipeline,
            appsink,
            latest,
            resolution,
        })
    }

    /// Resolution reported by the first decoded frame
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Latest decoded frame, if any
    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.latest.lock().ok().and_then(|f| f.clone())
    }

    /// Stop streaming and release the device
    pub fn stop(&self) {
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to stop pipeline");
            return;
        }

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, "PipeWire pipeline stopped");
    }
}

impl Drop for PipeWirePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Copy an RGBA sample into an owned frame
fn frame_from_sample(sample: &gstreamer::Sample) -> BackendResult<CameraFrame> {
    let caps = sample
        .caps()
        .ok_or_else(|| BackendError::NoFrame("No caps on sample".into()))?;
    let info = VideoInfo::from_caps(caps).map_err(|e| BackendError::NoFrame(e.to_string()))?;
    let buffer = sample
        .buffer()
        .ok_or_else(|| BackendError::NoFrame("No buffer in sample".into()))?;
    let map = buffer
        .map_readable()
        .map_err(|_| BackendError::NoFrame("Failed to map buffer".into()))?;

    Ok(CameraFrame {
        width: info.width(),
        height: info.height(),
        data: Arc::from(map.as_slice()),
        stride: info.stride()[0] as u32,
        captured_at: Instant::now(),
    })
}

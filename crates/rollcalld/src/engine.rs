//! Engine worker thread.
//!
//! One OS thread owns the camera and the ONNX sessions — the capture device
//! is exclusive per in-flight operation, so enrollment and recognition
//! requests serialize through a bounded queue. A full queue rejects the
//! caller immediately as busy instead of stacking latency behind a running
//! capture session.

use crate::clock::SystemClock;
use crate::config::Config;
use crate::enroll::{self, EnrollError, Enrollment};
use crate::recognize::{self, RecognizeError, RecognizeOutcome};
use rollcall_core::Identity;
use rollcall_extract::{OnnxExtractor, OnnxExtractorError};
use rollcall_hw::{Camera, CameraError};
use rollcall_store::Db;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

/// Pending requests allowed before callers are turned away busy.
const QUEUE_DEPTH: usize = 4;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("extractor error: {0}")]
    Extractor(#[from] OnnxExtractorError),
}

/// Messages sent from D-Bus handlers to the engine thread.
enum EngineRequest {
    Enroll {
        identity: Identity,
        image: Vec<u8>,
        reply: oneshot::Sender<Result<Enrollment, EnrollError>>,
    },
    Recognize {
        reply: oneshot::Sender<Result<RecognizeOutcome, RecognizeError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Queue an enrollment. Fails fast with `DeviceBusy` when the queue is
    /// already full of in-flight capture sessions.
    pub async fn enroll(
        &self,
        identity: Identity,
        image: Vec<u8>,
    ) -> Result<Enrollment, EnrollError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .try_send(EngineRequest::Enroll {
                identity,
                image,
                reply: reply_tx,
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => EnrollError::DeviceBusy,
                TrySendError::Closed(_) => EnrollError::EngineStopped,
            })?;
        reply_rx.await.map_err(|_| EnrollError::EngineStopped)?
    }

    /// Queue a recognition session.
    pub async fn recognize(&self) -> Result<RecognizeOutcome, RecognizeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .try_send(EngineRequest::Recognize { reply: reply_tx })
            .map_err(|e| match e {
                TrySendError::Full(_) => RecognizeError::DeviceBusy,
                TrySendError::Closed(_) => RecognizeError::EngineStopped,
            })?;
        reply_rx.await.map_err(|_| RecognizeError::EngineStopped)?
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Opens the camera, loads both ONNX models, discards warmup frames, then
/// enters the request loop. Fails fast at startup if any resource is
/// unavailable.
pub fn spawn_engine(config: &Config, db: Arc<Db>) -> Result<EngineHandle, EngineError> {
    let mut camera = Camera::open(&config.camera_device)?;

    let mut extractor = OnnxExtractor::load(
        &config.detector_model_path(),
        &config.embedder_model_path(),
    )?;

    // Discard warmup frames for camera AGC/AE stabilization.
    if config.warmup_frames > 0 {
        tracing::info!(count = config.warmup_frames, "discarding warmup frames");
        for _ in 0..config.warmup_frames {
            let _ = camera.capture_frame();
        }
    }

    let threshold = config.match_threshold;
    let timeout = Duration::from_secs(config.recognize_timeout_secs);
    let faces_dir: PathBuf = config.faces_dir.clone();

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(QUEUE_DEPTH);

    std::thread::Builder::new()
        .name("rollcall-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            let clock = SystemClock;
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Enroll {
                        identity,
                        image,
                        reply,
                    } => {
                        let result = enroll::enroll(
                            &mut extractor,
                            &db,
                            &faces_dir,
                            &identity,
                            &image,
                            threshold,
                        );
                        let _ = reply.send(result);
                    }
                    EngineRequest::Recognize { reply } => {
                        let result = recognize::recognize(
                            &mut camera,
                            &mut extractor,
                            &db,
                            threshold,
                            timeout,
                            &clock,
                        );
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .expect("failed to spawn engine thread");

    Ok(EngineHandle { tx })
}

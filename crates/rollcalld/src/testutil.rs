//! Shared scripted doubles for workflow tests.

use crate::clock::Clock;
use rollcall_core::{
    DetectedFace, ExtractorError, FaceRegion, Identity, LandmarkSet, Point, Signature,
    SignatureExtractor,
};
use rollcall_hw::{CameraError, CaptureSource, Frame};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub fn sig(values: &[f64]) -> Signature {
    Signature::new(values.to_vec())
}

pub fn identity(roll: &str, department: &str, class: &str, semester: &str) -> Identity {
    Identity {
        display_name: format!("Student {roll}"),
        roll_number: roll.into(),
        department: department.into(),
        class: class.into(),
        semester: semester.into(),
    }
}

fn full_landmarks() -> LandmarkSet {
    let pt = |x, y| Point { x, y };
    LandmarkSet {
        chin: vec![pt(5.0, 9.0)],
        left_eye: vec![pt(3.0, 3.0)],
        right_eye: vec![pt(7.0, 3.0)],
        nose_bridge: vec![pt(5.0, 4.0)],
        nose_tip: vec![pt(5.0, 5.0)],
        top_lip: vec![pt(5.0, 7.0)],
        bottom_lip: vec![pt(5.0, 8.0)],
    }
}

pub fn face(signature: Signature) -> DetectedFace {
    DetectedFace {
        region: FaceRegion {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            confidence: 0.9,
        },
        landmarks: Some(full_landmarks()),
        signature,
    }
}

/// A face whose mouth landmarks were not located (mask on).
pub fn obstructed_face(signature: Signature) -> DetectedFace {
    let mut landmarks = full_landmarks();
    landmarks.top_lip.clear();
    landmarks.bottom_lip.clear();
    DetectedFace {
        landmarks: Some(landmarks),
        ..face(signature)
    }
}

/// A tiny 8x8 grayscale PNG.
pub fn encoded_gray_png() -> Vec<u8> {
    let img = image::GrayImage::from_pixel(8, 8, image::Luma([128u8]));
    let mut bytes = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
    )
    .unwrap();
    bytes
}

pub fn test_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rollcalld-test-{}-{name}", std::process::id()))
}

pub fn bright_frame() -> Frame {
    Frame {
        data: vec![128u8; 64],
        width: 8,
        height: 8,
        timestamp: Instant::now(),
        sequence: 0,
    }
}

pub fn dark_frame() -> Frame {
    Frame {
        data: vec![0u8; 64],
        width: 8,
        height: 8,
        timestamp: Instant::now(),
        sequence: 0,
    }
}

/// Capture source that plays back a fixed frame script.
pub struct ScriptedCapture {
    frames: VecDeque<Frame>,
    endless: Option<Frame>,
}

impl ScriptedCapture {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            endless: None,
        }
    }

    /// Repeats `frame` forever.
    pub fn endless(frame: Frame) -> Self {
        Self {
            frames: VecDeque::new(),
            endless: Some(frame),
        }
    }
}

impl CaptureSource for ScriptedCapture {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        if let Some(frame) = self.frames.pop_front() {
            return Ok(frame);
        }
        match &self.endless {
            Some(frame) => Ok(frame.clone()),
            None => Err(CameraError::CaptureFailed("frame script exhausted".into())),
        }
    }
}

/// Extractor that plays back scripted per-frame results.
pub struct StubExtractor {
    script: Mutex<VecDeque<Vec<DetectedFace>>>,
    calls: AtomicUsize,
}

impl StubExtractor {
    pub fn scripted(script: Vec<Vec<DetectedFace>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Never detects a face.
    pub fn always_empty() -> Self {
        Self::scripted(vec![])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SignatureExtractor for StubExtractor {
    fn extract(
        &mut self,
        _gray: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<DetectedFace>, ExtractorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        Ok(next.unwrap_or_default())
    }
}

/// Deterministic clock that advances a fixed step on every reading.
pub struct MockClock {
    current: Mutex<Instant>,
    step: Duration,
}

impl MockClock {
    pub fn stepping_millis(step_ms: u64) -> Self {
        Self {
            current: Mutex::new(Instant::now()),
            step: Duration::from_millis(step_ms),
        }
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        let mut current = self.current.lock().unwrap();
        let reading = *current;
        *current += self.step;
        reading
    }
}

//! ONNX Runtime signature extraction pipeline.
//!
//! Two sessions: a face detector that also regresses 68 landmark points with
//! per-point confidences (NMS baked into the exported graph), and an
//! embedder that maps a cropped face to a 128-dimensional signature.

use crate::landmarks::{self, LANDMARK_COUNT, MIN_GROUP_SCORE};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use rollcall_core::{
    DetectedFace, ExtractorError, FaceRegion, Point, Signature, SignatureExtractor,
};
use std::path::Path;
use thiserror::Error;

const DETECT_INPUT_SIZE: usize = 320;
const DETECT_MEAN: f32 = 127.5;
const DETECT_STD: f32 = 128.0;
const DETECT_CONFIDENCE_THRESHOLD: f32 = 0.5;

const EMBED_INPUT_SIZE: usize = 112;
const EMBED_MEAN: f32 = 127.5;
const EMBED_STD: f32 = 127.5;

/// Signature dimensionality produced by the embedder.
pub const SIGNATURE_DIM: usize = 128;

#[derive(Error, Debug)]
pub enum OnnxExtractorError {
    #[error("model file not found: {0} — place detector and embedder models in the model dir")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Production [`SignatureExtractor`] backed by ONNX Runtime CPU inference.
pub struct OnnxExtractor {
    detector: Session,
    embedder: Session,
}

impl OnnxExtractor {
    /// Load both ONNX models, failing fast if either file is missing.
    pub fn load(detector_path: &str, embedder_path: &str) -> Result<Self, OnnxExtractorError> {
        for path in [detector_path, embedder_path] {
            if !Path::new(path).exists() {
                return Err(OnnxExtractorError::ModelNotFound(path.to_string()));
            }
        }

        let detector = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(detector_path)?;
        tracing::info!(path = detector_path, "detector model loaded");

        let embedder = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(embedder_path)?;
        tracing::info!(path = embedder_path, "embedder model loaded");

        Ok(Self { detector, embedder })
    }

    /// Run detection on a grayscale frame.
    ///
    /// Detector outputs, per retained face: a box row `[x1, y1, x2, y2,
    /// score]` in input-scale coordinates, 68 landmark points, and 68
    /// per-point confidences.
    fn detect(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<(FaceRegion, Vec<Point>, Vec<f32>)>, OnnxExtractorError> {
        let input = preprocess(
            gray,
            width as usize,
            height as usize,
            DETECT_INPUT_SIZE,
            DETECT_MEAN,
            DETECT_STD,
        );

        let outputs = self
            .detector
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, boxes) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| OnnxExtractorError::InferenceFailed(format!("boxes: {e}")))?;
        let (_, points) = outputs[1]
            .try_extract_tensor::<f32>()
            .map_err(|e| OnnxExtractorError::InferenceFailed(format!("landmarks: {e}")))?;
        let (_, scores) = outputs[2]
            .try_extract_tensor::<f32>()
            .map_err(|e| OnnxExtractorError::InferenceFailed(format!("landmark scores: {e}")))?;

        let n = boxes.len() / 5;
        if points.len() != n * LANDMARK_COUNT * 2 || scores.len() != n * LANDMARK_COUNT {
            return Err(OnnxExtractorError::InferenceFailed(format!(
                "inconsistent detector outputs: {n} boxes, {} landmark values, {} scores",
                points.len(),
                scores.len()
            )));
        }

        // Map input-scale coordinates back to frame pixels.
        let sx = width as f32 / DETECT_INPUT_SIZE as f32;
        let sy = height as f32 / DETECT_INPUT_SIZE as f32;

        let mut faces = Vec::new();
        for i in 0..n {
            let row = &boxes[i * 5..i * 5 + 5];
            let confidence = row[4];
            if confidence < DETECT_CONFIDENCE_THRESHOLD {
                continue;
            }

            let region = FaceRegion {
                x: row[0] * sx,
                y: row[1] * sy,
                width: (row[2] - row[0]) * sx,
                height: (row[3] - row[1]) * sy,
                confidence,
            };

            let pts: Vec<Point> = (0..LANDMARK_COUNT)
                .map(|j| {
                    let base = (i * LANDMARK_COUNT + j) * 2;
                    Point {
                        x: points[base] * sx,
                        y: points[base + 1] * sy,
                    }
                })
                .collect();
            let point_scores = scores[i * LANDMARK_COUNT..(i + 1) * LANDMARK_COUNT].to_vec();

            faces.push((region, pts, point_scores));
        }

        // Highest-confidence face first: workflows treat index 0 as primary.
        faces.sort_by(|a, b| b.0.confidence.total_cmp(&a.0.confidence));
        Ok(faces)
    }

    /// Crop the face region, resize to the embedder input, and run inference.
    fn embed(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
        region: &FaceRegion,
    ) -> Result<Signature, OnnxExtractorError> {
        let crop = crop_gray(gray, width as usize, height as usize, region);
        let input = preprocess(
            &crop.data,
            crop.width,
            crop.height,
            EMBED_INPUT_SIZE,
            EMBED_MEAN,
            EMBED_STD,
        );

        let outputs = self
            .embedder
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| OnnxExtractorError::InferenceFailed(format!("embedding: {e}")))?;

        if raw.len() != SIGNATURE_DIM {
            return Err(OnnxExtractorError::InferenceFailed(format!(
                "expected {SIGNATURE_DIM}-dim signature, got {}",
                raw.len()
            )));
        }

        Ok(Signature::new(raw.iter().map(|&v| v as f64).collect()))
    }
}

impl SignatureExtractor for OnnxExtractor {
    fn extract(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<DetectedFace>, ExtractorError> {
        let expected = (width * height) as usize;
        if gray.len() < expected {
            return Err(ExtractorError::BadFrame {
                expected,
                actual: gray.len(),
            });
        }

        let detections = self
            .detect(gray, width, height)
            .map_err(|e| ExtractorError::InferenceFailed(e.to_string()))?;

        let mut faces = Vec::with_capacity(detections.len());
        for (region, points, scores) in detections {
            let signature = self
                .embed(gray, width, height, &region)
                .map_err(|e| ExtractorError::InferenceFailed(e.to_string()))?;
            let landmarks = landmarks::group_landmarks(&points, &scores, MIN_GROUP_SCORE);
            faces.push(DetectedFace {
                region,
                landmarks,
                signature,
            });
        }

        tracing::debug!(count = faces.len(), "extraction complete");
        Ok(faces)
    }
}

struct GrayCrop {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

/// Cut the face region out of the frame, clamped to frame bounds.
fn crop_gray(gray: &[u8], width: usize, height: usize, region: &FaceRegion) -> GrayCrop {
    if width == 0 || height == 0 {
        return GrayCrop {
            data: Vec::new(),
            width: 0,
            height: 0,
        };
    }
    let x0 = (region.x.max(0.0) as usize).min(width.saturating_sub(1));
    let y0 = (region.y.max(0.0) as usize).min(height.saturating_sub(1));
    let x1 = ((region.x + region.width).max(0.0) as usize).clamp(x0 + 1, width);
    let y1 = ((region.y + region.height).max(0.0) as usize).clamp(y0 + 1, height);

    let cw = x1 - x0;
    let ch = y1 - y0;
    let mut data = Vec::with_capacity(cw * ch);
    for y in y0..y1 {
        data.extend_from_slice(&gray[y * width + x0..y * width + x1]);
    }
    GrayCrop {
        data,
        width: cw,
        height: ch,
    }
}

/// Nearest-neighbour resize to a square `size`, then normalize into a
/// 1x3xNxN tensor with the grayscale channel replicated.
fn preprocess(
    gray: &[u8],
    width: usize,
    height: usize,
    size: usize,
    mean: f32,
    std: f32,
) -> Array4<f32> {
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    if width == 0 || height == 0 {
        return tensor;
    }

    for y in 0..size {
        let sy = (y * height / size).min(height - 1);
        for x in 0..size {
            let sx = (x * width / size).min(width - 1);
            let pixel = gray.get(sy * width + sx).copied().unwrap_or(0) as f32;
            let normalized = (pixel - mean) / std;
            tensor[[0, 0, y, x]] = normalized;
            tensor[[0, 1, y, x]] = normalized;
            tensor[[0, 2, y, x]] = normalized;
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_output_shape() {
        let gray = vec![128u8; 64 * 64];
        let tensor = preprocess(&gray, 64, 64, DETECT_INPUT_SIZE, DETECT_MEAN, DETECT_STD);
        assert_eq!(
            tensor.shape(),
            &[1, 3, DETECT_INPUT_SIZE, DETECT_INPUT_SIZE]
        );
    }

    #[test]
    fn preprocess_normalization() {
        let gray = vec![128u8; 16 * 16];
        let tensor = preprocess(&gray, 16, 16, 8, EMBED_MEAN, EMBED_STD);
        let expected = (128.0 - EMBED_MEAN) / EMBED_STD;
        assert!((tensor[[0, 0, 0, 0]] - expected).abs() < 1e-6);
    }

    #[test]
    fn preprocess_channels_identical() {
        let gray: Vec<u8> = (0..16u8).cycle().take(16 * 16).collect();
        let tensor = preprocess(&gray, 16, 16, 8, EMBED_MEAN, EMBED_STD);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(tensor[[0, 0, y, x]], tensor[[0, 1, y, x]]);
                assert_eq!(tensor[[0, 1, y, x]], tensor[[0, 2, y, x]]);
            }
        }
    }

    #[test]
    fn crop_clamps_to_frame_bounds() {
        let gray = vec![7u8; 10 * 10];
        let region = FaceRegion {
            x: -5.0,
            y: 8.0,
            width: 30.0,
            height: 30.0,
            confidence: 0.9,
        };
        let crop = crop_gray(&gray, 10, 10, &region);
        assert_eq!(crop.width, 10);
        assert_eq!(crop.height, 2);
        assert_eq!(crop.data.len(), 20);
    }
}

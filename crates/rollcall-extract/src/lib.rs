//! rollcall-extract — the production signature extractor.
//!
//! Implements the `rollcall-core` extractor seam with ONNX Runtime CPU
//! inference: face detection + 68-point landmarks, then a 128-d embedding
//! per face.

pub mod landmarks;
pub mod onnx;

pub use onnx::{OnnxExtractor, OnnxExtractorError, SIGNATURE_DIM};

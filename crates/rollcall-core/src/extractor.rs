//! Seam to the signature extraction capability.
//!
//! Turning pixels into a numeric vector is an external capability as far as
//! the matching engine is concerned. Workflows consume it through this
//! trait; the production implementation lives in `rollcall-extract`, and
//! tests script their own.

use crate::types::DetectedFace;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("frame buffer too short: expected {expected} bytes, got {actual}")]
    BadFrame { expected: usize, actual: usize },
    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

/// Produces zero or more detected faces — region, landmark groups, and a
/// fixed-dimension signature — from an 8-bit grayscale frame.
///
/// An empty result is not an error; it means no face was found in the frame.
pub trait SignatureExtractor {
    fn extract(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<DetectedFace>, ExtractorError>;
}

//! rollcall-core — face identity matching and enrollment gating.
//!
//! Pure types and algorithms: Euclidean nearest-match identification,
//! the landmark visibility gate, and the extractor trait seam. No I/O.

pub mod extractor;
pub mod matching;
pub mod types;
pub mod visibility;

pub use extractor::{ExtractorError, SignatureExtractor};
pub use matching::{distance, find_best_match, BestMatch, MatchError, DEFAULT_MATCH_THRESHOLD};
pub use types::{DetectedFace, FaceRegion, Identity, LandmarkSet, Point, Signature};
pub use visibility::{assess, Visibility};

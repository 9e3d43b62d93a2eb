//! Grouping of raw 68-point landmark output into named facial regions.
//!
//! The landmark model emits the standard 68-point layout plus a per-point
//! confidence score. A region whose points score below the cutoff is
//! reported as an empty group — that is how a masked mouth surfaces to the
//! visibility gate.

use rollcall_core::{LandmarkSet, Point};

pub const LANDMARK_COUNT: usize = 68;

/// Minimum mean per-point confidence for a region to count as located.
pub const MIN_GROUP_SCORE: f32 = 0.35;

// Standard 68-point region indices.
const CHIN: std::ops::Range<usize> = 0..17;
const NOSE_BRIDGE: std::ops::Range<usize> = 27..31;
const NOSE_TIP: std::ops::Range<usize> = 31..36;
const LEFT_EYE: std::ops::Range<usize> = 36..42;
const RIGHT_EYE: std::ops::Range<usize> = 42..48;
const TOP_LIP: [usize; 12] = [48, 49, 50, 51, 52, 53, 54, 64, 63, 62, 61, 60];
const BOTTOM_LIP: [usize; 12] = [54, 55, 56, 57, 58, 59, 48, 60, 67, 66, 65, 64];

/// Group 68 landmark points into named regions, dropping regions whose
/// confidence falls under `min_score`.
///
/// Returns `None` when the input is not a 68-point set or no region at all
/// could be located.
pub fn group_landmarks(points: &[Point], scores: &[f32], min_score: f32) -> Option<LandmarkSet> {
    if points.len() != LANDMARK_COUNT || scores.len() != LANDMARK_COUNT {
        return None;
    }

    let pick = |indices: &mut dyn Iterator<Item = usize>| -> Vec<Point> {
        let idx: Vec<usize> = indices.collect();
        let mean: f32 = idx.iter().map(|&i| scores[i]).sum::<f32>() / idx.len() as f32;
        if mean < min_score {
            return Vec::new();
        }
        idx.iter().map(|&i| points[i]).collect()
    };

    let set = LandmarkSet {
        chin: pick(&mut CHIN.into_iter()),
        left_eye: pick(&mut LEFT_EYE.into_iter()),
        right_eye: pick(&mut RIGHT_EYE.into_iter()),
        nose_bridge: pick(&mut NOSE_BRIDGE.into_iter()),
        nose_tip: pick(&mut NOSE_TIP.into_iter()),
        top_lip: pick(&mut TOP_LIP.iter().copied()),
        bottom_lip: pick(&mut BOTTOM_LIP.iter().copied()),
    };

    let any_located = !(set.chin.is_empty()
        && set.left_eye.is_empty()
        && set.right_eye.is_empty()
        && set.nose_bridge.is_empty()
        && set.nose_tip.is_empty()
        && set.top_lip.is_empty()
        && set.bottom_lip.is_empty());

    any_located.then_some(set)
}

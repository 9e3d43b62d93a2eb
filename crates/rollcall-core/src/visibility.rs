//! Enrollment-time visibility gate.
//!
//! A face enrolled behind a mask or scarf produces a signature that will
//! never match the same person unmasked, so enrollment rejects any capture
//! where the nose or mouth landmarks could not be located. Recognition does
//! not use this gate — it only needs a usable signature.

use crate::types::LandmarkSet;

/// Outcome of the landmark visibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Obstructed,
}

/// Landmark groups that must be present for enrollment.
const REQUIRED_GROUPS: [&str; 4] = ["nose_bridge", "nose_tip", "top_lip", "bottom_lip"];

/// Decide whether a face is sufficiently unobstructed for enrollment.
///
/// `Obstructed` when the landmark set is absent entirely, or when any
/// required group (nose bridge, nose tip, upper lip, lower lip) is empty.
/// Pure and deterministic.
pub fn assess(landmarks: Option<&LandmarkSet>) -> Visibility {
    let Some(set) = landmarks else {
        return Visibility::Obstructed;
    };

    for group in REQUIRED_GROUPS {
        let points = match group {
            "nose_bridge" => &set.nose_bridge,
            "nose_tip" => &set.nose_tip,
            "top_lip" => &set.top_lip,
            "bottom_lip" => &set.bottom_lip,
            _ => unreachable!(),
        };
        if points.is_empty() {
            tracing::debug!(group, "required landmark group missing");
            return Visibility::Obstructed;
        }
    }

    Visibility::Visible
}

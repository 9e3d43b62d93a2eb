use serde::{Deserialize, Serialize};

/// Fixed-length face signature vector (typically 128-dimensional).
///
/// No inherent identity: a signature only means something through its
/// association with an enrolled [`Identity`]. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub values: Vec<f64>,
}

impl Signature {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Dimensionality of the vector, fixed by whichever extractor produced it.
    pub fn dim(&self) -> usize {
        self.values.len()
    }
}

/// A person as enrolled in the system.
///
/// `roll_number` is an opaque external identifier and is not globally unique
/// by itself — uniqueness is scoped to `(roll_number, department, class,
/// semester)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub display_name: String,
    pub roll_number: String,
    pub department: String,
    pub class: String,
    pub semester: String,
}

impl Identity {
    /// True when every field carries a non-blank value.
    pub fn is_complete(&self) -> bool {
        ![
            &self.display_name,
            &self.roll_number,
            &self.department,
            &self.class,
            &self.semester,
        ]
        .iter()
        .any(|f| f.trim().is_empty())
    }
}

/// A single 2D landmark point in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Facial landmark points grouped by region.
///
/// An empty group means the region was not located — an occluded mouth
/// produces empty lip groups, which is what the visibility gate keys on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub chin: Vec<Point>,
    pub left_eye: Vec<Point>,
    pub right_eye: Vec<Point>,
    pub nose_bridge: Vec<Point>,
    pub nose_tip: Vec<Point>,
    pub top_lip: Vec<Point>,
    pub bottom_lip: Vec<Point>,
}

/// Bounding box for a detected face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

/// One face found in a frame: where it is, its landmark groups (if the
/// landmark stage located any), and its signature.
#[derive(Debug, Clone)]
pub struct DetectedFace {
    pub region: FaceRegion,
    pub landmarks: Option<LandmarkSet>,
    pub signature: Signature,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_complete() {
        let id = Identity {
            display_name: "Asha Verma".into(),
            roll_number: "42".into(),
            department: "CS".into(),
            class: "A".into(),
            semester: "5".into(),
        };
        assert!(id.is_complete());
    }

    #[test]
    fn identity_blank_field_is_incomplete() {
        let id = Identity {
            display_name: "Asha Verma".into(),
            roll_number: "  ".into(),
            department: "CS".into(),
            class: "A".into(),
            semester: "5".into(),
        };
        assert!(!id.is_complete());
    }

    #[test]
    fn signature_dim() {
        assert_eq!(Signature::new(vec![0.0; 128]).dim(), 128);
    }
}

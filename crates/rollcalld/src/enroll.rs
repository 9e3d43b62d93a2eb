//! Enrollment workflow: capture → visibility gate → identity dedup →
//! face dedup → persist.

use rollcall_core::{
    find_best_match, visibility, ExtractorError, Identity, MatchError, SignatureExtractor,
    Visibility,
};
use rollcall_store::{Db, StoreError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A committed enrollment.
#[derive(Debug)]
pub struct Enrollment {
    pub student_id: String,
    pub image_path: PathBuf,
}

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error("name, roll number, department, class, semester, and image are all required")]
    MissingFields,
    #[error("roll number, department, class, and semester must not contain path separators or '..'")]
    InvalidFields,
    #[error("could not decode the captured image: {0}")]
    BadImage(String),
    #[error("no face detected; try again with better lighting")]
    NoFaceDetected,
    #[error("face is partially covered; please remove any mask or covering")]
    FaceObstructed,
    #[error("a student with this roll number already exists in this department, class, and semester")]
    IdentityAlreadyEnrolled,
    #[error("this face is already registered in this department and class")]
    FaceAlreadyRegistered,
    #[error("extraction failed: {0}")]
    Extractor(#[from] ExtractorError),
    #[error("failed to persist image artifact: {0}")]
    Artifact(#[from] std::io::Error),
    #[error("storage failure: {0}")]
    Storage(StoreError),
    #[error("internal signature error")]
    Integrity(#[from] MatchError),
    #[error("another capture session is in progress; try again shortly")]
    DeviceBusy,
    #[error("attendance engine is not running")]
    EngineStopped,
}

impl From<StoreError> for EnrollError {
    fn from(e: StoreError) -> Self {
        match e {
            // Raced past the scope pre-check; same rejection either way.
            StoreError::DuplicateScope => EnrollError::IdentityAlreadyEnrolled,
            other => EnrollError::Storage(other),
        }
    }
}

/// The scope fields end up in the artifact filename; none may steer the
/// path outside the faces directory.
fn fields_are_path_safe(identity: &Identity) -> bool {
    [
        &identity.roll_number,
        &identity.department,
        &identity.class,
        &identity.semester,
    ]
    .iter()
    .all(|f| !f.contains(['/', '\\']) && !f.contains(".."))
}

/// Enroll one identity from an encoded (PNG/JPEG) image.
///
/// Checks run cheapest-first: field validation, image decode, extraction,
/// visibility, scope uniqueness, then the duplicate-face scan over the
/// `(department, class)` candidate set. Recognition later matches globally;
/// that asymmetry is intentional — a person may hold separate enrollments
/// across departments but is recognized as one face.
///
/// Either the image artifact and the store row both exist afterwards, or
/// neither does.
pub fn enroll(
    extractor: &mut dyn SignatureExtractor,
    db: &Db,
    faces_dir: &Path,
    identity: &Identity,
    image_bytes: &[u8],
    threshold: f64,
) -> Result<Enrollment, EnrollError> {
    if !identity.is_complete() || image_bytes.is_empty() {
        return Err(EnrollError::MissingFields);
    }
    if !fields_are_path_safe(identity) {
        return Err(EnrollError::InvalidFields);
    }

    let format =
        image::guess_format(image_bytes).map_err(|e| EnrollError::BadImage(e.to_string()))?;
    let gray = image::load_from_memory(image_bytes)
        .map_err(|e| EnrollError::BadImage(e.to_string()))?
        .to_luma8();
    let (width, height) = gray.dimensions();

    let faces = extractor.extract(gray.as_raw(), width, height)?;
    let Some(primary) = faces.first() else {
        return Err(EnrollError::NoFaceDetected);
    };

    if visibility::assess(primary.landmarks.as_ref()) == Visibility::Obstructed {
        return Err(EnrollError::FaceObstructed);
    }

    // Scope uniqueness first — a plain lookup, before the signature scan.
    if db.scope_exists(identity)? {
        return Err(EnrollError::IdentityAlreadyEnrolled);
    }

    let candidates = db.signatures_in_class(&identity.department, &identity.class)?;
    let duplicate = find_best_match(
        &primary.signature,
        candidates.into_iter().map(|r| (r.roll_number, r.signature)),
        threshold,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "dimension mismatch during duplicate-face scan");
        e
    })?;
    if let Some(hit) = duplicate {
        tracing::warn!(
            existing_roll = %hit.identity,
            distance = hit.distance,
            "rejected enrollment: face already registered"
        );
        return Err(EnrollError::FaceAlreadyRegistered);
    }

    std::fs::create_dir_all(faces_dir)?;
    let ext = format.extensions_str().first().copied().unwrap_or("img");
    let image_path = faces_dir.join(format!(
        "{}_{}_{}_{}.{ext}",
        identity.roll_number, identity.department, identity.class, identity.semester
    ));
    std::fs::write(&image_path, image_bytes)?;

    let student_id =
        match db.insert_student(identity, &primary.signature, &image_path.to_string_lossy()) {
            Ok(id) => id,
            Err(e) => {
                // No partial state: drop the artifact if the row never landed.
                let _ = std::fs::remove_file(&image_path);
                return Err(e.into());
            }
        };

    Ok(Enrollment {
        student_id,
        image_path,
    })
}

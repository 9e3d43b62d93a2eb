//! Recognition workflow: bounded polling loop → global nearest-match →
//! idempotent ledger write.

use crate::clock::Clock;
use chrono::Local;
use rollcall_core::{find_best_match, ExtractorError, MatchError, SignatureExtractor};
use rollcall_hw::{CameraError, CaptureSource};
use rollcall_store::{Db, MarkOutcome, StoreError};
use std::time::Duration;
use thiserror::Error;

/// Terminal outcome of one recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizeOutcome {
    /// A new Present record was written.
    Marked {
        display_name: String,
        roll_number: String,
    },
    /// Presence was already on the ledger for today; nothing written.
    AlreadyMarked {
        display_name: String,
        roll_number: String,
    },
    /// A face was captured but matched nobody enrolled.
    NotRecognized,
    /// The deadline passed without any face being detected.
    Timeout,
}

#[derive(Error, Debug)]
pub enum RecognizeError {
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("extraction failed: {0}")]
    Extractor(#[from] ExtractorError),
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
    #[error("internal signature error")]
    Integrity(#[from] MatchError),
    #[error("another capture session is in progress; try again shortly")]
    DeviceBusy,
    #[error("attendance engine is not running")]
    EngineStopped,
}

/// Poll the capture source until a face yields a signature or the deadline
/// passes, then match against the entire enrolled population and mark
/// attendance for today.
///
/// The first frame that produces a signature is final for this invocation —
/// the loop does not keep polling for a better one. A frame with no face is
/// not an error; the loop just keeps polling until the deadline.
pub fn recognize(
    capture: &mut dyn CaptureSource,
    extractor: &mut dyn SignatureExtractor,
    db: &Db,
    threshold: f64,
    timeout: Duration,
    clock: &dyn Clock,
) -> Result<RecognizeOutcome, RecognizeError> {
    let deadline = clock.now() + timeout;

    let signature = loop {
        if clock.now() >= deadline {
            tracing::info!(?timeout, "recognition timed out with no face detected");
            return Ok(RecognizeOutcome::Timeout);
        }

        let frame = capture.next_frame()?;
        if frame.is_dark() {
            tracing::debug!(seq = frame.sequence, "skipping dark frame");
            continue;
        }

        let faces = extractor.extract(&frame.data, frame.width, frame.height)?;
        if let Some(primary) = faces.into_iter().next() {
            tracing::debug!(
                seq = frame.sequence,
                confidence = primary.region.confidence,
                "face captured"
            );
            break primary.signature;
        }
    };

    // Recognition matches globally, unlike enrollment's per-class dedup scan.
    let population = db.all_signatures()?;
    let best = find_best_match(
        &signature,
        population
            .into_iter()
            .map(|r| ((r.roll_number, r.display_name), r.signature)),
        threshold,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "dimension mismatch against enrolled population");
        e
    })?;

    let Some(hit) = best else {
        tracing::info!("face not recognized");
        return Ok(RecognizeOutcome::NotRecognized);
    };
    let (roll_number, display_name) = hit.identity;
    tracing::info!(roll = %roll_number, distance = hit.distance, "face matched");

    let now = Local::now();
    match db.mark_present(&roll_number, now.date_naive(), now)? {
        MarkOutcome::Marked => Ok(RecognizeOutcome::Marked {
            display_name,
            roll_number,
        }),
        MarkOutcome::AlreadyMarked => Ok(RecognizeOutcome::AlreadyMarked {
            display_name,
            roll_number,
        }),
    }
}

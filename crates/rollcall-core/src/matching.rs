//! Nearest-match identification over a population of stored signatures.
//!
//! Distance is plain Euclidean over equal-length vectors. A probe matches a
//! candidate only when the *global* minimum distance falls under the
//! threshold — the scan never stops at the first candidate under threshold,
//! because a closer, different candidate could still appear later in the
//! input.

use crate::types::Signature;
use thiserror::Error;

/// Maximum Euclidean distance between two signatures still considered the
/// same person. Calibrated empirically for 128-d face embeddings; matches
/// the conventional single-nearest-neighbour comparator default.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Two signatures of different dimensionality were compared. This is a
    /// contract violation between extractor versions, never a user mistake.
    #[error("signature dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Euclidean distance between two equal-length signatures.
pub fn distance(a: &Signature, b: &Signature) -> Result<f64, MatchError> {
    if a.dim() != b.dim() {
        return Err(MatchError::DimensionMismatch {
            left: a.dim(),
            right: b.dim(),
        });
    }

    let sum: f64 = a
        .values
        .iter()
        .zip(b.values.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();
    Ok(sum.sqrt())
}

/// The nearest candidate under threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch<R> {
    pub identity: R,
    pub distance: f64,
}

/// Scan every candidate, keep the global minimum, and declare a match only
/// if that minimum is within `threshold`.
///
/// Ties at equal minimal distance resolve to the first candidate in input
/// order. The full candidate set is always scanned — no early exit.
pub fn find_best_match<R>(
    query: &Signature,
    candidates: impl IntoIterator<Item = (R, Signature)>,
    threshold: f64,
) -> Result<Option<BestMatch<R>>, MatchError> {
    let mut best: Option<BestMatch<R>> = None;

    for (identity, signature) in candidates {
        let d = distance(query, &signature)?;
        let closer = match &best {
            None => true,
            // Strict: equal distance keeps the earlier candidate.
            Some(b) => d < b.distance,
        };
        if closer {
            best = Some(BestMatch { identity, distance: d });
        }
    }

    Ok(best.filter(|b| b.distance <= threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(values: &[f64]) -> Signature {
        Signature::new(values.to_vec())
    }

    #[test]
    fn distance_is_symmetric() {
        let a = sig(&[1.0, 2.0, 3.0]);
        let b = sig(&[4.0, 0.0, -1.0]);
        assert_eq!(distance(&a, &b).unwrap(), distance(&b, &a).unwrap());
    }

    #[test]
    fn distance_to_self_is_zero() {
        let a = sig(&[0.25, -7.5, 3.125]);
        assert_eq!(distance(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn distance_dimension_mismatch() {
        let a = sig(&[1.0, 2.0]);
        let b = sig(&[1.0, 2.0, 3.0]);
        assert_eq!(
            distance(&a, &b),
            Err(MatchError::DimensionMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn nearest_wins_over_first_under_threshold() {
        // Both candidates are under threshold; the later, closer one must win.
        let query = sig(&[0.0, 0.0]);
        let candidates = vec![
            ("bina", sig(&[0.5, 0.0])),
            ("asha", sig(&[0.3, 0.0])),
        ];
        let best = find_best_match(&query, candidates, 0.6).unwrap().unwrap();
        assert_eq!(best.identity, "asha");
        assert!((best.distance - 0.3).abs() < 1e-12);
    }

    #[test]
    fn two_in_range_picks_global_minimum() {
        let query = sig(&[0.0, 0.0]);
        let candidates = vec![
            ("asha", sig(&[0.3, 0.0])),
            ("bina", sig(&[0.5, 0.0])),
        ];
        let best = find_best_match(&query, candidates, 0.6).unwrap().unwrap();
        assert_eq!(best.identity, "asha");
        assert!((best.distance - 0.3).abs() < 1e-12);
    }

    #[test]
    fn no_match_above_threshold() {
        let query = sig(&[0.0, 0.0]);
        let candidates = vec![("far", sig(&[1.0, 1.0]))];
        assert!(find_best_match(&query, candidates, 0.6).unwrap().is_none());
    }

    #[test]
    fn threshold_is_inclusive() {
        let query = sig(&[0.0]);
        let candidates = vec![("edge", sig(&[0.6]))];
        let best = find_best_match(&query, candidates, 0.6).unwrap();
        assert_eq!(best.unwrap().identity, "edge");
    }

    #[test]
    fn tie_keeps_first_in_input_order() {
        let query = sig(&[0.0, 0.0]);
        let candidates = vec![
            ("first", sig(&[0.3, 0.0])),
            ("second", sig(&[0.0, 0.3])),
        ];
        let best = find_best_match(&query, candidates, 0.6).unwrap().unwrap();
        assert_eq!(best.identity, "first");
    }

    #[test]
    fn adding_closer_candidate_flips_no_match_to_match() {
        let query = sig(&[0.0, 0.0]);
        let far = vec![("far", sig(&[2.0, 2.0]))];
        assert!(find_best_match(&query, far, 0.6).unwrap().is_none());

        let with_near = vec![
            ("far", sig(&[2.0, 2.0])),
            ("near", sig(&[0.1, 0.0])),
        ];
        let best = find_best_match(&query, with_near, 0.6).unwrap().unwrap();
        assert_eq!(best.identity, "near");
    }

    #[test]
    fn adding_farther_candidates_never_changes_winner() {
        let query = sig(&[0.0, 0.0]);
        let candidates = vec![
            ("winner", sig(&[0.2, 0.0])),
            ("loser1", sig(&[0.4, 0.0])),
            ("loser2", sig(&[0.59, 0.0])),
        ];
        let best = find_best_match(&query, candidates, 0.6).unwrap().unwrap();
        assert_eq!(best.identity, "winner");
    }

    #[test]
    fn empty_candidate_set_is_no_match() {
        let query = sig(&[0.0]);
        let candidates: Vec<(&str, Signature)> = vec![];
        assert!(find_best_match(&query, candidates, 0.6).unwrap().is_none());
    }

    #[test]
    fn mismatched_candidate_dimension_is_an_error() {
        let query = sig(&[0.0, 0.0]);
        let candidates = vec![("bad", sig(&[0.0, 0.0, 0.0]))];
        assert!(find_best_match(&query, candidates, 0.6).is_err());
    }
}

// Threshold crossing extraction
// Turns threshold-marker output into time-ordered crossing events

use crate::events::types::Crossing;
use crate::signal::stages::{FALL_THROUGH_RECIPROCAL, RISE_THROUGH_THRESHOLD};

/// Constant shift applied to every crossing index.
/// Keeps indices in agreement with the legacy detector.
pub const LEGACY_INDEX_OFFSET: u64 = 1;

/// Extract crossings from a marker signal.
///
/// `first_index` is the global index of the input sample aligned with
/// `marker[0]`, i.e. the start of the processed buffer plus the chain
/// latency. Only rises through the threshold and falls through its
/// reciprocal become events.
pub fn extract_crossings(marker: &[f64], first_index: u64) -> Vec<Crossing> {
    let offset = first_index + LEGACY_INDEX_OFFSET;

    marker
        .iter()
        .enumerate()
        .filter_map(|(i, &value)| {
            let index = offset + i as u64;
            if value == RISE_THROUGH_THRESHOLD {
                Some(Crossing::rise(index))
            } else if value == FALL_THROUGH_RECIPROCAL {
                Some(Crossing::fall(index))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_rises_and_falls() {
        let marker = [0.0, 1.0, 0.0, -1.0, -2.0, 2.0, 1.0, 3.0, -3.0];
        let crossings = extract_crossings(&marker, 100);

        assert_eq!(
            crossings,
            vec![
                Crossing::rise(102),
                Crossing::fall(105),
                Crossing::rise(107),
            ]
        );
    }

    #[test]
    fn test_extract_empty_marker() {
        assert!(extract_crossings(&[], 0).is_empty());
        assert!(extract_crossings(&[0.0; 10], 0).is_empty());
    }
}

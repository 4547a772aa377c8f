//! Timestamp normalization
//!
//! Merges the two observation sources of a competitor (the list embedded on the
//! competitor record and the separately stored timestamp sub-collection) into
//! one ascending sequence of epoch seconds. Provenance is discarded by the merge.

use crate::types::ObservationRecord;

/// Readable epoch seconds of `records`, in input order.
///
/// Records whose timestamp is missing or unreadable are dropped silently.
pub fn epoch_seconds(records: &[ObservationRecord]) -> Vec<i64> {
    records.iter().filter_map(ObservationRecord::epoch_seconds_value).collect()
}

/// Merge two already-decoded sequences into one ascending sequence.
///
/// Duplicates are kept: two sources reporting the same instant are two observations.
pub fn merge(embedded: &[i64], subcollection: &[i64]) -> Vec<i64> {
    let mut merged = Vec::with_capacity(embedded.len() + subcollection.len());
    merged.extend_from_slice(embedded);
    merged.extend_from_slice(subcollection);
    merged.sort_unstable();
    merged
}

/// Normalize both raw observation sources of one competitor.
pub fn normalize(
    embedded: Option<&[ObservationRecord]>,
    subcollection: &[ObservationRecord],
) -> Vec<i64> {
    let embedded = embedded.map(epoch_seconds).unwrap_or_default();
    merge(&embedded, &epoch_seconds(subcollection))
}

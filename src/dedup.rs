//! Performance-wide deduplication.
//!
//! The same song is often reported twice at very different timestamps (a
//! comment pointing at the drop, an AI match at the intro).  [`dedupe`]
//! collapses every such family into its best record.

use std::cmp::Ordering;

use crate::matcher::is_same_track;
use crate::quality::{has_metadata_noise, is_placeholder};
use crate::record::IdentificationRecord;

/// Compare two records by how trustworthy their identification is.
/// `Greater` means `a` is the better record.
fn preference(a: &IdentificationRecord, b: &IdentificationRecord) -> Ordering {
    a.verified
        .cmp(&b.verified)
        .then_with(|| a.source.is_catalog().cmp(&b.source.is_catalog()))
        .then_with(|| (!has_metadata_noise(&a.title)).cmp(&!has_metadata_noise(&b.title)))
        .then_with(|| (!is_placeholder(&a.artist)).cmp(&!is_placeholder(&b.artist)))
        .then_with(|| a.title.trim().chars().count().cmp(&b.title.trim().chars().count()))
}

/// Pick the better of two records describing the same song.
///
/// Preference order: verified, catalog source, clean title, real artist,
/// longer title.  On a full tie the existing record stays.
pub fn pick_best<'a>(existing: &'a IdentificationRecord, candidate: &'a IdentificationRecord) -> &'a IdentificationRecord {
    match preference(candidate, existing) {
        Ordering::Greater => candidate,
        _ => existing,
    }
}

/// Collapse records that describe the same song anywhere in the performance.
///
/// `records` should already be filtered and sorted by timestamp.  The result
/// keeps first-seen order and only ever contains input records.
pub fn dedupe(records: &[IdentificationRecord]) -> Vec<IdentificationRecord> {
    let mut accepted: Vec<IdentificationRecord> = Vec::new();

    for record in records {
        match accepted.iter().position(|kept| is_same_track(kept, record)) {
            Some(idx) => {
                let best = pick_best(&accepted[idx], record).clone();
                if best.id != accepted[idx].id {
                    tracing::debug!(
                        dropped = %accepted[idx].id,
                        kept = %best.id,
                        "duplicate identification replaced"
                    );
                }
                accepted[idx] = best;
            }
            None => accepted.push(record.clone()),
        }
    }

    tracing::debug!(input = records.len(), output = accepted.len(), "global dedup");
    accepted
}

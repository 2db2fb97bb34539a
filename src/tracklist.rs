//! Tracklist assembly and the end-to-end reconciliation entry point.

use serde::{Deserialize, Serialize};

use crate::cluster::{cluster_records, ConflictGroup, Resolved};
use crate::config::Thresholds;
use crate::dedup::dedupe;
use crate::gaps::{estimate_gaps, Gap};
use crate::quality::is_low_quality;
use crate::record::{IdentificationRecord, PerformanceMetadata};

/// Records that the backend already tracks as one conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalConflict {
    pub conflict_ref: String,
    pub timestamp_seconds: f64,
    pub candidates: Vec<IdentificationRecord>,
}

/// One entry of an assembled tracklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TracklistItem {
    Track(IdentificationRecord),
    Gap(Gap),
    Conflict(ConflictGroup),
    ExternalConflict(ExternalConflict),
}

impl TracklistItem {
    /// Position of the item on the performance timeline.
    pub fn timestamp(&self) -> f64 {
        match self {
            TracklistItem::Track(r) => r.sort_key(),
            TracklistItem::Gap(g) => g.start_seconds,
            TracklistItem::Conflict(c) => c.timestamp_seconds,
            TracklistItem::ExternalConflict(e) => e.timestamp_seconds,
        }
    }
}

/// The reconciled, presentable view of a performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracklist {
    pub items: Vec<TracklistItem>,
    pub estimated_missing_tracks: u32,
    /// Identified songs with no usable position in time
    #[serde(default)]
    pub unplaced: Vec<IdentificationRecord>,
}

impl Tracklist {
    /// Replace the conflict group containing `winner_id` with a plain track.
    ///
    /// Returns false when no conflict group offers that candidate.
    pub fn resolve_conflict(&mut self, winner_id: &str) -> bool {
        let found = self.items.iter().enumerate().find_map(|(idx, item)| match item {
            TracklistItem::Conflict(group) => group.resolve(winner_id).map(|winner| (idx, winner)),
            _ => None,
        });

        match found {
            Some((idx, winner)) => {
                tracing::debug!(winner = %winner.id, "conflict group resolved");
                self.items[idx] = TracklistItem::Track(winner);
                sort_items(&mut self.items);
                true
            }
            None => false,
        }
    }

    /// Number of items that are resolved tracks.
    pub fn track_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, TracklistItem::Track(_)))
            .count()
    }
}

fn sort_items(items: &mut [TracklistItem]) {
    items.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
}

/// Merge resolved slots, gaps and external conflicts into one timeline.
///
/// Items sharing a timestamp keep the order tracks, gaps, conflict groups,
/// external conflicts.
pub fn assemble(resolved: Vec<Resolved>, gaps: Vec<Gap>, external: Vec<ExternalConflict>) -> Vec<TracklistItem> {
    let mut items: Vec<TracklistItem> = Vec::with_capacity(resolved.len() + gaps.len() + external.len());
    let mut conflicts: Vec<TracklistItem> = Vec::new();

    for slot in resolved {
        match slot {
            Resolved::Track(r) => items.push(TracklistItem::Track(r)),
            Resolved::Conflict(c) => conflicts.push(TracklistItem::Conflict(c)),
        }
    }
    items.extend(gaps.into_iter().map(TracklistItem::Gap));
    items.extend(conflicts);
    items.extend(external.into_iter().map(TracklistItem::ExternalConflict));

    sort_items(&mut items);
    items
}

/// Group records by their backend conflict reference, in first-seen order.
fn group_external(records: Vec<IdentificationRecord>) -> Vec<ExternalConflict> {
    let mut groups: Vec<ExternalConflict> = Vec::new();

    for record in records {
        let conflict_ref = match &record.conflict_ref {
            Some(r) => r.clone(),
            None => continue,
        };
        let ts = record.sort_key();
        match groups.iter_mut().find(|g| g.conflict_ref == conflict_ref) {
            Some(group) => {
                group.timestamp_seconds = group.timestamp_seconds.min(ts);
                group.candidates.push(record);
            }
            None => groups.push(ExternalConflict {
                conflict_ref,
                timestamp_seconds: ts,
                candidates: vec![record],
            }),
        }
    }
    groups
}

fn sort_by_time(records: &mut [IdentificationRecord]) {
    records.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
}

/// Turn a noisy pile of identifications into one ordered tracklist.
///
/// Pure and deterministic: the same input always produces the same output.
pub fn reconcile(
    records: &[IdentificationRecord],
    metadata: &PerformanceMetadata,
    thresholds: &Thresholds,
) -> Tracklist {
    let filtered: Vec<IdentificationRecord> = records
        .iter()
        .filter(|r| !is_low_quality(r, thresholds))
        .cloned()
        .collect();
    tracing::debug!(input = records.len(), kept = filtered.len(), "quality filter");

    let (placed, unplaced): (Vec<IdentificationRecord>, Vec<IdentificationRecord>) = filtered
        .into_iter()
        .partition(|r| r.timestamp_seconds.map_or(false, |ts| metadata.accepts_timestamp(ts)));
    let unplaced = dedupe(&unplaced);

    let (referenced, mut plain): (Vec<IdentificationRecord>, Vec<IdentificationRecord>) =
        placed.into_iter().partition(|r| r.conflict_ref.is_some());
    let external = group_external(referenced);

    sort_by_time(&mut plain);
    let mut deduped = dedupe(&plain);
    sort_by_time(&mut deduped);

    let resolved = cluster_records(&deduped, thresholds);
    let (gaps, estimated_missing_tracks) = estimate_gaps(&resolved, metadata, thresholds);
    let items = assemble(resolved, gaps, external);

    tracing::debug!(
        items = items.len(),
        unplaced = unplaced.len(),
        missing = estimated_missing_tracks,
        "tracklist assembled"
    );

    Tracklist {
        items,
        estimated_missing_tracks,
        unplaced,
    }
}

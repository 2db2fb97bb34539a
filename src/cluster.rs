//! Temporal clustering and conflict building.
//!
//! Records whose timestamps sit implausibly close together cannot all be
//! separate songs.  Each such cluster either resolves to one track or becomes
//! a [`ConflictGroup`] that a person has to settle.

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::dedup::pick_best;
use crate::matcher::{is_same_artist, is_same_track};
use crate::quality::{is_placeholder, is_weak_candidate, quality_score};
use crate::record::IdentificationRecord;

/// Distinct candidates claiming the same time slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictGroup {
    /// Earliest candidate timestamp
    pub timestamp_seconds: f64,
    /// Best-scored first
    pub candidates: Vec<IdentificationRecord>,
}

impl ConflictGroup {
    fn from_candidates(candidates: Vec<IdentificationRecord>) -> Self {
        let timestamp_seconds = candidates
            .iter()
            .map(IdentificationRecord::sort_key)
            .fold(f64::INFINITY, f64::min);
        ConflictGroup {
            timestamp_seconds: if timestamp_seconds.is_finite() { timestamp_seconds } else { 0.0 },
            candidates,
        }
    }

    /// Latest candidate timestamp, the end of the slot for gap purposes.
    pub fn latest_timestamp(&self) -> f64 {
        self.candidates
            .iter()
            .map(IdentificationRecord::sort_key)
            .fold(self.timestamp_seconds, f64::max)
    }

    /// Settle the conflict in favour of one candidate.
    pub fn resolve(&self, winner_id: &str) -> Option<IdentificationRecord> {
        self.candidates.iter().find(|c| c.id == winner_id).cloned()
    }
}

/// What a time slot resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Track(IdentificationRecord),
    Conflict(ConflictGroup),
}

impl Resolved {
    /// Where the slot begins on the timeline.
    pub fn start_seconds(&self) -> f64 {
        match self {
            Resolved::Track(r) => r.sort_key(),
            Resolved::Conflict(g) => g.timestamp_seconds,
        }
    }

    /// Where the slot ends on the timeline.
    pub fn end_seconds(&self) -> f64 {
        match self {
            Resolved::Track(r) => r.sort_key(),
            Resolved::Conflict(g) => g.latest_timestamp(),
        }
    }
}

/// Split time-sorted records into runs where each record is closer than
/// `min_gap` to the one before it.
fn split_clusters(records: &[IdentificationRecord], min_gap: f64) -> Vec<Vec<IdentificationRecord>> {
    let mut clusters: Vec<Vec<IdentificationRecord>> = Vec::new();
    let mut last_ts: Option<f64> = None;

    for record in records {
        let ts = record.sort_key();
        match (last_ts, clusters.last_mut()) {
            (Some(prev), Some(current)) if ts - prev < min_gap => current.push(record.clone()),
            _ => clusters.push(vec![record.clone()]),
        }
        last_ts = Some(ts);
    }
    clusters
}

/// Partition into transitive classes under `linked` and fold each class with
/// [`pick_best`].  Classes come out in order of their first member.
fn collapse_by<F>(candidates: Vec<IdentificationRecord>, linked: F) -> Vec<IdentificationRecord>
where
    F: Fn(&IdentificationRecord, &IdentificationRecord) -> bool,
{
    let mut classes: Vec<Vec<usize>> = Vec::new();

    for i in 0..candidates.len() {
        let (joined, rest): (Vec<Vec<usize>>, Vec<Vec<usize>>) = classes
            .into_iter()
            .partition(|class| class.iter().any(|&j| linked(&candidates[j], &candidates[i])));

        let mut merged: Vec<usize> = joined.into_iter().flatten().collect();
        merged.push(i);
        merged.sort_unstable();

        classes = rest;
        classes.push(merged);
        classes.sort_by_key(|class| class[0]);
    }

    classes
        .iter()
        .map(|class| {
            let mut best = &candidates[class[0]];
            for &j in &class[1..] {
                best = pick_best(best, &candidates[j]);
            }
            best.clone()
        })
        .collect()
}

fn collapse_same_track(candidates: Vec<IdentificationRecord>) -> Vec<IdentificationRecord> {
    collapse_by(candidates, is_same_track)
}

fn collapse_same_artist(candidates: Vec<IdentificationRecord>) -> Vec<IdentificationRecord> {
    collapse_by(candidates, |a, b| {
        !is_placeholder(&a.artist) && !is_placeholder(&b.artist) && is_same_artist(a, b)
    })
}

/// Decide what one cluster of close records resolves to.
fn resolve_cluster(cluster: Vec<IdentificationRecord>, thresholds: &Thresholds) -> Option<Resolved> {
    let mut candidates = collapse_same_track(cluster);
    candidates = collapse_same_artist(candidates);

    if candidates.iter().any(|c| !is_weak_candidate(c, thresholds)) {
        candidates.retain(|c| !is_weak_candidate(c, thresholds));
    }

    if candidates.len() <= 1 {
        return candidates.pop().map(Resolved::Track);
    }

    let mut scored: Vec<(i32, IdentificationRecord)> =
        candidates.into_iter().map(|c| (quality_score(&c), c)).collect();
    scored.sort_by_key(|(score, _)| std::cmp::Reverse(*score));

    let margin = scored[0].0 - scored[1].0;
    if margin >= thresholds.auto_resolve_margin {
        tracing::debug!(winner = %scored[0].1.id, margin, "cluster auto-resolved");
        return scored.into_iter().next().map(|(_, c)| Resolved::Track(c));
    }

    let fallback = scored[0].1.clone();
    let kept: Vec<IdentificationRecord> = scored
        .into_iter()
        .filter(|(score, _)| *score >= thresholds.min_conflict_score)
        .map(|(_, c)| c)
        .collect();
    let mut kept = collapse_same_track(kept);
    kept.truncate(thresholds.max_conflict_candidates);

    match kept.len() {
        0 => Some(Resolved::Track(fallback)),
        1 => kept.pop().map(Resolved::Track),
        _ => {
            let group = ConflictGroup::from_candidates(kept);
            tracing::debug!(
                at = group.timestamp_seconds,
                candidates = group.candidates.len(),
                "conflict group emitted"
            );
            Some(Resolved::Conflict(group))
        }
    }
}

/// Cluster deduplicated, time-sorted records and resolve every cluster.
pub fn cluster_records(records: &[IdentificationRecord], thresholds: &Thresholds) -> Vec<Resolved> {
    let clusters = split_clusters(records, thresholds.min_track_gap_seconds);
    tracing::debug!(records = records.len(), clusters = clusters.len(), "temporal clustering");

    clusters
        .into_iter()
        .filter_map(|cluster| resolve_cluster(cluster, thresholds))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Source;

    fn rec(id: &str, title: &str, artist: &str, ts: f64) -> IdentificationRecord {
        IdentificationRecord::new(id, title, artist, Some(ts), Source::CommunityComment)
    }

    fn run(records: &[IdentificationRecord]) -> Vec<Resolved> {
        cluster_records(records, &Thresholds::default())
    }

    #[test]
    fn test_featuring_variant_is_one_track() {
        let out = run(&[rec("a", "Lights", "Alice", 600.0), rec("b", "Lights", "Alice ft. Bob", 660.0)]);
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], Resolved::Track(_)));
    }

    #[test]
    fn test_far_apart_records_stay_separate() {
        let out = run(&[rec("a", "Glue", "Bicep", 0.0), rec("b", "Apricots", "Four Tet", 75.0)]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_single_linkage_chains() {
        let records = [
            rec("a", "Midnight Drive", "Kerri Chandler", 100.0),
            rec("b", "Solar Flare", "Bicep", 170.0),
            rec("c", "Golden Hour", "Fred again..", 240.0),
        ];
        let clusters = split_clusters(&records, 75.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 3);
    }

    #[test]
    fn test_equal_scores_become_conflict() {
        let out = run(&[
            rec("a", "Midnight Drive", "Kerri Chandler", 100.0),
            rec("b", "Solar Flare", "Bicep", 120.0),
            rec("c", "Golden Hour", "Fred again..", 140.0),
            rec("d", "Apricots", "Four Tet", 150.0),
        ]);
        assert_eq!(out.len(), 1);
        match &out[0] {
            Resolved::Conflict(group) => {
                assert_eq!(group.candidates.len(), 3);
                assert_eq!(group.timestamp_seconds, 100.0);
                assert_eq!(group.candidates[0].id, "a");
                assert_eq!(group.latest_timestamp(), 140.0);
            }
            other => panic!("expected a conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_clear_winner_auto_resolves() {
        let catalog = IdentificationRecord::new("cat", "Glue", "Bicep", Some(300.0), Source::Catalog);
        let out = run(&[rec("a", "Apricots", "Four Tet", 290.0), catalog.clone()]);
        assert_eq!(out, vec![Resolved::Track(catalog)]);
    }

    #[test]
    fn test_weak_candidates_dropped() {
        let out = run(&[rec("a", "ID", "Kerri Chandler", 300.0), rec("b", "Glue", "Bicep", 320.0)]);
        match &out[..] {
            [Resolved::Track(r)] => assert_eq!(r.id, "b"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_same_song_variants_collapse_to_best() {
        let out = run(&[
            rec("a", "Glue", "Bicep", 300.0),
            rec("b", "Glue (Unreleased)", "BICEP", 310.0).with_verified(true),
        ]);
        match &out[..] {
            [Resolved::Track(r)] => assert_eq!(r.id, "b"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_same_artist_collapses() {
        let out = run(&[rec("a", "Glue", "Bicep", 300.0), rec("b", "Atlas", "Bicep", 330.0)]);
        match &out[..] {
            [Resolved::Track(r)] => assert_eq!(r.id, "b"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_conflict_resolve() {
        let group = ConflictGroup::from_candidates(vec![
            rec("a", "Glue", "Bicep", 200.0),
            rec("b", "Apricots", "Four Tet", 180.0),
        ]);
        assert_eq!(group.timestamp_seconds, 180.0);
        assert_eq!(group.resolve("a").map(|r| r.id), Some("a".to_string()));
        assert!(group.resolve("zzz").is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(run(&[]).is_empty());
    }
}

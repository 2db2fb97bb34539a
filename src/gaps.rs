//! Estimate unidentified songs hiding in silent stretches of the timeline.
//!
//! Only durations are used.  A stretch longer than an average song plus some
//! padding is assumed to contain at least one song nobody identified.

use serde::{Deserialize, Serialize};

use crate::cluster::Resolved;
use crate::config::Thresholds;
use crate::record::PerformanceMetadata;

/// A stretch of the timeline believed to hold unidentified songs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    pub start_seconds: f64,
    pub duration_seconds: f64,
    pub estimated_missing_count: u32,
}

/// Expected song length for this performance.
pub fn average_track_duration(metadata: &PerformanceMetadata, thresholds: &Thresholds) -> f64 {
    if let (Some(total), Some(count)) = (metadata.known_duration(), metadata.track_count_hint) {
        if count > 0 {
            let avg = total / count as f64;
            if avg >= thresholds.min_track_seconds && avg <= thresholds.max_track_seconds {
                return avg;
            }
        }
    }
    thresholds.default_track_seconds
}

/// Shortest silent stretch that counts as a gap.
pub fn gap_threshold(avg: f64, thresholds: &Thresholds) -> f64 {
    (avg + thresholds.gap_padding_seconds).max(thresholds.min_gap_threshold_seconds)
}

fn songs_in(seconds: f64, avg: f64) -> u32 {
    ((seconds / avg).floor() as u32).max(1)
}

/// Find gaps between resolved slots and estimate how many songs each holds.
///
/// `resolved` must be in timeline order.  Returns the gaps and the total
/// estimated missing count, which never exceeds what the performance length
/// can plausibly hold.
pub fn estimate_gaps(
    resolved: &[Resolved],
    metadata: &PerformanceMetadata,
    thresholds: &Thresholds,
) -> (Vec<Gap>, u32) {
    let (first, last) = match (resolved.first(), resolved.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return (Vec::new(), 0),
    };

    let avg = average_track_duration(metadata, thresholds);
    let threshold = gap_threshold(avg, thresholds);
    let mut raw: Vec<Gap> = Vec::new();

    let lead = first.start_seconds();
    if lead >= threshold && lead > 0.0 {
        raw.push(Gap {
            start_seconds: 0.0,
            duration_seconds: lead,
            estimated_missing_count: songs_in(lead, avg),
        });
    }

    for pair in resolved.windows(2) {
        let prev_end = pair[0].end_seconds();
        let delta = pair[1].start_seconds() - prev_end;
        let duration = delta - avg;
        if delta >= threshold && duration > 0.0 {
            raw.push(Gap {
                start_seconds: prev_end + avg,
                duration_seconds: duration,
                estimated_missing_count: songs_in(duration, avg),
            });
        }
    }

    let effective = metadata
        .known_duration()
        .unwrap_or_else(|| last.end_seconds() + avg);
    let plausible = (effective / thresholds.seconds_per_expected_track).floor() as i64;
    let mut budget = (plausible - resolved.len() as i64).max(0) as u32;

    let mut gaps = Vec::with_capacity(raw.len());
    let mut total = 0;
    for mut gap in raw {
        if budget == 0 {
            tracing::debug!(at = gap.start_seconds, "gap dropped, missing-track budget spent");
            continue;
        }
        gap.estimated_missing_count = gap.estimated_missing_count.min(budget);
        budget -= gap.estimated_missing_count;
        total += gap.estimated_missing_count;
        gaps.push(gap);
    }

    tracing::debug!(avg, threshold, gaps = gaps.len(), missing = total, "gap estimation");
    (gaps, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ConflictGroup;
    use crate::record::{IdentificationRecord, Source};

    fn track(ts: f64) -> Resolved {
        Resolved::Track(IdentificationRecord::new("t", "Song", "Artist", Some(ts), Source::Catalog))
    }

    fn meta(total: Option<f64>, hint: Option<u32>) -> PerformanceMetadata {
        PerformanceMetadata {
            total_duration_seconds: total,
            track_count_hint: hint,
            ..Default::default()
        }
    }

    #[test]
    fn test_average_track_duration() {
        let t = Thresholds::default();
        assert_eq!(average_track_duration(&meta(Some(3600.0), Some(12)), &t), 300.0);
        assert_eq!(average_track_duration(&meta(Some(3600.0), Some(15)), &t), 240.0);
        // 60s songs are implausible
        assert_eq!(average_track_duration(&meta(Some(3600.0), Some(60)), &t), 300.0);
        assert_eq!(average_track_duration(&meta(Some(3600.0), None), &t), 300.0);
        assert_eq!(average_track_duration(&meta(None, Some(10)), &t), 300.0);
    }

    #[test]
    fn test_gap_threshold_floor() {
        let t = Thresholds::default();
        assert_eq!(gap_threshold(240.0, &t), 360.0);
        assert_eq!(gap_threshold(400.0, &t), 460.0);
    }

    #[test]
    fn test_leading_gap() {
        let resolved: Vec<Resolved> = (0..10).map(|i| track(900.0 + 270.0 * i as f64)).collect();
        let (gaps, missing) = estimate_gaps(&resolved, &meta(Some(3600.0), None), &Thresholds::default());
        assert_eq!(
            gaps,
            vec![Gap {
                start_seconds: 0.0,
                duration_seconds: 900.0,
                estimated_missing_count: 3
            }]
        );
        assert_eq!(missing, 3);
    }

    #[test]
    fn test_interior_gap() {
        let resolved = vec![track(0.0), track(300.0), track(1500.0), track(1800.0)];
        let (gaps, missing) = estimate_gaps(&resolved, &meta(Some(2100.0), None), &Thresholds::default());
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start_seconds, 600.0);
        assert_eq!(gaps[0].duration_seconds, 900.0);
        assert_eq!(gaps[0].estimated_missing_count, 3);
        assert_eq!(missing, 3);
    }

    #[test]
    fn test_gap_after_conflict_starts_from_latest_candidate() {
        let conflict = Resolved::Conflict(ConflictGroup {
            timestamp_seconds: 100.0,
            candidates: vec![
                IdentificationRecord::new("a", "Glue", "Bicep", Some(100.0), Source::CommunityComment),
                IdentificationRecord::new("b", "Apricots", "Four Tet", Some(150.0), Source::CommunityComment),
            ],
        });
        let resolved = vec![conflict, track(1000.0)];
        let (gaps, missing) = estimate_gaps(&resolved, &meta(Some(3600.0), None), &Thresholds::default());
        assert_eq!(
            gaps,
            vec![Gap {
                start_seconds: 450.0,
                duration_seconds: 550.0,
                estimated_missing_count: 1
            }]
        );
        assert_eq!(missing, 1);
    }

    #[test]
    fn test_no_zero_length_gaps_without_padding() {
        let t = Thresholds {
            gap_padding_seconds: 0.0,
            min_gap_threshold_seconds: 100.0,
            ..Thresholds::default()
        };
        // Exactly one average song apart
        let resolved = vec![track(0.0), track(300.0)];
        let (gaps, missing) = estimate_gaps(&resolved, &meta(Some(3600.0), None), &t);
        assert!(gaps.is_empty(), "{:?}", gaps);
        assert_eq!(missing, 0);

        let resolved = vec![track(0.0), track(700.0)];
        let (gaps, _) = estimate_gaps(&resolved, &meta(Some(3600.0), None), &t);
        assert_eq!(gaps.len(), 1);
        assert!(gaps[0].duration_seconds > 0.0);
    }

    #[test]
    fn test_short_pauses_ignored() {
        let resolved = vec![track(0.0), track(300.0), track(650.0)];
        let (gaps, missing) = estimate_gaps(&resolved, &meta(None, None), &Thresholds::default());
        assert!(gaps.is_empty());
        assert_eq!(missing, 0);
    }

    #[test]
    fn test_cap_trims_in_timeline_order() {
        // Budget: floor(3500 / 240) - 6 = 8; the interior gap would hold 3
        let resolved: Vec<Resolved> = [1800.0, 2100.0, 3300.0, 3360.0, 3420.0, 3480.0]
            .iter()
            .map(|&ts| track(ts))
            .collect();
        let (gaps, missing) = estimate_gaps(&resolved, &meta(Some(3500.0), None), &Thresholds::default());
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].estimated_missing_count, 6);
        assert_eq!(gaps[1].start_seconds, 2400.0);
        assert_eq!(gaps[1].estimated_missing_count, 2);
        assert_eq!(missing, 8);

        // Budget: floor(2700 / 240) - 7 = 4, all taken by the leading gap
        let resolved: Vec<Resolved> = [1800.0, 1860.0, 1920.0, 1980.0, 2040.0, 2100.0, 2700.0]
            .iter()
            .map(|&ts| track(ts))
            .collect();
        let (gaps, missing) = estimate_gaps(&resolved, &meta(Some(2700.0), None), &Thresholds::default());
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start_seconds, 0.0);
        assert_eq!(gaps[0].estimated_missing_count, 4);
        assert_eq!(missing, 4);
    }

    #[test]
    fn test_no_budget_drops_every_gap() {
        let resolved = vec![track(0.0), track(1200.0)];
        let (gaps, missing) = estimate_gaps(&resolved, &meta(Some(240.0), None), &Thresholds::default());
        assert!(gaps.is_empty());
        assert_eq!(missing, 0);
    }

    #[test]
    fn test_missing_duration_uses_last_timestamp() {
        // Effective duration 2100 + 300 = 2400, budget 10 - 2 = 8
        let resolved = vec![track(0.0), track(2100.0)];
        let (gaps, missing) = estimate_gaps(&resolved, &meta(None, None), &Thresholds::default());
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].estimated_missing_count, 6);
        assert_eq!(missing, 6);
    }

    #[test]
    fn test_nothing_resolved() {
        let (gaps, missing) = estimate_gaps(&[], &meta(Some(3600.0), None), &Thresholds::default());
        assert!(gaps.is_empty());
        assert_eq!(missing, 0);
    }
}

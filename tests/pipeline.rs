//! End-to-end properties of the reconciliation pipeline.

use tracklist::{
    is_low_quality, is_same_track, reconcile, IdentificationRecord, PerformanceMetadata, Source, Thresholds,
    Tracklist, TracklistItem,
};

fn rec(id: &str, title: &str, artist: &str, ts: Option<f64>, source: Source) -> IdentificationRecord {
    IdentificationRecord::new(id, title, artist, ts, source)
}

fn comment(id: &str, title: &str, artist: &str, ts: f64) -> IdentificationRecord {
    rec(id, title, artist, Some(ts), Source::CommunityComment)
}

fn hour_long() -> PerformanceMetadata {
    PerformanceMetadata {
        total_duration_seconds: Some(3600.0),
        ..Default::default()
    }
}

/// A messy but realistic hour-long set.
fn messy_set() -> Vec<IdentificationRecord> {
    vec![
        comment("c1", "ID", "ID", 30.0),
        comment("c2", "12. Glue (Original Mix)", "Bicep", 905.0),
        rec("c3", "Glue", "BICEP", Some(930.0), Source::AiAudioMatch).with_confidence(0.9),
        comment("c4", "love this track", "Bicep", 940.0),
        comment("c5", "Won't Stop", "DJ X", 1200.0),
        comment("c6", "Midnight Drive", "Kerri Chandler", 1500.0),
        comment("c7", "Solar Flare", "Bicep", 1520.0),
        rec("c8", "Atlas", "Four Tet", Some(2400.0), Source::Catalog),
        rec("c9", "Baby", "Four Tet", Some(2410.0), Source::AiAudioMatch).with_confidence(0.2),
        rec("c10", "wont stop", "dj x", Some(3300.0), Source::UserManual).with_verified(true),
        rec("c11", "Apricots", "Bicep", None, Source::UserSocial),
        comment("c12", "Innerbloom", "Rufus Du Sol", 3000.0).with_conflict_ref("vote-1"),
        comment("c13", "Lights", "Alice", 3010.0).with_conflict_ref("vote-1"),
    ]
}

fn all_ids(tracklist: &Tracklist) -> Vec<String> {
    let mut ids = Vec::new();
    for item in &tracklist.items {
        match item {
            TracklistItem::Track(r) => ids.push(r.id.clone()),
            TracklistItem::Conflict(c) => ids.extend(c.candidates.iter().map(|r| r.id.clone())),
            TracklistItem::ExternalConflict(e) => ids.extend(e.candidates.iter().map(|r| r.id.clone())),
            TracklistItem::Gap(_) => {}
        }
    }
    ids.extend(tracklist.unplaced.iter().map(|r| r.id.clone()));
    ids
}

#[test]
fn verified_duplicate_wins_across_the_set() {
    let records = vec![
        comment("a", "Won't Stop", "DJ X", 1200.0),
        rec("b", "wont stop", "dj x", Some(3300.0), Source::CommunityComment).with_verified(true),
    ];
    let out = reconcile(&records, &hour_long(), &Thresholds::default());
    let tracks: Vec<&IdentificationRecord> = out
        .items
        .iter()
        .filter_map(|i| match i {
            TracklistItem::Track(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, "b");
    assert_eq!(tracks[0].timestamp_seconds, Some(3300.0));
}

#[test]
fn leading_gap_example() {
    let songs = [
        ("Glue", "Bicep"),
        ("Atlas", "Four Tet"),
        ("Strings of Life", "Rhythim Is Rhythim"),
        ("Innerbloom", "Rufus Du Sol"),
        ("Midnight City", "M83"),
        ("Solar Flare", "Kerri Chandler"),
        ("Xtal", "Aphex Twin"),
        ("Born Slippy", "Underworld"),
        ("Promised Land", "Joe Smooth"),
        ("Music Sounds Better", "Stardust"),
    ];
    let records: Vec<IdentificationRecord> = songs
        .iter()
        .enumerate()
        .map(|(i, (title, artist))| {
            rec(&format!("t{}", i), title, artist, Some(900.0 + 270.0 * i as f64), Source::Catalog)
        })
        .collect();
    let out = reconcile(&records, &hour_long(), &Thresholds::default());

    assert_eq!(out.track_count(), 10);
    match &out.items[0] {
        TracklistItem::Gap(gap) => {
            assert_eq!(gap.start_seconds, 0.0);
            assert_eq!(gap.duration_seconds, 900.0);
            assert_eq!(gap.estimated_missing_count, 3);
        }
        other => panic!("expected a leading gap, got {:?}", other),
    }
    assert_eq!(out.estimated_missing_tracks, 3);
}

#[test]
fn featuring_credit_is_the_same_track() {
    let records = vec![comment("a", "Lights", "Alice", 600.0), comment("b", "Lights", "Alice ft. Bob", 660.0)];
    let out = reconcile(&records, &PerformanceMetadata::default(), &Thresholds::default());
    assert_eq!(out.items.len(), 1);
    assert_eq!(out.track_count(), 1);
}

#[test]
fn equally_scored_distinct_songs_conflict() {
    let records = vec![
        comment("a", "Midnight Drive", "Kerri Chandler", 100.0),
        comment("b", "Solar Flare", "Bicep", 110.0),
        comment("c", "Golden Hour", "Fred again..", 120.0),
    ];
    let out = reconcile(&records, &PerformanceMetadata::default(), &Thresholds::default());
    assert_eq!(out.items.len(), 1);
    match &out.items[0] {
        TracklistItem::Conflict(group) => {
            assert!(group.candidates.len() >= 2 && group.candidates.len() <= 3);
            assert_eq!(group.timestamp_seconds, 100.0);
        }
        other => panic!("expected a conflict, got {:?}", other),
    }
}

#[test]
fn output_is_ordered() {
    let out = reconcile(&messy_set(), &hour_long(), &Thresholds::default());
    let stamps: Vec<f64> = out.items.iter().map(TracklistItem::timestamp).collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]), "unordered: {:?}", stamps);
}

#[test]
fn reconcile_is_idempotent() {
    let thresholds = Thresholds::default();
    let first = serde_json::to_string(&reconcile(&messy_set(), &hour_long(), &thresholds)).unwrap();
    let second = serde_json::to_string(&reconcile(&messy_set(), &hour_long(), &thresholds)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn low_quality_records_never_surface() {
    let thresholds = Thresholds::default();
    let records = messy_set();
    let out = reconcile(&records, &hour_long(), &thresholds);
    let ids = all_ids(&out);

    for record in records.iter().filter(|r| is_low_quality(r, &thresholds)) {
        assert!(!ids.contains(&record.id), "{} leaked into the output", record.id);
    }
    assert!(!ids.contains(&"c1".to_string()));
    assert!(!ids.contains(&"c4".to_string()));
    assert!(!ids.contains(&"c9".to_string()));
}

#[test]
fn gaps_are_positive() {
    let out = reconcile(&messy_set(), &hour_long(), &Thresholds::default());
    let mut total = 0;
    for item in &out.items {
        if let TracklistItem::Gap(gap) = item {
            assert!(gap.duration_seconds > 0.0);
            assert!(gap.estimated_missing_count >= 1);
            total += gap.estimated_missing_count;
        }
    }
    assert_eq!(total, out.estimated_missing_tracks);
}

#[test]
fn messy_set_shape() {
    let out = reconcile(&messy_set(), &hour_long(), &Thresholds::default());

    // Glue variants collapse into one slot
    let glue: Vec<&IdentificationRecord> = out
        .items
        .iter()
        .filter_map(|i| match i {
            TracklistItem::Track(r) if r.title.contains("Glue") => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(glue.len(), 1);

    // The unverified "Won't Stop" loses to the verified manual entry
    let ids = all_ids(&out);
    assert!(!ids.contains(&"c5".to_string()));
    assert!(ids.contains(&"c10".to_string()));

    // Conflict-ref records only appear inside their external conflict
    let external: Vec<_> = out
        .items
        .iter()
        .filter_map(|i| match i {
            TracklistItem::ExternalConflict(e) => Some(e),
            _ => None,
        })
        .collect();
    assert_eq!(external.len(), 1);
    assert_eq!(external[0].conflict_ref, "vote-1");
    assert_eq!(external[0].candidates.len(), 2);

    assert_eq!(out.unplaced.len(), 1);
    assert_eq!(out.unplaced[0].id, "c11");
}

#[test]
fn every_output_record_is_an_input() {
    let records = messy_set();
    let out = reconcile(&records, &hour_long(), &Thresholds::default());
    for id in all_ids(&out) {
        assert!(records.iter().any(|r| r.id == id));
    }
}

#[test]
fn matcher_is_symmetric_over_the_set() {
    let records = messy_set();
    for a in &records {
        for b in &records {
            assert_eq!(is_same_track(a, b), is_same_track(b, a), "{} / {}", a.id, b.id);
        }
    }
}

#[test]
fn tracklist_json_round_trips() {
    let out = reconcile(&messy_set(), &hour_long(), &Thresholds::default());
    let json = serde_json::to_string(&out).unwrap();
    let back: Tracklist = serde_json::from_str(&json).unwrap();
    assert_eq!(back, out);
}

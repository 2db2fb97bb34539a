//! Plain-text rendering of a reconciled tracklist.

use crate::normalize::{clean_display_name, format_timestamp};
use crate::record::{IdentificationRecord, PerformanceMetadata, Source};
use crate::tracklist::{Tracklist, TracklistItem};

fn source_label(source: Source) -> &'static str {
    match source {
        Source::Catalog => "catalog",
        Source::CommunityComment => "comment",
        Source::AiAudioMatch => "audio match",
        Source::UserManual => "user",
        Source::UserSocial => "social",
    }
}

fn describe(record: &IdentificationRecord) -> String {
    let artist = record.artist.trim();
    let title = clean_display_name(&record.title);
    let mut line = if artist.is_empty() {
        title
    } else {
        format!("{} - {}", artist, title)
    };
    line.push_str(&format!(" [{}", source_label(record.source)));
    if record.verified {
        line.push_str(", verified");
    }
    line.push(']');
    line
}

fn heading(report: &mut String, text: &str) {
    report.push_str(text);
    report.push('\n');
    report.push_str(&"-".repeat(text.chars().count()));
    report.push('\n');
}

/// Generate a human-readable listing of an assembled tracklist.
pub fn generate_report(performance_id: &str, metadata: &PerformanceMetadata, tracklist: &Tracklist) -> String {
    let mut report = String::new();

    let title = match (&metadata.performer, &metadata.title) {
        (Some(performer), Some(title)) => format!("{} - {}", performer, title),
        (None, Some(title)) => title.clone(),
        (Some(performer), None) => performer.clone(),
        (None, None) => format!("Performance {}", performance_id),
    };
    report.push_str(&title);
    report.push('\n');
    report.push_str(&"=".repeat(title.chars().count()));
    report.push_str("\n\n");

    if let Some(total) = metadata.known_duration() {
        report.push_str(&format!("Duration: {}\n", format_timestamp(total)));
    }
    report.push_str(&format!(
        "Tracks: {}  Estimated missing: {}\n\n",
        tracklist.track_count(),
        tracklist.estimated_missing_tracks
    ));

    heading(&mut report, "Tracklist");
    if tracklist.items.is_empty() {
        report.push_str("(nothing identified)\n");
    }
    for item in &tracklist.items {
        let at = format!("{:>8}", format_timestamp(item.timestamp()));
        match item {
            TracklistItem::Track(record) => {
                report.push_str(&format!("{}  {}\n", at, describe(record)));
            }
            TracklistItem::Gap(gap) => {
                report.push_str(&format!(
                    "{}  ?? about {} unidentified track(s) over {}\n",
                    at,
                    gap.estimated_missing_count,
                    format_timestamp(gap.duration_seconds)
                ));
            }
            TracklistItem::Conflict(group) => {
                report.push_str(&format!("{}  one of:\n", at));
                for (i, candidate) in group.candidates.iter().enumerate() {
                    report.push_str(&format!("{:>8}    {}) {} ({})\n", "", i + 1, describe(candidate), candidate.id));
                }
            }
            TracklistItem::ExternalConflict(conflict) => {
                report.push_str(&format!("{}  open vote {}:\n", at, conflict.conflict_ref));
                for candidate in &conflict.candidates {
                    report.push_str(&format!("{:>8}    - {} ({})\n", "", describe(candidate), candidate.id));
                }
            }
        }
    }

    if !tracklist.unplaced.is_empty() {
        report.push('\n');
        heading(&mut report, "Identified, position unknown");
        for record in &tracklist.unplaced {
            report.push_str(&format!("  {}\n", describe(record)));
        }
    }

    report
}

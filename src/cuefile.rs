//! CUE sheet generation for reconciled tracklists.
//!
//! Every resolved track becomes a `TRACK`.  A conflict group contributes its
//! top candidate with the alternatives in a `REM CONFLICT` line; gaps and
//! backend conflicts are kept as top-level `REM` lines.  Sheets that still
//! contain conflicts are written with a `.guess.cue` suffix.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::normalize::clean_display_name;
use crate::record::{IdentificationRecord, PerformanceMetadata};
use crate::tracklist::{Tracklist, TracklistItem};

/// CUE strings are double-quoted with no escape syntax.
fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "'"))
}

/// Position in MM:SS:FF (75 frames per second).
pub fn cue_index(pos: f64) -> String {
    let pos = pos.max(0.0);
    let minutes = (pos / 60.0) as u32;
    let seconds = (pos % 60.0) as u32;
    let frames = ((pos % 1.0) * 75.0) as u32;
    format!("{:02}:{:02}:{:02}", minutes, seconds, frames)
}

fn file_type(file_name: &str) -> &'static str {
    match Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => "MP3",
        Some("aif") | Some("aiff") => "AIFF",
        _ => "WAVE",
    }
}

fn push_track(cue: &mut String, number: usize, record: &IdentificationRecord) {
    cue.push_str(&format!("  TRACK {:02} AUDIO\n", number));
    cue.push_str(&format!("    TITLE {}\n", quoted(&clean_display_name(&record.title))));
    cue.push_str(&format!("    PERFORMER {}\n", quoted(record.artist.trim())));
}

fn describe(record: &IdentificationRecord) -> String {
    format!("{} - {}", record.artist.trim(), clean_display_name(&record.title))
}

/// True when no item is waiting on a human decision.
pub fn is_settled(tracklist: &Tracklist) -> bool {
    !tracklist
        .items
        .iter()
        .any(|i| matches!(i, TracklistItem::Conflict(_) | TracklistItem::ExternalConflict(_)))
}

/// Generate CUE file content for an assembled tracklist.
///
/// # Arguments
/// * `metadata` - Performance metadata (title and performer)
/// * `file_name` - Audio file the sheet refers to
/// * `tracklist` - Output of the reconciliation pipeline
pub fn generate_cue_sheet(metadata: &PerformanceMetadata, file_name: &str, tracklist: &Tracklist) -> String {
    let audio_name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);

    let mut cue = String::new();
    cue.push_str("REM GENERATOR \"tracklist\"\n");
    if tracklist.estimated_missing_tracks > 0 {
        cue.push_str(&format!("REM MISSING_TRACKS {}\n", tracklist.estimated_missing_tracks));
    }
    cue.push_str(&format!(
        "PERFORMER {}\n",
        quoted(metadata.performer.as_deref().unwrap_or("Various Artists"))
    ));
    cue.push_str(&format!(
        "TITLE {}\n",
        quoted(metadata.title.as_deref().unwrap_or("Unknown Performance"))
    ));
    cue.push_str(&format!("FILE {} {}\n", quoted(audio_name), file_type(audio_name)));

    let mut number = 0;
    for item in &tracklist.items {
        match item {
            TracklistItem::Track(record) => {
                number += 1;
                push_track(&mut cue, number, record);
                cue.push_str(&format!("    INDEX 01 {}\n", cue_index(record.sort_key())));
            }
            TracklistItem::Conflict(group) => {
                let Some(top) = group.candidates.first() else {
                    continue;
                };
                number += 1;
                push_track(&mut cue, number, top);
                let alternatives: Vec<String> = group.candidates[1..].iter().map(describe).collect();
                cue.push_str(&format!("    REM CONFLICT {}\n", quoted(&alternatives.join(" / "))));
                cue.push_str(&format!("    INDEX 01 {}\n", cue_index(group.timestamp_seconds)));
            }
            TracklistItem::Gap(gap) => {
                cue.push_str(&format!(
                    "REM GAP {} {} {}\n",
                    cue_index(gap.start_seconds),
                    cue_index(gap.duration_seconds),
                    gap.estimated_missing_count
                ));
            }
            TracklistItem::ExternalConflict(conflict) => {
                let candidates: Vec<String> = conflict.candidates.iter().map(describe).collect();
                cue.push_str(&format!(
                    "REM VOTE {} {} {}\n",
                    conflict.conflict_ref,
                    cue_index(conflict.timestamp_seconds),
                    quoted(&candidates.join(" / "))
                ));
            }
        }
    }

    cue
}

/// Where the sheet for `audio_file` goes.
///
/// * settled tracklist: `<stem>.cue`
/// * open conflicts: `<stem>.guess.cue`
pub fn cue_path_for(audio_file: &Path, settled: bool) -> PathBuf {
    let base_path = audio_file.with_extension("");
    if settled {
        base_path.with_extension("cue")
    } else {
        PathBuf::from(format!("{}.guess.cue", base_path.display()))
    }
}

/// Write CUE file content to disk.
pub fn write_cue_file(path: &Path, cue_content: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(cue_content.as_bytes())?;
    tracing::info!(path = %path.display(), "cue sheet written");
    Ok(())
}

//! Noise rejection and quality scoring for identification records.
//!
//! Scraped comment sections are full of things that parse as a
//! "title - artist" pair but are not songs: placeholder IDs, reactions,
//! whole sentences.  [`is_low_quality`] throws those away before anything
//! else looks at them; [`quality_score`] ranks the survivors.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Thresholds;
use crate::record::IdentificationRecord;

/// Tokens that carry no identification on their own.
const NOISE_TOKENS: [&str; 7] = ["id", "", "unknown", "unknown track", "unknown artist", "tba", "tbc"];

/// "ID - ID", "id – id", "ID-ID"
static ID_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*id\s*[-–—]+\s*id\s*$").unwrap());

/// Comment and reaction phrasings that end up in title or artist fields.
static COMMENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)^love\s").unwrap(),
        Regex::new(r"(?i)^this is\s").unwrap(),
        Regex::new(r"(?i)^this one\b").unwrap(),
        Regex::new(r"(?i)^what a\s").unwrap(),
        Regex::new(r"(?i)^anyone know\b").unwrap(),
        Regex::new(r"(?i)^does anyone\b").unwrap(),
        Regex::new(r"(?i)^who (?:knows|has)\b").unwrap(),
        Regex::new(r"(?i)^(?:need|want) this\b").unwrap(),
        Regex::new(r"(?i)^(?:omg|wow)\b.*[!?]$").unwrap(),
        Regex::new(r"(?i)\b(?:fire|banger|tune|heater)\s*!+\s*$").unwrap(),
        Regex::new(r"(?i)^(?:track|song) id\b").unwrap(),
        // Sentence boundary; "Mr. Brightside" and "St. Germain" must survive
        Regex::new(r"[a-z]{3,}[.!?] [A-Z][a-z]").unwrap(),
    ]
});

/// "(2021)", "[2019]"
static YEAR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\(\[]\s*\d{4}\s*[\)\]]").unwrap());

/// Release-status words that decorate titles from scraped sources.
static RELEASE_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:release|released|unreleased|coming soon)\b").unwrap());

/// True when the text is empty or one of the noise tokens.
pub fn is_placeholder(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    NOISE_TOKENS.contains(&t.as_str())
}

fn alphabetic_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphabetic()).count()
}

fn looks_like_comment(text: &str) -> bool {
    let t = text.trim();
    !t.is_empty() && COMMENT_PATTERNS.iter().any(|re| re.is_match(t))
}

/// Title carries release-year or release-status decoration.
pub fn has_metadata_noise(title: &str) -> bool {
    YEAR_TAG.is_match(title) || RELEASE_NOISE.is_match(title)
}

/// Decide whether a record is noise that must not enter the pipeline.
pub fn is_low_quality(record: &IdentificationRecord, thresholds: &Thresholds) -> bool {
    let title = record.title.trim();
    let artist = record.artist.trim();

    if is_placeholder(title) && is_placeholder(artist) {
        return true;
    }

    let combined = format!("{} - {}", title, artist);
    if ID_PLACEHOLDER.is_match(title) || ID_PLACEHOLDER.is_match(artist) || ID_PLACEHOLDER.is_match(&combined) {
        return true;
    }

    if alphabetic_count(title) < 3 && alphabetic_count(artist) < 3 {
        return true;
    }

    if looks_like_comment(title) || looks_like_comment(artist) {
        return true;
    }

    // Parser copied the same field into both slots
    if !title.is_empty() && title == artist {
        return true;
    }

    matches!(record.confidence, Some(c) if c < thresholds.min_confidence)
}

/// A candidate that is usable but missing half its identification.
pub fn is_weak_candidate(record: &IdentificationRecord, thresholds: &Thresholds) -> bool {
    is_placeholder(&record.title) || is_placeholder(&record.artist) || is_low_quality(record, thresholds)
}

/// Additive quality score used to rank candidates competing for a time slot.
///
/// * +3 artist present and not a placeholder
/// * +3 title present and not a placeholder
/// * +4 catalog source, +1 scraped platform source
/// * +3 verified
/// * +2 confidence above 0.7 (or absent), +1 above 0.5
/// * +1 title free of release noise
pub fn quality_score(record: &IdentificationRecord) -> i32 {
    let mut score = 0;

    if !is_placeholder(&record.artist) {
        score += 3;
    }
    if !is_placeholder(&record.title) {
        score += 3;
    }

    if record.source.is_catalog() {
        score += 4;
    } else if record.source.is_scraped() {
        score += 1;
    }

    if record.verified {
        score += 3;
    }

    match record.confidence {
        None => score += 2,
        Some(c) if c > 0.7 => score += 2,
        Some(c) if c > 0.5 => score += 1,
        Some(_) => {}
    }

    if !has_metadata_noise(&record.title) {
        score += 1;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Source;

    fn rec(title: &str, artist: &str) -> IdentificationRecord {
        IdentificationRecord::new("r", title, artist, Some(0.0), Source::CommunityComment)
    }

    fn low(title: &str, artist: &str) -> bool {
        is_low_quality(&rec(title, artist), &Thresholds::default())
    }

    #[test]
    fn test_placeholder_pairs_rejected() {
        assert!(low("ID", "ID"));
        assert!(low("Unknown Track", "unknown artist"));
        assert!(low("", "TBA"));
        assert!(low("ID - ID", "Kerri Chandler"));
        assert!(low("ID", "ID–ID"));
    }

    #[test]
    fn test_too_few_letters_rejected() {
        assert!(low("12", "!!"));
        assert!(low("A1", "x"));
        // One usable field is enough
        assert!(!low("ok", "Bicep"));
    }

    #[test]
    fn test_comment_fragments_rejected() {
        assert!(low("love this track", "Bicep"));
        assert!(low("This is the one", "Bicep"));
        assert!(low("Glue", "absolute fire!"));
        assert!(low("What a tune. Need this", "Bicep"));
        assert!(low("anyone know this", "ID"));
    }

    #[test]
    fn test_swap_artifact_rejected() {
        assert!(low("Bicep", "Bicep"));
    }

    #[test]
    fn test_low_confidence_rejected() {
        let t = Thresholds::default();
        assert!(is_low_quality(&rec("Glue", "Bicep").with_confidence(0.2), &t));
        assert!(!is_low_quality(&rec("Glue", "Bicep").with_confidence(0.35), &t));
        assert!(!is_low_quality(&rec("Glue", "Bicep"), &t));
    }

    #[test]
    fn test_real_tracks_pass() {
        assert!(!low("Glue", "Bicep"));
        assert!(!low("Won't Stop", "DJ X"));
        assert!(!low("ID", "Fred again.."));
        assert!(!low("Strings of Life (Original Mix)", "Rhythim Is Rhythim"));
        assert!(!low("Mr. Brightside", "The Killers"));
        assert!(!low("Rose Rouge", "St. Germain"));
    }

    #[test]
    fn test_metadata_noise() {
        assert!(has_metadata_noise("Glue (2017)"));
        assert!(has_metadata_noise("Glue [Unreleased]"));
        assert!(has_metadata_noise("Glue - coming soon"));
        assert!(!has_metadata_noise("Glue"));
        assert!(!has_metadata_noise("Releaser"));
    }

    #[test]
    fn test_quality_score() {
        // 3 + 3 + 1 (scraped) + 2 (no confidence) + 1 (clean title)
        assert_eq!(quality_score(&rec("Glue", "Bicep")), 10);

        let catalog = IdentificationRecord::new("c", "Glue", "Bicep", Some(0.0), Source::Catalog)
            .with_verified(true)
            .with_confidence(0.6);
        // 3 + 3 + 4 + 3 + 1 + 1
        assert_eq!(quality_score(&catalog), 15);

        let weak = IdentificationRecord::new("w", "ID", "Bicep", Some(0.0), Source::AiAudioMatch)
            .with_confidence(0.4);
        assert_eq!(quality_score(&weak), 4);
    }

    #[test]
    fn test_weak_candidate() {
        let t = Thresholds::default();
        assert!(is_weak_candidate(&rec("ID", "Bicep"), &t));
        assert!(is_weak_candidate(&rec("Glue", "Unknown"), &t));
        assert!(!is_weak_candidate(&rec("Glue", "Bicep"), &t));
    }
}

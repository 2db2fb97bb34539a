//! Same-song detection between two identification records.
//!
//! Upstream sources disagree on spelling, punctuation, remix tags and even on
//! which field holds the title.  [`is_same_track`] runs a fixed battery of
//! rules, cheapest and most certain first, and answers on the first hit.
//! Every rule is symmetric, so the whole check is too.

use std::collections::BTreeSet;

use crate::normalize::{normalize, normalize_words};
use crate::record::IdentificationRecord;

/// Shared prefix length that ties two titles by the same artist together.
const SHARED_PREFIX_CHARS: usize = 5;
/// A title prefix that covers this share of the longer title is a truncation.
const PREFIX_COVERAGE: f64 = 0.6;
/// Length window of the title prefix used for swap detection.
const SWAP_PREFIX_MIN: usize = 6;
const SWAP_PREFIX_MAX: usize = 8;
const WORD_OVERLAP: f64 = 0.5;
/// Titles at least this long are looked for inside title+artist.
const EMBEDDED_TITLE_MIN: usize = 8;
const TYPO_MAX_LENGTH_DIFF: usize = 3;
const TYPO_AGREEMENT: f64 = 0.8;
const ARTIST_AGREEMENT: f64 = 0.7;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Order two strings as (shorter, longer) by character count.
fn by_length<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if char_len(a) <= char_len(b) {
        (a, b)
    } else {
        (b, a)
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// Characters that agree position by position over the shorter string.
fn positional_matches(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).filter(|(x, y)| x == y).count()
}

fn prefix_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Compare two already-normalized artist strings.
fn artists_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }

    let (short, long) = by_length(a, b);
    let short_len = char_len(short);
    if short_len > 2 && long.contains(short) {
        return true;
    }

    // "mhigh" vs "mhihg": compare against the shorter string
    short_len >= 3 && positional_matches(short, long) as f64 / short_len as f64 >= ARTIST_AGREEMENT
}

/// True when both records credit the same performer.
///
/// Absorbs formatting variants such as "M High", "High" and "MHigh".
/// Placeholder credits such as "Unknown" match each other; callers that
/// group by artist screen those out first.
pub fn is_same_artist(a: &IdentificationRecord, b: &IdentificationRecord) -> bool {
    artists_match(&normalize(&a.artist), &normalize(&b.artist))
}

/// Title and artist appear transposed between the two records.
fn fields_swapped(title_a: &str, artist_a: &str, title_b: &str, artist_b: &str) -> bool {
    let pa = prefix_chars(title_a, SWAP_PREFIX_MAX);
    let pb = prefix_chars(title_b, SWAP_PREFIX_MAX);
    if char_len(&pa) < SWAP_PREFIX_MIN || char_len(&pb) < SWAP_PREFIX_MIN {
        return false;
    }
    artist_b.contains(&pa) && artist_a.contains(&pb)
}

fn word_jaccard(a: &str, b: &str) -> f64 {
    let words = |s: &str| -> BTreeSet<String> {
        normalize_words(s)
            .into_iter()
            .filter(|w| char_len(w) > 2)
            .collect()
    };
    let wa = words(a);
    let wb = words(b);
    let union = wa.union(&wb).count();
    if union == 0 {
        return 0.0;
    }
    wa.intersection(&wb).count() as f64 / union as f64
}

/// Same length give or take a few characters, mostly the same letters.
fn near_match(a: &str, b: &str) -> bool {
    let (short, long) = by_length(a, b);
    let short_len = char_len(short);
    let long_len = char_len(long);
    if short_len < 4 || long_len - short_len > TYPO_MAX_LENGTH_DIFF {
        return false;
    }
    positional_matches(short, long) as f64 / long_len as f64 >= TYPO_AGREEMENT
}

/// Decide whether two records describe the same underlying song.
pub fn is_same_track(a: &IdentificationRecord, b: &IdentificationRecord) -> bool {
    let title_a = normalize(&a.title);
    let title_b = normalize(&b.title);
    if title_a.is_empty() || title_b.is_empty() {
        return false;
    }
    let artist_a = normalize(&a.artist);
    let artist_b = normalize(&b.artist);

    if title_a == title_b && artist_a == artist_b {
        return true;
    }

    // Artist metadata is the less reliable half
    if title_a == title_b {
        return true;
    }

    let same_artist = is_same_artist(a, b);
    let (short, long) = by_length(&title_a, &title_b);
    let short_len = char_len(short);
    let long_len = char_len(long);

    if same_artist && short_len >= 3 && long.contains(short) {
        return true;
    }

    if same_artist && common_prefix_len(&title_a, &title_b) >= SHARED_PREFIX_CHARS {
        return true;
    }

    if long.starts_with(short) && short_len as f64 >= PREFIX_COVERAGE * long_len as f64 {
        return true;
    }

    if fields_swapped(&title_a, &artist_a, &title_b, &artist_b) {
        return true;
    }

    if short_len >= 4 && long_len >= 5 && long.contains(short) {
        return true;
    }

    if char_len(&title_a) > 6 && char_len(&title_b) > 6 && word_jaccard(&a.title, &b.title) >= WORD_OVERLAP {
        return true;
    }

    let combined_a = format!("{}{}", title_a, artist_a);
    let combined_b = format!("{}{}", title_b, artist_b);
    if (char_len(&title_a) >= EMBEDDED_TITLE_MIN && combined_b.contains(&title_a))
        || (char_len(&title_b) >= EMBEDDED_TITLE_MIN && combined_a.contains(&title_b))
    {
        return true;
    }

    near_match(&title_a, &title_b)
}

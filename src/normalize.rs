//! Title/artist canonicalization and timestamp helpers.
//!
//! [`normalize`] is for comparison only and throws away everything that is not
//! a letter or digit.  [`clean_display_name`] is the light-touch variant used
//! when a title is shown to a person.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// "12. ", "75) ", "3 - " at the start of a title.
static ORDINAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d{1,3}\s*[.):\-]\s*").unwrap());

/// "(2019)", "[2021]"
static BRACKETED_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\(\[]\s*\d{4}\s*[\)\]]").unwrap());

/// "(Original Mix)", "[Extended Mix]", "(Radio Edit)", "(Club Mix)"
static MIX_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\(\[]\s*(?:original|extended|radio|club|album|vocal)?\s*(?:mix|edit|version)\s*[\)\]]")
        .unwrap()
});

/// "(feat. Somebody)", "[ft Somebody]"
static FEAT_BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[\(\[]\s*(?:feat|ft|featuring)\b\.?[^\)\]]*[\)\]]").unwrap());

/// "feat. Somebody" running to the end of the string
static FEAT_TRAILING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s(?:feat|ft|featuring)\b\.?\s.*$").unwrap());

/// Strip the decorations shared by [`normalize`] and [`normalize_words`].
fn strip_decorations(text: &str) -> String {
    let lowered = text.to_lowercase();
    let s = ORDINAL_PREFIX.replace(&lowered, "");
    let s = BRACKETED_YEAR.replace_all(&s, " ");
    let s = MIX_SUFFIX.replace_all(&s, " ");
    let s = FEAT_BRACKETED.replace_all(&s, " ");
    let s = FEAT_TRAILING.replace(&s, "");
    s.into_owned()
}

/// Canonical comparison key: lower-case, no ordinal prefix, no release year,
/// no "(Original Mix)" style suffix, no featuring credit, alphanumerics only.
pub fn normalize(text: &str) -> String {
    strip_decorations(text)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Same canonicalization as [`normalize`] but split into words.
pub fn normalize_words(text: &str) -> Vec<String> {
    strip_decorations(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

/// Strip a leading ordinal and balance parentheses for display.
pub fn clean_display_name(text: &str) -> String {
    let stripped = ORDINAL_PREFIX.replace(text, "");
    let mut out = String::with_capacity(stripped.len() + 2);
    let mut depth = 0usize;
    for c in stripped.chars() {
        match c {
            '(' => {
                depth += 1;
                out.push(c);
            }
            ')' => {
                // Stray closer with nothing open
                if depth == 0 {
                    continue;
                }
                depth -= 1;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    let mut out = out.trim().to_string();
    for _ in 0..depth {
        out.push(')');
    }
    out
}

/// Convert a cue string like "1:23:45" or "47:30" to seconds.
pub fn parse_cue_timestamp(cue: &str) -> Result<f64> {
    let invalid = || Error::InvalidTimestamp(cue.to_string());
    let parts: Vec<&str> = cue.trim().split(':').collect();
    let nums = parts
        .iter()
        .map(|p| p.trim().parse::<u32>().map_err(|_| invalid()))
        .collect::<Result<Vec<u32>>>()?;

    let seconds = match nums.as_slice() {
        [h, m, s] if *m < 60 && *s < 60 => h * 3600 + m * 60 + s,
        [m, s] if *s < 60 => m * 60 + s,
        _ => return Err(invalid()),
    };
    Ok(seconds as f64)
}

/// Format seconds as H:MM:SS, or M:SS below an hour.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

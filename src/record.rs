//! Identification records and performance metadata.
//!
//! These are the inputs to the reconciliation pipeline.  They arrive from the
//! tracklist service as JSON with camelCase field names.

use serde::{Deserialize, Serialize};

/// Where an identification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    /// Authoritative music database match
    Catalog,
    /// Scraped from comments under the performance
    CommunityComment,
    /// AI-driven audio matching service
    AiAudioMatch,
    /// Entered by a user in the app
    UserManual,
    /// Scraped from a social platform post
    UserSocial,
}

impl Source {
    /// Catalog-grade sources outrank everything else when picking a winner.
    pub fn is_catalog(self) -> bool {
        matches!(self, Source::Catalog)
    }

    /// Sources scraped from a public platform rather than entered or matched.
    pub fn is_scraped(self) -> bool {
        matches!(self, Source::CommunityComment | Source::UserSocial)
    }
}

/// One claim that a song played at a point in a performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_seconds: Option<f64>,
    /// No default; a record must say where it came from.
    pub source: Source,
    #[serde(default)]
    pub verified: bool,
    /// `None` means "assume high confidence".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Backend-tracked conflict this record takes part in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_ref: Option<String>,
}

impl IdentificationRecord {
    pub fn new(id: &str, title: &str, artist: &str, timestamp_seconds: Option<f64>, source: Source) -> Self {
        IdentificationRecord {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            timestamp_seconds,
            source,
            verified: false,
            confidence: None,
            conflict_ref: None,
        }
    }

    /// Build a user-contributed record with a fresh id.
    pub fn manual(title: &str, artist: &str, timestamp_seconds: Option<f64>) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        Self::new(&id, title.trim(), artist.trim(), timestamp_seconds, Source::UserManual)
    }

    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_conflict_ref(mut self, conflict_ref: &str) -> Self {
        self.conflict_ref = Some(conflict_ref.to_string());
        self
    }

    /// Timestamp used for ordering; unplaced records sort first.
    pub fn sort_key(&self) -> f64 {
        self.timestamp_seconds.unwrap_or(0.0)
    }
}

/// What is known about the performance as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_seconds: Option<f64>,
    /// Number of songs the performance is believed to contain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_count_hint: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
}

impl PerformanceMetadata {
    /// Total duration, if it is present and usable.
    pub fn known_duration(&self) -> Option<f64> {
        self.total_duration_seconds.filter(|d| d.is_finite() && *d > 0.0)
    }

    /// Whether a timestamp can be placed on this performance's timeline.
    pub fn accepts_timestamp(&self, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds < 0.0 {
            return false;
        }
        match self.known_duration() {
            Some(total) => seconds <= total,
            None => true,
        }
    }
}

/// A performance as stored by the tracklist service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub id: String,
    #[serde(default)]
    pub metadata: PerformanceMetadata,
    #[serde(default)]
    pub records: Vec<IdentificationRecord>,
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Every heuristic constant used by the reconciliation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Records closer than this are considered the same time slot
    pub min_track_gap_seconds: f64,
    /// Records below this confidence are rejected as noise
    pub min_confidence: f64,
    /// Score lead that lets the top candidate win without a vote
    pub auto_resolve_margin: i32,
    /// Minimum score for a candidate to stay in a conflict group
    pub min_conflict_score: i32,
    /// Maximum number of candidates shown in a conflict group
    pub max_conflict_candidates: usize,
    /// Average song length used when the performance gives no better estimate
    pub default_track_seconds: f64,
    /// Shortest plausible average song length
    pub min_track_seconds: f64,
    /// Longest plausible average song length
    pub max_track_seconds: f64,
    /// Slack added to the average song length before a gap counts
    pub gap_padding_seconds: f64,
    /// Gaps shorter than this are never reported
    pub min_gap_threshold_seconds: f64,
    /// Upper bound on song density used to cap missing-track estimates
    pub seconds_per_expected_track: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            min_track_gap_seconds: 75.0,
            min_confidence: 0.35,
            auto_resolve_margin: 2,
            min_conflict_score: 3,
            max_conflict_candidates: 3,
            default_track_seconds: 300.0,
            min_track_seconds: 150.0,
            max_track_seconds: 420.0,
            gap_padding_seconds: 60.0,
            min_gap_threshold_seconds: 360.0,
            seconds_per_expected_track: 240.0,
        }
    }
}

/// Configuration defaults that can be saved to a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_track_gap: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_resolve_margin: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_conflict_score: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_conflict_candidates: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_track_length: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_track_length: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_track_length: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_padding: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_gap: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_per_track: Option<f64>,
}

impl Config {
    /// Create a new empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the config file path (~/.state/tracklist/defaults.toml)
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| Error::Config("HOME environment variable not set".to_string()))?;

        let config_dir = Path::new(&home).join(".state").join("tracklist");
        Ok(config_dir.join("defaults.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load config from a specific file.  A missing file yields an empty config.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Merge this config with another, preferring values from other
    pub fn merge(&mut self, other: &Config) {
        if other.api_url.is_some() {
            self.api_url = other.api_url.clone();
        }
        if other.store_dir.is_some() {
            self.store_dir = other.store_dir.clone();
        }
        if other.min_track_gap.is_some() {
            self.min_track_gap = other.min_track_gap;
        }
        if other.min_confidence.is_some() {
            self.min_confidence = other.min_confidence;
        }
        if other.auto_resolve_margin.is_some() {
            self.auto_resolve_margin = other.auto_resolve_margin;
        }
        if other.min_conflict_score.is_some() {
            self.min_conflict_score = other.min_conflict_score;
        }
        if other.max_conflict_candidates.is_some() {
            self.max_conflict_candidates = other.max_conflict_candidates;
        }
        if other.default_track_length.is_some() {
            self.default_track_length = other.default_track_length;
        }
        if other.min_track_length.is_some() {
            self.min_track_length = other.min_track_length;
        }
        if other.max_track_length.is_some() {
            self.max_track_length = other.max_track_length;
        }
        if other.gap_padding.is_some() {
            self.gap_padding = other.gap_padding;
        }
        if other.min_gap.is_some() {
            self.min_gap = other.min_gap;
        }
        if other.seconds_per_track.is_some() {
            self.seconds_per_track = other.seconds_per_track;
        }
    }

    /// Resolve the overrides in this config onto the default thresholds
    pub fn thresholds(&self) -> Thresholds {
        let d = Thresholds::default();
        Thresholds {
            min_track_gap_seconds: self.min_track_gap.unwrap_or(d.min_track_gap_seconds),
            min_confidence: self.min_confidence.unwrap_or(d.min_confidence),
            auto_resolve_margin: self.auto_resolve_margin.unwrap_or(d.auto_resolve_margin),
            min_conflict_score: self.min_conflict_score.unwrap_or(d.min_conflict_score),
            max_conflict_candidates: self.max_conflict_candidates.unwrap_or(d.max_conflict_candidates),
            default_track_seconds: self.default_track_length.unwrap_or(d.default_track_seconds),
            min_track_seconds: self.min_track_length.unwrap_or(d.min_track_seconds),
            max_track_seconds: self.max_track_length.unwrap_or(d.max_track_seconds),
            gap_padding_seconds: self.gap_padding.unwrap_or(d.gap_padding_seconds),
            min_gap_threshold_seconds: self.min_gap.unwrap_or(d.min_gap_threshold_seconds),
            seconds_per_expected_track: self.seconds_per_track.unwrap_or(d.seconds_per_expected_track),
        }
    }

    /// Reject values that would make the pipeline misbehave
    pub fn validate(&self) -> Result<()> {
        let t = self.thresholds();

        if !(0.0..=1.0).contains(&t.min_confidence) {
            return Err(Error::Config(format!(
                "min_confidence must be within 0..1, got {}",
                t.min_confidence
            )));
        }
        if t.max_conflict_candidates < 2 {
            return Err(Error::Config("max_conflict_candidates must be at least 2".to_string()));
        }
        if t.min_track_seconds <= 0.0 || t.min_track_seconds > t.max_track_seconds {
            return Err(Error::Config(format!(
                "track length range {}..{} is invalid",
                t.min_track_seconds, t.max_track_seconds
            )));
        }
        if t.default_track_seconds <= 0.0 {
            return Err(Error::Config("default_track_length must be positive".to_string()));
        }
        let positive = [
            ("min_track_gap", t.min_track_gap_seconds),
            ("min_gap", t.min_gap_threshold_seconds),
            ("seconds_per_track", t.seconds_per_expected_track),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(Error::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if t.gap_padding_seconds < 0.0 {
            return Err(Error::Config("gap_padding must not be negative".to_string()));
        }
        Ok(())
    }

    /// Print the config in a human-readable format
    pub fn print(&self, title: &str) {
        let t = self.thresholds();
        println!("{}:", title);

        if let Some(api_url) = &self.api_url {
            println!("  API URL:                {}", api_url);
        }
        if let Some(store_dir) = &self.store_dir {
            println!("  Local store:            {}", store_dir);
        }
        println!("  Min track gap:          {} seconds", t.min_track_gap_seconds);
        println!("  Min confidence:         {}", t.min_confidence);
        println!("  Auto-resolve margin:    {} points", t.auto_resolve_margin);
        println!("  Min conflict score:     {} points", t.min_conflict_score);
        println!("  Max conflict options:   {}", t.max_conflict_candidates);
        println!("  Default track length:   {} seconds", t.default_track_seconds);
        println!("  Track length range:     {}-{} seconds", t.min_track_seconds, t.max_track_seconds);
        println!("  Gap padding:            {} seconds", t.gap_padding_seconds);
        println!("  Min gap:                {} seconds", t.min_gap_threshold_seconds);
        println!("  Seconds per track cap:  {} seconds", t.seconds_per_expected_track);
    }
}

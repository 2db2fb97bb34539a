pub mod cluster;
pub mod config;
pub mod cuefile;
pub mod dedup;
pub mod error;
pub mod gaps;
pub mod logging;
pub mod matcher;
pub mod normalize;
pub mod quality;
pub mod rate_limiter;
pub mod record;
pub mod report;
pub mod service;
pub mod service_file;
pub mod service_http;
pub mod tracklist;

pub use cluster::{cluster_records, ConflictGroup, Resolved};
pub use config::{Config, Thresholds};
pub use dedup::{dedupe, pick_best};
pub use error::{Error, Result};
pub use gaps::{estimate_gaps, Gap};
pub use matcher::{is_same_artist, is_same_track};
pub use normalize::{clean_display_name, normalize};
pub use quality::{is_low_quality, quality_score};
pub use record::{IdentificationRecord, Performance, PerformanceMetadata, Source};
pub use service::{merge_reidentified, TracklistService, VoteOutcome};
pub use tracklist::{assemble, reconcile, ExternalConflict, Tracklist, TracklistItem};

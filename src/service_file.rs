//! Local JSON-file backend for [`TracklistService`].
//!
//! One `<performance-id>.json` per performance in a store directory.  There
//! is nobody to vote with offline, so votes always report failure.

use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::record::{IdentificationRecord, Performance};
use crate::service::{TracklistService, VoteOutcome};

pub struct FileService {
    dir: PathBuf,
}

impl FileService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileService { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !id.starts_with('.');
        if !valid {
            return Err(Error::NotFound(format!("invalid performance id {:?}", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// Write a performance into the store, replacing any previous copy.
    pub fn save_performance(&self, performance: &Performance) -> Result<PathBuf> {
        let path = self.path_for(&performance.id)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, serde_json::to_string_pretty(performance)?)?;
        tracing::debug!(path = %path.display(), records = performance.records.len(), "performance saved");
        Ok(path)
    }
}

/// Load a JSON array of records, accepting a `file://` prefix.
fn read_batch(source: &str) -> Result<Vec<IdentificationRecord>> {
    let path = source.strip_prefix("file://").unwrap_or(source);
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.to_string()),
        _ => Error::Io(e),
    })?;
    Ok(serde_json::from_str(&content)?)
}

impl TracklistService for FileService {
    fn name(&self) -> &str {
        "local store"
    }

    fn fetch_performance(&self, id: &str) -> Result<Performance> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let performance: Performance = serde_json::from_str(&content)?;
        tracing::info!(performance = id, records = performance.records.len(), "loaded from local store");
        Ok(performance)
    }

    fn submit_record(&self, performance_id: &str, record: &IdentificationRecord) -> Result<()> {
        let mut performance = self.fetch_performance(performance_id)?;
        match performance.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => performance.records.push(record.clone()),
        }
        self.save_performance(&performance)?;
        tracing::info!(performance = performance_id, record = %record.id, "record stored");
        Ok(())
    }

    fn submit_vote(&self, _conflict_id: &str, _record_id: &str) -> Result<VoteOutcome> {
        Err(Error::Unsupported(format!("{} (voting needs the remote service)", self.name())))
    }

    fn reidentify(&self, _performance_id: &str, source_url: &str) -> Result<Vec<IdentificationRecord>> {
        read_batch(source_url)
    }
}

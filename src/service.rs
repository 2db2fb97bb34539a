//! Access to the tracklist data service with pluggable backends.
//!
//! The [`TracklistService`] trait is the boundary to everything the
//! reconciliation pipeline does not own: persistence, voting and
//! re-identification runs.  Implementations live in separate modules:
//!
//! * [`service_file::FileService`], a directory of JSON files
//! * [`service_http::HttpService`], the remote REST API
//!
//! [`service_file::FileService`]: crate::service_file::FileService
//! [`service_http::HttpService`]: crate::service_http::HttpService

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::{IdentificationRecord, Performance};

pub use crate::service_file::FileService;
pub use crate::service_http::HttpService;

/// Result of a vote on a backend-tracked conflict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<String>,
}

impl VoteOutcome {
    /// The vote did not go through.
    pub fn failed() -> Self {
        VoteOutcome::default()
    }

    /// The vote settled the conflict and the voter picked the winner.
    pub fn earns_reward(&self, my_selection: &str) -> bool {
        self.success && self.resolved == Some(true) && self.winner_id.as_deref() == Some(my_selection)
    }
}

/// Accept a re-identification batch only if it does not lose records.
///
/// Records are matched by id; fresh versions replace known ones, known
/// records keep their position and new ones are appended.
pub fn merge_reidentified(
    known: &[IdentificationRecord],
    fresh: Vec<IdentificationRecord>,
) -> Result<Vec<IdentificationRecord>> {
    if fresh.len() < known.len() {
        return Err(Error::ShrinkingUpdate {
            known: known.len(),
            offered: fresh.len(),
        });
    }

    let known_ids: BTreeSet<&str> = known.iter().map(|r| r.id.as_str()).collect();
    let (mut updates, added): (Vec<IdentificationRecord>, Vec<IdentificationRecord>) =
        fresh.into_iter().partition(|r| known_ids.contains(r.id.as_str()));

    let mut merged: Vec<IdentificationRecord> = Vec::with_capacity(known.len() + added.len());
    for record in known {
        match updates.iter().position(|u| u.id == record.id) {
            Some(idx) => merged.push(updates.swap_remove(idx)),
            None => merged.push(record.clone()),
        }
    }
    merged.extend(added);
    Ok(merged)
}

/// A backend holding performances and their identification records.
pub trait TracklistService {
    /// Short display name, e.g. "local store" or "remote API".
    fn name(&self) -> &str;

    fn fetch_performance(&self, id: &str) -> Result<Performance>;

    /// Store one new identification record for a performance.
    fn submit_record(&self, performance_id: &str, record: &IdentificationRecord) -> Result<()>;

    /// Cast a vote for `record_id` on a backend-tracked conflict.
    fn submit_vote(&self, conflict_id: &str, record_id: &str) -> Result<VoteOutcome>;

    /// Run identification against `source_url` again and return the new batch.
    fn reidentify(&self, performance_id: &str, source_url: &str) -> Result<Vec<IdentificationRecord>>;

    /// Vote, folding any failure into an unsuccessful outcome.
    fn vote(&self, conflict_id: &str, record_id: &str) -> VoteOutcome {
        match self.submit_vote(conflict_id, record_id) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(backend = self.name(), conflict = conflict_id, error = %e, "vote failed");
                VoteOutcome::failed()
            }
        }
    }

    /// Re-identify and merge the fresh batch into the known records.
    ///
    /// Fails with [`Error::ShrinkingUpdate`] when the batch is smaller than
    /// what is already known.
    fn refresh_from_source(&self, performance_id: &str, source_url: &str) -> Result<Vec<IdentificationRecord>> {
        let current = self.fetch_performance(performance_id)?;
        let fresh = self.reidentify(performance_id, source_url)?;
        tracing::info!(
            backend = self.name(),
            performance = performance_id,
            known = current.records.len(),
            offered = fresh.len(),
            "re-identification batch received"
        );

        merge_reidentified(&current.records, fresh).map_err(|e| {
            tracing::warn!(performance = performance_id, error = %e, "re-identification refused");
            e
        })
    }
}

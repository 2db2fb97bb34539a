//! REST backend for [`TracklistService`].
//!
//! Endpoints, relative to the configured base URL:
//!
//! * `GET  /performances/{id}`
//! * `POST /performances/{id}/records`
//! * `POST /conflicts/{id}/votes`
//! * `POST /performances/{id}/reidentify`

use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rate_limiter::RateLimiter;
use crate::record::{IdentificationRecord, Performance};
use crate::service::{TracklistService, VoteOutcome};

const USER_AGENT: &str = concat!("tracklist/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Re-identification runs audio matching server-side and takes a while.
const REIDENTIFY_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest<'a> {
    record_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReidentifyRequest<'a> {
    source_url: &'a str,
}

#[derive(Deserialize)]
struct ReidentifyResponse {
    #[serde(default)]
    records: Vec<IdentificationRecord>,
}

pub struct HttpService {
    base_url: String,
    rate_limiter: Mutex<RateLimiter>,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        HttpService {
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: Mutex::new(RateLimiter::from_millis("tracklist-api", 250)),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// URL of `{collection}/{id}/{action}` with the id percent-encoded.
    fn resource_url(&self, collection: &str, id: &str, action: Option<&str>) -> String {
        let path = match action {
            Some(action) => format!("{}/{}/{}", collection, urlencoding::encode(id), action),
            None => format!("{}/{}", collection, urlencoding::encode(id)),
        };
        self.url(&path)
    }

    /// Run one request under the rate limiter.
    fn send<F>(&self, request: F) -> Result<ureq::Response>
    where
        F: FnOnce() -> std::result::Result<ureq::Response, ureq::Error>,
    {
        let mut limiter = self.rate_limiter.lock().unwrap_or_else(|e| e.into_inner());
        limiter.wait_if_needed();

        match request() {
            Ok(response) => {
                limiter.report_success();
                Ok(response)
            }
            Err(e) => {
                // Client errors are the caller's fault, not a reason to slow down
                if !matches!(e, ureq::Error::Status(code, _) if code < 500) {
                    limiter.report_failure();
                }
                Err(e.into())
            }
        }
    }

    /// Run one request and decode the JSON reply.
    fn call<T, F>(&self, request: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> std::result::Result<ureq::Response, ureq::Error>,
    {
        let response = self.send(request)?;
        Ok(serde_json::from_reader(response.into_reader())?)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!(url, "GET");
        self.call(|| {
            ureq::get(url)
                .set("User-Agent", USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .call()
        })
    }

    fn post_json<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B, timeout: Duration) -> Result<T> {
        tracing::debug!(url, "POST");
        let payload = serde_json::to_value(body)?;
        self.call(|| {
            ureq::post(url)
                .set("User-Agent", USER_AGENT)
                .timeout(timeout)
                .send_json(payload)
        })
    }

    /// POST where any 2xx counts as accepted and the reply body is ignored.
    fn post_accepted<B: Serialize>(&self, url: &str, body: &B) -> Result<u16> {
        tracing::debug!(url, "POST");
        let payload = serde_json::to_value(body)?;
        let response = self.send(|| {
            ureq::post(url)
                .set("User-Agent", USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .send_json(payload)
        })?;
        Ok(response.status())
    }
}

impl TracklistService for HttpService {
    fn name(&self) -> &str {
        "remote API"
    }

    fn fetch_performance(&self, id: &str) -> Result<Performance> {
        let performance: Performance = self.get_json(&self.resource_url("performances", id, None))?;
        tracing::info!(performance = id, records = performance.records.len(), "fetched from remote API");
        Ok(performance)
    }

    fn submit_record(&self, performance_id: &str, record: &IdentificationRecord) -> Result<()> {
        let url = self.resource_url("performances", performance_id, Some("records"));
        let status = self.post_accepted(&url, record)?;
        tracing::info!(performance = performance_id, record = %record.id, status, "record submitted");
        Ok(())
    }

    fn submit_vote(&self, conflict_id: &str, record_id: &str) -> Result<VoteOutcome> {
        let url = self.resource_url("conflicts", conflict_id, Some("votes"));
        let outcome: VoteOutcome = self.post_json(&url, &VoteRequest { record_id }, REQUEST_TIMEOUT)?;
        tracing::info!(
            conflict = conflict_id,
            success = outcome.success,
            resolved = ?outcome.resolved,
            "vote submitted"
        );
        Ok(outcome)
    }

    fn reidentify(&self, performance_id: &str, source_url: &str) -> Result<Vec<IdentificationRecord>> {
        let url = self.resource_url("performances", performance_id, Some("reidentify"));
        let response: ReidentifyResponse =
            self.post_json(&url, &ReidentifyRequest { source_url }, REIDENTIFY_TIMEOUT)?;
        Ok(response.records)
    }
}

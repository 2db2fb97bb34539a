//! Error type shared by the configuration, export and service layers.
//!
//! The reconciliation pipeline itself never fails; errors only come from
//! reading/writing files and talking to the remote tracklist service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("http error: {0}")]
    Http(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A re-identification batch would reduce the number of known records.
    #[error("refusing update: {offered} record(s) offered, {known} already known")]
    ShrinkingUpdate { known: usize, offered: usize },

    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("not supported by {0}")]
    Unsupported(String),
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(404, resp) => Error::NotFound(resp.get_url().to_string()),
            other => Error::Http(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

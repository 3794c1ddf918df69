//! Error taxonomy of a collection run.
//!
//! Directory errors abort a run, status errors are downgraded to `unknown` by the
//! collector, persistence errors lose the run's data but never the process.
use std::fmt;
use std::io;

use thiserror::Error;

use crate::status::LotId;

/// Failure to fetch a page from the upstream site.
#[derive(Debug, Error)]
#[error("failed to fetch {url}: {source}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl FetchError {
    pub fn new<E>(url: &str, source: E) -> FetchError
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        FetchError {
            url: String::from(url),
            source: source.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("lot listing unavailable: {0}")]
    Unavailable(#[from] FetchError),
    #[error("lot listing malformed: no element matches `{selector}` on {url}")]
    Malformed { url: String, selector: String },
}

/// Why a single lot could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    Fetch,
    MissingContainer,
    MissingIndicator,
    MissingSource,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            UnavailableReason::Fetch => "detail page could not be fetched",
            UnavailableReason::MissingContainer => "no parking details table found",
            UnavailableReason::MissingIndicator => "no parking details image found",
            UnavailableReason::MissingSource => "status image has no src",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
#[error("status of lot {id} unavailable: {reason}")]
pub struct StatusUnavailable {
    pub id: LotId,
    pub reason: UnavailableReason,
    #[source]
    pub fetch: Option<FetchError>,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not a valid store: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("a run recorded at {0} is already stored")]
    DuplicateTimestamp(String),
    #[error("run at {key} is older than the latest stored run at {latest}")]
    OutOfOrder { key: String, latest: String },
}

impl PersistenceError {
    pub fn io<S: Into<String>>(context: S, source: io::Error) -> PersistenceError {
        PersistenceError::Io {
            context: context.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
    #[error("invalid url `{url}`: {message}")]
    Url { url: String, message: String },
    #[error("invalid schedule minute {0} (expected 0..=59)")]
    Minute(u32),
    #[error("schedule has no minute marks")]
    EmptySchedule,
    #[error("request timeout must be at least one second")]
    Timeout,
    #[error("gate threshold must be non-negative, got {0}")]
    Threshold(f64),
    #[error("cannot build http client: {0}")]
    Client(#[from] reqwest::Error),
}

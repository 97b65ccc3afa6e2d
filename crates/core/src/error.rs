use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Config file {path} could not be read: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Region {selector} does not exist on the page")]
    MissingRegion { selector: String },

    #[error("Endpoint {endpoint} cannot be used as a base URL")]
    InvalidEndpoint { endpoint: String },

    #[error("Tracker must be installed from within a tokio runtime")]
    NoRuntime,

    #[error("Request to {url} was not delivered")]
    NotDelivered { url: String },

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

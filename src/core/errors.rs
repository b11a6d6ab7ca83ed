// src/core/errors.rs

//! Defines the primary error type used across the maintenance daemon.

use std::sync::Arc;
use thiserror::Error;

/// The maintenance daemon's error taxonomy.
///
/// Handlers never propagate these up to the main loop: a stage machine folds
/// a failure into a stage transition (retry, fail, or escalate) and reports
/// it through `AlarmSink`. This type exists for the bootstrap path
/// (`main.rs`, config loading) and for leaf operations (BMC executor, secret
/// fetcher) that need a typed result to decide what to do next.
#[derive(Error, Debug, Clone)]
pub enum MtceError {
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("action timed out after {0:?}")]
    ActionTimeout(std::time::Duration),

    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("credential file error: {0}")]
    CredentialFile(String),

    #[error("HTTP client error: {0}")]
    HttpClientError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for MtceError {
    fn from(e: std::io::Error) -> Self {
        MtceError::Io(Arc::new(e))
    }
}

impl From<reqwest::Error> for MtceError {
    fn from(e: reqwest::Error) -> Self {
        MtceError::HttpClientError(e.to_string())
    }
}

impl From<toml::de::Error> for MtceError {
    fn from(e: toml::de::Error) -> Self {
        MtceError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for MtceError {
    fn from(e: serde_json::Error) -> Self {
        MtceError::Internal(format!("JSON error: {e}"))
    }
}

pub type MtceResult<T> = Result<T, MtceError>;

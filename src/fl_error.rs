//! Error types for the harness.

use std::io;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, FlError>;

#[derive(Error, Debug)]
pub enum FlError {
    #[error("CSV write to {path} failed: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse scenario: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("address pool {base}/{prefix} cannot hold {needed} hosts")]
    AddressExhausted {
        base: Ipv4Addr,
        prefix: u8,
        needed: usize,
    },

    #[error("energy model: {0}")]
    Energy(String),
}

impl FlError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        FlError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

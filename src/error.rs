use std::io;

use thiserror::Error;

/// Contract violations on an [`AddressPool`](crate::AddressPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("address pool is empty")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("no addresses to connect to")]
    NoAddresses,

    /// Every candidate was tried once and refused.
    #[error("all {attempts} candidate addresses failed, last was {address}: {source}")]
    Exhausted {
        attempts: usize,
        address: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}")]
    InvalidValue { name: &'static str, value: String },

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no server addresses configured")]
    NoAddresses,
}

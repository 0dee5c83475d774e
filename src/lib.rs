pub mod config;
pub mod connector;
pub mod error;
pub mod pool;

pub use config::ConnectorConfig;
pub use connector::Connector;
pub use error::{ConfigError, ConnectError, PoolError};
pub use pool::{AddressEntry, AddressPool, AddressSet};

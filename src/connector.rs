use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::ConnectorConfig;
use crate::error::ConnectError;
use crate::pool::{AddressPool, AddressSet};

/// Drives an [`AddressSet`]: connects through it, rotating past failures,
/// and feeds server redirects back into it.
pub struct Connector {
    addresses: Arc<dyn AddressSet>,
    config: ConnectorConfig,
}

impl Connector {
    pub fn new(addresses: Arc<dyn AddressSet>, config: ConnectorConfig) -> Self {
        Self { addresses, config }
    }

    /// Builds an [`AddressPool`] over the configured addresses.
    pub fn from_config(config: ConnectorConfig) -> Self {
        let pool = Arc::new(AddressPool::new(config.addresses.iter().cloned()));
        Self::new(pool, config)
    }

    pub fn addresses(&self) -> &Arc<dyn AddressSet> {
        &self.addresses
    }

    /// Tries each candidate once, starting from the preferred address.
    ///
    /// A failed attempt rotates the pool before the next one. Unless a
    /// redirect or reset lands during the pass, an exhausted pass leaves the
    /// pool in the order it started from.
    pub async fn connect(&self) -> Result<(TcpStream, String), ConnectError> {
        let attempts = self.addresses.count();
        if attempts == 0 {
            return Err(ConnectError::NoAddresses);
        }

        let timeout = self.config.connect_timeout();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let address = self.addresses.current();

            match connect_with_timeout(&address, timeout).await {
                Ok(stream) => {
                    info!(%address, attempt, "connected");
                    return Ok((stream, address));
                }
                Err(e) => {
                    warn!(%address, attempt, error = %e, "connection attempt failed");
                    self.addresses.rotate();

                    if attempt >= attempts {
                        return Err(ConnectError::Exhausted {
                            attempts,
                            address,
                            source: e,
                        });
                    }
                }
            }
        }
    }

    /// Hands a redirect received from the server to the pool.
    pub fn redirect(&self, address: &str, revision: u64) -> bool {
        let adopted = self.addresses.add_redirect(address, revision);
        if adopted {
            info!(%address, revision, "following server redirect");
        } else {
            warn!(%address, revision, "ignoring out-of-date redirect");
        }
        adopted
    }

    /// Stops preferring an active redirect.
    pub fn reset(&self) {
        self.addresses.reset();
    }

    /// Connects, then holds the connection while the reset task runs, until
    /// `shutdown` resolves. Returns the address that was connected to.
    pub async fn serve<F>(&self, shutdown: F) -> Result<String, ConnectError>
    where
        F: Future<Output = ()>,
    {
        let reset_task = self.spawn_reset_task();

        let outcome = match self.connect().await {
            Ok((_stream, address)) => {
                shutdown.await;
                info!(%address, "shutting down");
                Ok(address)
            }
            Err(e) => Err(e),
        };

        reset_task.abort();
        outcome
    }

    /// Calls [`AddressSet::reset`] every `reset_interval`, starting one
    /// interval from now.
    ///
    /// The task exits at once if the first tick would not fit in an
    /// [`Instant`].
    pub fn spawn_reset_task(&self) -> JoinHandle<()> {
        let addresses = Arc::clone(&self.addresses);
        let period = self.config.reset_interval();

        tokio::spawn(async move {
            let Some(start) = Instant::now().checked_add(period) else {
                error!(?period, "reset interval out of range, periodic reset disabled");
                return;
            };
            let mut interval = time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if addresses.count() == 0 {
                    continue;
                }
                addresses.reset();
                debug!(addresses = %addresses.describe(), "periodic reset");
            }
        })
    }
}

async fn connect_with_timeout(address: &str, timeout: Duration) -> io::Result<TcpStream> {
    match time::timeout(timeout, TcpStream::connect(address)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connect timed out after {timeout:?}"),
        )),
    }
}

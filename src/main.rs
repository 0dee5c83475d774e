use address_pool::{Connector, ConnectorConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Server list and timings come from ADDRESS_POOL_* variables.
    let config = ConnectorConfig::from_env().inspect_err(|e| {
        error!(error = %e, "invalid configuration");
    })?;

    let connector = Connector::from_config(config);
    info!(addresses = %connector.addresses().describe(), "starting connector");

    // Hold the connection so the periodic reset keeps running until Ctrl-C.
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
        }
    };

    match connector.serve(shutdown).await {
        Ok(address) => {
            info!(%address, "connector stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "no address accepted a connection");
            Err(e.into())
        }
    }
}

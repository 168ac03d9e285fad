//! VOX Worker Entry Point
//!
//! Builds the control-plane client and resolver, warms the cache, then
//! prepares a session for every job read from stdin. Runs until
//! interrupted, even after stdin closes.

use tokio::io::BufReader;
use vox_control_plane::ControlPlaneClient;
use vox_storage::ConfigResolver;
use vox_worker::{init_tracing, worker, WorkerConfig, WorkerResult};

#[tokio::main]
async fn main() -> WorkerResult<()> {
    let config = WorkerConfig::from_env()?;
    init_tracing(&config.telemetry)?;

    tracing::info!(
        backend = %config.resolver.backend_url,
        cache_ttl_secs = config.resolver.cache_ttl.as_secs(),
        max_cache_entries = config.resolver.max_cache_entries,
        request_timeout_ms = config.resolver.request_timeout.as_millis() as u64,
        "Starting VOX worker"
    );

    let client = ControlPlaneClient::new(&config.resolver)?;
    let resolver = ConfigResolver::new(client, &config.resolver);

    let preloaded = worker::prewarm(&resolver, &config.preload_agents).await;
    tracing::info!(preloaded, "Worker ready");

    let stdin = BufReader::new(tokio::io::stdin());
    let signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
    };
    worker::run(&resolver, stdin, signal).await?;
    Ok(())
}

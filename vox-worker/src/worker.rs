//! Worker lifecycle: prewarm, job intake, shutdown.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use vox_core::HealthStatus;
use vox_control_plane::ControlPlaneClient;
use vox_storage::{ConfigFetcher, ConfigResolver};

use crate::error::WorkerResult;
use crate::session::{JobMetadata, SessionPlan};

/// Probe the control plane and warm the cache before taking calls.
///
/// An unhealthy backend is logged but does not stop startup: the resolver
/// degrades to cached or default configurations on its own.
pub async fn prewarm(resolver: &ConfigResolver<ControlPlaneClient>, agents: &[String]) -> usize {
    let client = resolver.fetcher();
    let health = client.health_check().await;
    match health.status {
        HealthStatus::Healthy => tracing::info!(
            backend = %client.base_url(),
            response_time_ms = health.response_time_ms,
            "Control plane healthy"
        ),
        _ => tracing::warn!(
            backend = %client.base_url(),
            status = ?health.status,
            message = health.message.as_deref().unwrap_or(""),
            "Control plane not healthy, continuing with cache and defaults"
        ),
    }

    resolver.preload(agents).await
}

/// Handle one dispatched job: parse its metadata and prepare the session.
pub async fn handle_job<F: ConfigFetcher>(
    resolver: &ConfigResolver<F>,
    raw_metadata: &str,
) -> WorkerResult<SessionPlan> {
    let metadata = JobMetadata::parse(Some(raw_metadata));
    let plan = SessionPlan::prepare(resolver, &metadata).await?;

    tracing::info!(
        agent_id = %plan.agent_id,
        campaign_id = plan.campaign_id.as_deref().unwrap_or(""),
        call_type = ?plan.call_type,
        source = %plan.source,
        llm = %plan.llm.descriptor,
        tts = %plan.tts.descriptor,
        stt = %plan.stt.descriptor,
        resolution_ms = plan.resolution_ms,
        "Session prepared"
    );
    Ok(plan)
}

/// Read job metadata, one JSON object per line, until end of input.
///
/// Jobs run concurrently. Returns the number of sessions prepared.
pub async fn serve_jobs<F, R>(resolver: &ConfigResolver<F>, reader: R) -> WorkerResult<usize>
where
    F: ConfigFetcher,
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut jobs = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let resolver = resolver.clone();
        jobs.spawn(async move { handle_job(&resolver, &line).await });
    }

    let mut prepared = 0;
    while let Some(joined) = jobs.join_next().await {
        match joined {
            Ok(Ok(_)) => prepared += 1,
            Ok(Err(e)) => tracing::error!(error = %e, "Failed to prepare session"),
            Err(e) => tracing::error!(error = %e, "Session task aborted"),
        }
    }
    Ok(prepared)
}

/// Serve jobs from `reader` until `signal` fires, then shut down.
///
/// After end of input the worker keeps waiting for `signal`. Shutdown runs
/// on every exit path, including a failed read; that error is returned
/// afterwards.
pub async fn run<F, R, S>(resolver: &ConfigResolver<F>, reader: R, signal: S) -> WorkerResult<usize>
where
    F: ConfigFetcher,
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(signal);

    let intake = tokio::select! {
        biased;
        served = serve_jobs(resolver, reader) => Some(served),
        _ = &mut signal => None,
    };

    let outcome = match intake {
        Some(Ok(served)) => {
            tracing::info!(served, "Job input closed, waiting for shutdown signal");
            signal.await;
            Ok(served)
        }
        Some(Err(e)) => {
            tracing::error!(error = %e, "Job intake failed, shutting down");
            Err(e)
        }
        None => {
            tracing::info!("Shutdown signal received");
            Ok(0)
        }
    };

    shutdown(resolver).await;
    outcome
}

/// Release resources and log the final counters.
pub async fn shutdown<F: ConfigFetcher>(resolver: &ConfigResolver<F>) {
    resolver.shutdown().await;
    let metrics = resolver.metrics();
    tracing::info!(
        total_requests = metrics.total_requests,
        cache_hits = metrics.cache_hits,
        cache_misses = metrics.cache_misses,
        api_successes = metrics.api_successes,
        api_failures = metrics.api_failures,
        stale_fallbacks = metrics.stale_fallbacks,
        default_fallbacks = metrics.default_fallbacks,
        rejected_requests = metrics.rejected_requests,
        cache_hit_rate = metrics.cache_hit_rate,
        cache_size = metrics.cache_size,
        cache_fill_ratio = metrics.cache_fill_ratio,
        evictions = metrics.evictions,
        "Worker shut down"
    );
}

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use cinescope_core::CatalogService;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Spawn a task that periodically removes detail entries whose last refresh
/// is older than `retention`.
pub fn spawn_cache_sweeper(
    catalog: Arc<CatalogService>,
    retention: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    info!(
        retention = %humantime::format_duration(retention),
        interval = %humantime::format_duration(interval),
        "detail cache sweeper started"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match sweep_once(&catalog, retention).await {
                Ok(0) => debug!("detail cache sweep removed nothing"),
                Ok(removed) => info!(removed, "detail cache sweep completed"),
                Err(err) => warn!(error = %err, "detail cache sweep failed"),
            }
        }
    })
}

/// Purge entries older than `retention` relative to now.
pub async fn sweep_once(
    catalog: &CatalogService,
    retention: Duration,
) -> cinescope_core::Result<u64> {
    let retention = chrono::Duration::from_std(retention)
        .unwrap_or(chrono::Duration::MAX);
    let cutoff = Utc::now()
        .checked_sub_signed(retention)
        .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
    catalog.purge_stale(cutoff).await
}

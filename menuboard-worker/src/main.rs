//! # Menuboard Worker
//!
//! Runs the maintenance sweeps on a fixed interval until Ctrl-C.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... cargo run -p menuboard-worker
//! ```
//!
//! Set `LOG_FORMAT=json` for structured logs.

use chrono::Duration;
use menuboard_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use menuboard_worker::{
    config::WorkerConfig,
    scheduler::Scheduler,
    sweeps::{PendingPaymentSweep, TrialExpirySweep, WaiterCallSweep},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Menuboard Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone())
            .with_max_connections(config.max_connections),
    )
    .await?;

    let mut scheduler = Scheduler::new(pool.clone(), config.interval);
    scheduler.register(Arc::new(TrialExpirySweep::new(Duration::days(1))));
    scheduler.register(Arc::new(WaiterCallSweep::new(config.waiter_call_ttl)));
    scheduler.register(Arc::new(PendingPaymentSweep::new(config.pending_payment_ttl)));

    let shutdown = scheduler.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received, finishing current round..."),
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
        shutdown.cancel();
    });

    scheduler.run().await;

    close_pool(pool).await;
    tracing::info!("Worker stopped");

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "menuboard_worker=debug,menuboard_shared=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

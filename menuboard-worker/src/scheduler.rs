/// Fixed-interval sweep scheduler
///
/// Runs every registered [`Sweep`] once per tick until the shutdown token is
/// cancelled. Sweeps run one after another; a failure is logged and the next
/// sweep still runs.
///
/// ```text
/// tick ─> trial_expiry ─> waiter_calls ─> pending_payments ─> wait ─> tick ...
/// ```
///
/// # Example
///
/// ```no_run
/// use menuboard_worker::scheduler::Scheduler;
/// use menuboard_worker::sweeps::WaiterCallSweep;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example(pool: PgPool) {
/// let mut scheduler = Scheduler::new(pool, std::time::Duration::from_secs(60));
/// scheduler.register(Arc::new(WaiterCallSweep::new(chrono::Duration::minutes(30))));
///
/// let shutdown = scheduler.shutdown_token();
/// tokio::spawn(async move {
///     let _ = tokio::signal::ctrl_c().await;
///     shutdown.cancel();
/// });
///
/// scheduler.run().await;
/// # }
/// ```

use crate::sweeps::{Sweep, SweepContext, SweepReport};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Outcome of one sweep within a round
#[derive(Debug)]
pub struct SweepOutcome {
    pub name: &'static str,
    pub result: Result<SweepReport, String>,
}

pub struct Scheduler {
    db: PgPool,
    interval: Duration,
    sweeps: Vec<Arc<dyn Sweep>>,
    shutdown_token: CancellationToken,
}

impl Scheduler {
    pub fn new(db: PgPool, interval: Duration) -> Self {
        Self {
            db,
            interval,
            sweeps: Vec::new(),
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn register(&mut self, sweep: Arc<dyn Sweep>) {
        tracing::info!(sweep = sweep.name(), "Registering sweep");
        self.sweeps.push(sweep);
    }

    /// Token that stops [`Scheduler::run`] when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs rounds until shutdown
    ///
    /// The first round starts immediately. Rounds that overrun the interval
    /// delay the next one instead of bunching up.
    pub async fn run(&self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            sweeps = self.sweeps.len(),
            "Scheduler starting"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut previous: Option<DateTime<Utc>> = None;

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let now = Utc::now();
            self.run_round(now, previous).await;
            previous = Some(now);
        }

        tracing::info!("Scheduler shut down");
    }

    /// Runs every sweep once
    pub async fn run_round(
        &self,
        now: DateTime<Utc>,
        previous: Option<DateTime<Utc>>,
    ) -> Vec<SweepOutcome> {
        let mut ctx = SweepContext::new(self.db.clone(), now);
        if let Some(previous) = previous {
            ctx = ctx.after(previous);
        }

        let mut outcomes = Vec::with_capacity(self.sweeps.len());

        for sweep in &self.sweeps {
            if self.shutdown_token.is_cancelled() {
                break;
            }

            let started = Instant::now();
            let result = sweep.run(&ctx).await.map_err(|e| e.to_string());
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(report) if report.affected > 0 => tracing::info!(
                    sweep = sweep.name(),
                    affected = report.affected,
                    elapsed_ms,
                    "Sweep finished"
                ),
                Ok(_) => tracing::debug!(sweep = sweep.name(), elapsed_ms, "Sweep finished"),
                Err(e) => tracing::error!(sweep = sweep.name(), error = %e, "Sweep failed"),
            }

            outcomes.push(SweepOutcome {
                name: sweep.name(),
                result,
            });
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweeps::SweepError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Counting(AtomicU32);

    #[async_trait]
    impl Sweep for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn run(&self, _ctx: &SweepContext) -> Result<SweepReport, SweepError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(SweepReport {
                affected: u64::from(n),
            })
        }
    }

    struct Failing;

    #[async_trait]
    impl Sweep for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(&self, _ctx: &SweepContext) -> Result<SweepReport, SweepError> {
            Err(SweepError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn lazy_pool() -> PgPool {
        PgPool::connect_lazy("postgresql://localhost/menuboard_unused").unwrap()
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_round() {
        let counting = Arc::new(Counting(AtomicU32::new(0)));
        let mut scheduler = Scheduler::new(lazy_pool(), Duration::from_secs(60));
        scheduler.register(Arc::new(Failing));
        scheduler.register(counting.clone());

        let outcomes = scheduler.run_round(Utc::now(), None).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].name, "failing");
        assert!(outcomes[0].result.is_err());
        assert_eq!(outcomes[1].result.as_ref().unwrap().affected, 1);
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_until_cancelled() {
        let counting = Arc::new(Counting(AtomicU32::new(0)));
        let mut scheduler = Scheduler::new(lazy_pool(), Duration::from_secs(10));
        scheduler.register(counting.clone());

        let shutdown = scheduler.shutdown_token();
        let handle = tokio::spawn(async move { scheduler.run().await });

        // Immediate first round plus two more
        tokio::time::sleep(Duration::from_secs(25)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(counting.0.load(Ordering::SeqCst), 3);
    }
}

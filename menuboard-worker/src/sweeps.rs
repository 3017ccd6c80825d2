/// Maintenance sweeps
///
/// Each sweep is a small idempotent database job run once per scheduler
/// round. Sweeps never depend on each other; a failing sweep doesn't keep the
/// others from running.
///
/// # Example
///
/// ```no_run
/// use menuboard_worker::sweeps::{Sweep, SweepContext, WaiterCallSweep};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let sweep = WaiterCallSweep::new(chrono::Duration::minutes(30));
/// let report = sweep.run(&SweepContext::new(pool, chrono::Utc::now())).await?;
/// println!("{}: {} calls resolved", sweep.name(), report.affected);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use menuboard_shared::models::{
    payment_transaction::PaymentTransaction, tenant::Tenant, waiter_call::WaiterCall,
};
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Inputs shared by all sweeps of one round
#[derive(Debug, Clone)]
pub struct SweepContext {
    pub db: PgPool,

    /// Start of this round
    pub now: DateTime<Utc>,

    /// Start of the previous round (None on the first round)
    pub previous: Option<DateTime<Utc>>,
}

impl SweepContext {
    pub fn new(db: PgPool, now: DateTime<Utc>) -> Self {
        Self {
            db,
            now,
            previous: None,
        }
    }

    pub fn after(mut self, previous: DateTime<Utc>) -> Self {
        self.previous = Some(previous);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Rows changed or reported by the sweep
    pub affected: u64,
}

#[async_trait]
pub trait Sweep: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &SweepContext) -> Result<SweepReport, SweepError>;
}

/// Reports trials that ended since the previous round and moves lapsed
/// premium tenants back to the trial plan
///
/// Access itself is computed on read, so this sweep only keeps the `plan`
/// column honest and leaves a log trail.
pub struct TrialExpirySweep {
    /// Look-back window for the first round
    initial_window: Duration,
}

impl TrialExpirySweep {
    pub fn new(initial_window: Duration) -> Self {
        Self { initial_window }
    }
}

#[async_trait]
impl Sweep for TrialExpirySweep {
    fn name(&self) -> &'static str {
        "trial_expiry"
    }

    async fn run(&self, ctx: &SweepContext) -> Result<SweepReport, SweepError> {
        let from = ctx.previous.unwrap_or(ctx.now - self.initial_window);

        let ended = Tenant::list_trials_ended_between(&ctx.db, from, ctx.now).await?;
        for tenant in &ended {
            tracing::info!(
                tenant_id = %tenant.id,
                slug = %tenant.slug,
                trial_end_date = %tenant.trial_end_date,
                "Trial ended"
            );
        }

        let downgraded = Tenant::downgrade_lapsed_premium(&ctx.db).await?;
        for tenant_id in &downgraded {
            tracing::info!(tenant_id = %tenant_id, "Premium lapsed, back on the trial plan");
        }

        Ok(SweepReport {
            affected: (ended.len() + downgraded.len()) as u64,
        })
    }
}

/// Resolves waiter calls nobody handled
pub struct WaiterCallSweep {
    ttl: Duration,
}

impl WaiterCallSweep {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

#[async_trait]
impl Sweep for WaiterCallSweep {
    fn name(&self) -> &'static str {
        "waiter_calls"
    }

    async fn run(&self, ctx: &SweepContext) -> Result<SweepReport, SweepError> {
        let affected = WaiterCall::resolve_stale(&ctx.db, ctx.now - self.ttl).await?;
        Ok(SweepReport { affected })
    }
}

/// Fails checkouts the payment provider never confirmed
pub struct PendingPaymentSweep {
    ttl: Duration,
}

impl PendingPaymentSweep {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

#[async_trait]
impl Sweep for PendingPaymentSweep {
    fn name(&self) -> &'static str {
        "pending_payments"
    }

    async fn run(&self, ctx: &SweepContext) -> Result<SweepReport, SweepError> {
        let affected = PaymentTransaction::fail_stale_pending(&ctx.db, ctx.now - self.ttl).await?;
        Ok(SweepReport { affected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_names() {
        assert_eq!(TrialExpirySweep::new(Duration::minutes(1)).name(), "trial_expiry");
        assert_eq!(WaiterCallSweep::new(Duration::minutes(30)).name(), "waiter_calls");
        assert_eq!(PendingPaymentSweep::new(Duration::hours(24)).name(), "pending_payments");
    }
}

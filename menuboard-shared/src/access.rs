/// Trial and subscription gating
///
/// Access is computed on read from the tenant row and the current time; no
/// job has to flip a flag when a trial ends.
///
/// # Rules
///
/// - **Suspended**: `is_active = false` (set by a super admin)
/// - **Premium**: `premium_until > now`
/// - **Trial**: `trial_end_date > now`
/// - **Expired**: neither
///
/// Trial and Premium allow service: the public menu, ordering and waiter
/// calls. Admin reads and billing stay reachable in every state so an owner
/// can always renew.
///
/// # Example
///
/// ```no_run
/// use menuboard_shared::access::AccessGate;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, tenant_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let gate = AccessGate::new(pool);
///
/// // Fails with AccessError::ServiceUnavailable once the trial is over
/// let (tenant, status) = gate.require_service(tenant_id).await?;
/// println!("{} is {}", tenant.slug, status.as_str());
/// # Ok(())
/// # }
/// ```

use crate::models::tenant::Tenant;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Access gating error
#[derive(Debug, Error)]
pub enum AccessError {
    /// Tenant exists but its trial/subscription doesn't allow service
    #[error("{}", unavailable_message(.status))]
    ServiceUnavailable { tenant_id: Uuid, status: AccessStatus },

    #[error("Tenant not found: {0}")]
    TenantNotFound(Uuid),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

fn unavailable_message(status: &AccessStatus) -> &'static str {
    match status {
        AccessStatus::Suspended => "This restaurant account is suspended",
        _ => "The trial period has ended and no subscription is active",
    }
}

/// Access state of a tenant at a given instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccessStatus {
    Suspended,
    Premium { until: DateTime<Utc> },
    Trial { ends_at: DateTime<Utc>, days_left: i64 },
    Expired,
}

impl AccessStatus {
    /// Computes the access state of `tenant` at `now`
    ///
    /// Paid time wins over trial time so a tenant that pays mid-trial shows
    /// as premium.
    pub fn evaluate(tenant: &Tenant, now: DateTime<Utc>) -> Self {
        if !tenant.is_active {
            return AccessStatus::Suspended;
        }

        if let Some(until) = tenant.premium_until.filter(|until| *until > now) {
            return AccessStatus::Premium { until };
        }

        if tenant.trial_end_date > now {
            let remaining = tenant.trial_end_date - now;
            // A partial day still counts as a day left.
            let days_left = (remaining.num_seconds() + 86_399) / 86_400;
            return AccessStatus::Trial {
                ends_at: tenant.trial_end_date,
                days_left,
            };
        }

        AccessStatus::Expired
    }

    /// Whether the public menu, ordering and waiter calls are open
    pub fn allows_service(&self) -> bool {
        matches!(self, AccessStatus::Trial { .. } | AccessStatus::Premium { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Suspended => "suspended",
            AccessStatus::Premium { .. } => "premium",
            AccessStatus::Trial { .. } => "trial",
            AccessStatus::Expired => "expired",
        }
    }
}

/// Loads tenants and checks their access state
#[derive(Clone)]
pub struct AccessGate {
    pool: PgPool,
}

impl AccessGate {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the tenant and its current access state
    pub async fn check(&self, tenant_id: Uuid) -> Result<(Tenant, AccessStatus), AccessError> {
        let tenant = Tenant::find_by_id(&self.pool, tenant_id)
            .await?
            .ok_or(AccessError::TenantNotFound(tenant_id))?;

        let status = AccessStatus::evaluate(&tenant, Utc::now());
        Ok((tenant, status))
    }

    /// Like [`AccessGate::check`], but fails when service isn't allowed
    pub async fn require_service(
        &self,
        tenant_id: Uuid,
    ) -> Result<(Tenant, AccessStatus), AccessError> {
        let (tenant, status) = self.check(tenant_id).await?;
        ensure_service(&tenant, status)
    }
}

/// Turns a computed status into an error when it doesn't allow service
pub fn ensure_service(
    tenant: &Tenant,
    status: AccessStatus,
) -> Result<(Tenant, AccessStatus), AccessError> {
    if status.allows_service() {
        Ok((tenant.clone(), status))
    } else {
        tracing::debug!(tenant_id = %tenant.id, status = status.as_str(), "Service gated");
        Err(AccessError::ServiceUnavailable {
            tenant_id: tenant.id,
            status,
        })
    }
}

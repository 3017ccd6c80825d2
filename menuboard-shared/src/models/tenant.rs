/// Tenant model and database operations
///
/// A tenant is one restaurant. Every other row in the system carries its
/// `tenant_id`, and the slug is the restaurant's public identifier.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE tenant_plan AS ENUM ('trial', 'premium');
///
/// CREATE TABLE tenants (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     slug VARCHAR(63) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     plan tenant_plan NOT NULL DEFAULT 'trial',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     trial_end_date TIMESTAMPTZ NOT NULL,
///     premium_until TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use menuboard_shared::models::tenant::{Tenant, CreateTenant};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let tenant = Tenant::create(&pool, CreateTenant {
///     slug: "pizza-roma".to_string(),
///     name: "Pizza Roma".to_string(),
///     trial_days: 14,
/// }).await?;
///
/// Tenant::activate_premium(&pool, tenant.id, 1).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Billing plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tenant_plan", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TenantPlan {
    /// Free, time-boxed access
    Trial,

    /// Paid subscription
    Premium,
}

impl TenantPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantPlan::Trial => "trial",
            TenantPlan::Premium => "premium",
        }
    }
}

/// Tenant model representing one restaurant account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    /// Unique tenant ID
    pub id: Uuid,

    /// Public identifier used in menu URLs
    pub slug: String,

    /// Restaurant account name
    pub name: String,

    /// Current billing plan
    pub plan: TenantPlan,

    /// Set to false by a super admin to suspend the restaurant
    pub is_active: bool,

    /// Trial access ends at this instant
    pub trial_end_date: DateTime<Utc>,

    /// Paid access ends at this instant (None if never paid)
    pub premium_until: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    /// Validated slug (see [`crate::slug::validate_slug`])
    pub slug: String,

    /// Restaurant account name
    pub name: String,

    /// Length of the initial trial
    pub trial_days: i64,
}

/// Input for updating a tenant
///
/// Only non-None fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

const TENANT_COLUMNS: &str =
    "id, slug, name, plan, is_active, trial_end_date, premium_until, created_at, updated_at";

impl Tenant {
    /// Creates a tenant on the trial plan
    ///
    /// `trial_end_date` is set to `NOW() + trial_days`.
    ///
    /// # Errors
    ///
    /// Returns a database error on slug collision (`tenants_slug_key`).
    pub async fn create<'e, E>(executor: E, data: CreateTenant) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            r#"
            INSERT INTO tenants (slug, name, plan, trial_end_date)
            VALUES ($1, $2, 'trial', NOW() + make_interval(days => $3))
            RETURNING {TENANT_COLUMNS}
            "#
        ))
        .bind(data.slug)
        .bind(data.name)
        .bind(data.trial_days as i32)
        .fetch_one(executor)
        .await?;

        Ok(tenant)
    }

    /// Finds a tenant by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a tenant by its public slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Checks whether a slug is already taken
    pub async fn slug_exists<'e, E>(executor: E, slug: &str) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants WHERE slug = $1)")
            .bind(slug)
            .fetch_one(executor)
            .await
    }

    /// Updates name, slug and/or active flag
    ///
    /// Returns None if the tenant doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTenant,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(&format!(
            r#"
            UPDATE tenants
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TENANT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.slug)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    /// Extends the trial by `days`, counting from now if it already ended
    pub async fn extend_trial(
        pool: &PgPool,
        id: Uuid,
        days: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(&format!(
            r#"
            UPDATE tenants
            SET trial_end_date = GREATEST(trial_end_date, NOW()) + make_interval(days => $2),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TENANT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(days)
        .fetch_optional(pool)
        .await
    }

    /// Switches to premium and extends paid access by `months`
    ///
    /// Paid time stacks: the extension starts at the current `premium_until`
    /// when that is still in the future.
    pub async fn activate_premium<'e, E>(
        executor: E,
        id: Uuid,
        months: i32,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(&format!(
            r#"
            UPDATE tenants
            SET plan = 'premium',
                premium_until = GREATEST(COALESCE(premium_until, NOW()), NOW())
                                + make_interval(months => $2),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TENANT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(months)
        .fetch_optional(executor)
        .await
    }

    /// Moves lapsed premium tenants back to the trial plan
    ///
    /// Returns the IDs of the downgraded tenants.
    pub async fn downgrade_lapsed_premium(pool: &PgPool) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            UPDATE tenants
            SET plan = 'trial', updated_at = NOW()
            WHERE plan = 'premium' AND premium_until <= NOW()
            RETURNING id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Lists tenants whose trial ended within the given window
    ///
    /// Used by the worker to report expiries once per sweep interval.
    pub async fn list_trials_ended_between(
        pool: &PgPool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(&format!(
            r#"
            SELECT {TENANT_COLUMNS} FROM tenants
            WHERE plan = 'trial' AND trial_end_date > $1 AND trial_end_date <= $2
            ORDER BY trial_end_date
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Deletes a tenant and, by cascade, all of its rows
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists tenants newest first, optionally filtered by a name/slug search
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        sqlx::query_as::<_, Tenant>(&format!(
            r#"
            SELECT {TENANT_COLUMNS} FROM tenants
            WHERE $1::TEXT IS NULL OR name ILIKE $1 OR slug ILIKE $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts tenants matching the same optional search as [`Tenant::list`]
    pub async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        sqlx::query_scalar(
            "SELECT COUNT(*) FROM tenants WHERE $1::TEXT IS NULL OR name ILIKE $1 OR slug ILIKE $1",
        )
        .bind(pattern)
        .fetch_one(pool)
        .await
    }

    /// Loads every tenant (platform statistics)
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants ORDER BY created_at"
        ))
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_plan_as_str() {
        assert_eq!(TenantPlan::Trial.as_str(), "trial");
        assert_eq!(TenantPlan::Premium.as_str(), "premium");
    }

    #[test]
    fn test_tenant_plan_serde() {
        assert_eq!(serde_json::to_string(&TenantPlan::Premium).unwrap(), "\"premium\"");
        let plan: TenantPlan = serde_json::from_str("\"trial\"").unwrap();
        assert_eq!(plan, TenantPlan::Trial);
    }

    #[test]
    fn test_update_tenant_default() {
        let update = UpdateTenant::default();
        assert!(update.name.is_none());
        assert!(update.slug.is_none());
        assert!(update.is_active.is_none());
    }
}

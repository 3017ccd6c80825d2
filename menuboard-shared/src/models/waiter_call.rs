/// Waiter call model
///
/// A customer at a table asks for service from the public menu. A table has
/// at most one open (not resolved) call at a time, enforced by the partial
/// unique index `idx_waiter_calls_open_per_table`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "waiter_call_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WaiterCallStatus {
    Pending,
    Acknowledged,
    Resolved,
}

impl WaiterCallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaiterCallStatus::Pending => "pending",
            WaiterCallStatus::Acknowledged => "acknowledged",
            WaiterCallStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for WaiterCallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(WaiterCallStatus::Pending),
            "acknowledged" => Ok(WaiterCallStatus::Acknowledged),
            "resolved" => Ok(WaiterCallStatus::Resolved),
            other => Err(format!("Unknown waiter call status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WaiterCall {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub table_number: i32,
    pub note: Option<String>,
    pub status: WaiterCallStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

const WAITER_CALL_COLUMNS: &str =
    "id, tenant_id, table_number, note, status, created_at, updated_at, resolved_at";

impl WaiterCall {
    /// Opens a call for a table, or returns the call already open for it
    ///
    /// The boolean is true when a new call was created.
    pub async fn create_or_get_open(
        pool: &PgPool,
        tenant_id: Uuid,
        table_number: i32,
        note: Option<String>,
    ) -> Result<(Self, bool), sqlx::Error> {
        let inserted = sqlx::query_as::<_, WaiterCall>(&format!(
            r#"
            INSERT INTO waiter_calls (tenant_id, table_number, note)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, table_number) WHERE status <> 'resolved' DO NOTHING
            RETURNING {WAITER_CALL_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(table_number)
        .bind(note)
        .fetch_optional(pool)
        .await?;

        if let Some(call) = inserted {
            return Ok((call, true));
        }

        let open = sqlx::query_as::<_, WaiterCall>(&format!(
            r#"
            SELECT {WAITER_CALL_COLUMNS} FROM waiter_calls
            WHERE tenant_id = $1 AND table_number = $2 AND status <> 'resolved'
            "#
        ))
        .bind(tenant_id)
        .bind(table_number)
        .fetch_one(pool)
        .await?;

        Ok((open, false))
    }

    pub async fn find(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WaiterCall>(&format!(
            "SELECT {WAITER_CALL_COLUMNS} FROM waiter_calls WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists calls
    ///
    /// Resolved calls are only included with `include_resolved`; a polling
    /// client passes `since` so it also sees calls that got resolved. With
    /// `since` the oldest change comes first, otherwise the newest.
    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        include_resolved: bool,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let order_by = if since.is_some() {
            "updated_at, id"
        } else {
            "updated_at DESC, id DESC"
        };

        sqlx::query_as::<_, WaiterCall>(&format!(
            r#"
            SELECT {WAITER_CALL_COLUMNS} FROM waiter_calls
            WHERE tenant_id = $1
              AND ($2 OR status <> 'resolved')
              AND ($3::TIMESTAMPTZ IS NULL OR updated_at > $3)
            ORDER BY {order_by}
            LIMIT $4
            "#
        ))
        .bind(tenant_id)
        .bind(include_resolved)
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Sets the status, maintaining `resolved_at`
    pub async fn update_status(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
        status: WaiterCallStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WaiterCall>(&format!(
            r#"
            UPDATE waiter_calls
            SET status = $3,
                resolved_at = CASE WHEN $3 = 'resolved'::waiter_call_status
                                   THEN COALESCE(resolved_at, NOW()) END,
                updated_at = clock_timestamp()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {WAITER_CALL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Resolves every open call created before `older_than`, across tenants
    ///
    /// Returns the number of calls resolved.
    pub async fn resolve_stale(pool: &PgPool, older_than: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE waiter_calls
            SET status = 'resolved', resolved_at = NOW(), updated_at = clock_timestamp()
            WHERE status <> 'resolved' AND created_at < $1
            "#,
        )
        .bind(older_than)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waiter_call_status_parsing() {
        assert_eq!("pending".parse::<WaiterCallStatus>(), Ok(WaiterCallStatus::Pending));
        assert_eq!("ACKNOWLEDGED".parse::<WaiterCallStatus>(), Ok(WaiterCallStatus::Acknowledged));
        assert_eq!("resolved".parse::<WaiterCallStatus>(), Ok(WaiterCallStatus::Resolved));
        assert!("closed".parse::<WaiterCallStatus>().is_err());
    }

    #[test]
    fn test_waiter_call_status_serde() {
        assert_eq!(
            serde_json::to_string(&WaiterCallStatus::Acknowledged).unwrap(),
            "\"acknowledged\""
        );
    }
}

/// Waiter call endpoints
///
/// The feed shows open calls by default. When polling with `since`, calls
/// resolved after the cursor are included too so clients can drop them.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::feed::{clamp_limit, safe_cursor, Feed},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use menuboard_shared::{
    auth::{
        authorization::{require_permission, Permission},
        middleware::AuthContext,
    },
    models::waiter_call::{WaiterCall, WaiterCallStatus},
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct WaiterCallFeedQuery {
    #[serde(default)]
    pub include_resolved: bool,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn feed(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<WaiterCallFeedQuery>,
) -> ApiResult<Json<Feed<WaiterCall>>> {
    let tenant_id = require_permission(&auth, Permission::View)?;

    let include_resolved = query.include_resolved || query.since.is_some();

    let safe_now = safe_cursor(&state.db).await?;
    let limit = clamp_limit(query.limit);

    let calls = WaiterCall::list(
        &state.db,
        tenant_id,
        include_resolved,
        query.since,
        if query.since.is_some() { limit + 1 } else { limit },
    )
    .await?;

    let feed = match query.since {
        Some(since) => Feed::page(calls, since, safe_now, limit),
        None => Feed::new(calls, safe_now),
    };

    Ok(Json(feed))
}

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<WaiterCall>> {
    let tenant_id = require_permission(&auth, Permission::HandleService)?;

    let status: WaiterCallStatus = req
        .status
        .parse()
        .map_err(|e: String| ApiError::invalid_field("status", e))?;

    let call = WaiterCall::update_status(&state.db, tenant_id, id, status)
        .await?
        .ok_or_else(|| ApiError::not_found("Waiter call"))?;

    tracing::info!(
        tenant_id = %tenant_id,
        table = call.table_number,
        status = call.status.as_str(),
        "Waiter call updated"
    );

    Ok(Json(call))
}

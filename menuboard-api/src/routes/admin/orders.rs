/// Kitchen order endpoints
///
/// - `GET /v1/admin/orders?status=&since=&limit=`: Polling feed
/// - `GET /v1/admin/orders/stats`: Today's counters (UTC day)
/// - `GET|DELETE /v1/admin/orders/:id`
/// - `PATCH /v1/admin/orders/:id/status`: Any status to any status

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::feed::{clamp_limit, safe_cursor, Feed},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveTime, Utc};
use menuboard_shared::{
    auth::{
        authorization::{require_permission, Permission},
        middleware::AuthContext,
    },
    models::order::{Order, OrderFilter, OrderStats, OrderStatus},
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct OrderFeedQuery {
    pub status: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Midnight UTC of the day containing `now`
pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn parse_status(value: &str) -> ApiResult<OrderStatus> {
    value
        .parse()
        .map_err(|e: String| ApiError::invalid_field("status", e))
}

pub async fn feed(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<OrderFeedQuery>,
) -> ApiResult<Json<Feed<Order>>> {
    let tenant_id = require_permission(&auth, Permission::View)?;

    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_status)
        .transpose()?;

    let safe_now = safe_cursor(&state.db).await?;
    let limit = clamp_limit(query.limit);

    let orders = Order::list(
        &state.db,
        tenant_id,
        OrderFilter {
            status,
            since: query.since,
            // One extra row tells a full page from an exact fit
            limit: if query.since.is_some() { limit + 1 } else { limit },
        },
    )
    .await?;

    let feed = match query.since {
        Some(since) => Feed::page(orders, since, safe_now, limit),
        None => Feed::new(orders, safe_now),
    };

    Ok(Json(feed))
}

pub async fn stats(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<OrderStats>> {
    let tenant_id = require_permission(&auth, Permission::View)?;
    let stats = Order::stats(&state.db, tenant_id, day_start(Utc::now())).await?;
    Ok(Json(stats))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let tenant_id = require_permission(&auth, Permission::View)?;

    let order = Order::find(&state.db, tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;

    Ok(Json(order))
}

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Order>> {
    let tenant_id = require_permission(&auth, Permission::HandleService)?;
    let status = parse_status(&req.status)?;

    let order = Order::update_status(&state.db, tenant_id, id, status)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;

    tracing::info!(
        tenant_id = %tenant_id,
        order_number = order.order_number,
        status = %order.status,
        by = %auth.user_id,
        "Order status changed"
    );

    Ok(Json(order))
}

/// Deletes an order; managers and owners only
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let tenant_id = require_permission(&auth, Permission::ManageMenu)?;

    if !Order::delete(&state.db, tenant_id, id).await? {
        return Err(ApiError::not_found("Order"));
    }

    tracing::info!(tenant_id = %tenant_id, order_id = %id, by = %auth.user_id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Platform administration (super admin role only)
///
/// Tenant management, trial and premium grants, transactions across all
/// tenants, platform statistics and landing page content. These endpoints
/// are never gated by access status.

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
    routes::admin::orders::day_start,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use menuboard_shared::{
    access::AccessStatus,
    auth::middleware::AuthContext,
    models::{
        landing_content::{is_valid_section_name, LandingSection},
        order::Order,
        payment_transaction::{PaymentStatus, PaymentTransaction},
        tenant::{Tenant, UpdateTenant},
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct TenantListQuery {
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TenantSummary {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub access: AccessStatus,
}

impl From<Tenant> for TenantSummary {
    fn from(tenant: Tenant) -> Self {
        Self {
            access: AccessStatus::evaluate(&tenant, Utc::now()),
            tenant,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TenantPage {
    pub tenants: Vec<TenantSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTenantRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExtendTrialRequest {
    #[validate(range(min = 1, max = 365, message = "Days must be between 1 and 365"))]
    pub days: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GrantPremiumRequest {
    #[validate(range(min = 1, max = 36, message = "Months must be between 1 and 36"))]
    pub months: i32,
}

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub status: Option<PaymentStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct TenantCounts {
    pub total: i64,
    pub trial: i64,
    pub premium: i64,
    pub expired: i64,
    pub suspended: i64,
}

impl TenantCounts {
    fn record(&mut self, status: &AccessStatus) {
        self.total += 1;
        match status {
            AccessStatus::Trial { .. } => self.trial += 1,
            AccessStatus::Premium { .. } => self.premium += 1,
            AccessStatus::Expired => self.expired += 1,
            AccessStatus::Suspended => self.suspended += 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlatformStats {
    pub tenants: TenantCounts,
    pub orders_today: i64,
    pub total_revenue: Decimal,
}

fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        offset.unwrap_or(0).max(0),
    )
}

pub async fn list_tenants(
    State(state): State<AppState>,
    Query(query): Query<TenantListQuery>,
) -> ApiResult<Json<TenantPage>> {
    let (limit, offset) = page(query.limit, query.offset);
    let search = query.search.as_deref().filter(|s| !s.trim().is_empty());

    let tenants = Tenant::list(&state.db, search, limit, offset).await?;
    let total = Tenant::count(&state.db, search).await?;

    Ok(Json(TenantPage {
        tenants: tenants.into_iter().map(TenantSummary::from).collect(),
        total,
        limit,
        offset,
    }))
}

pub async fn get_tenant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TenantSummary>> {
    let tenant = Tenant::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant"))?;

    Ok(Json(tenant.into()))
}

pub async fn update_tenant(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTenantRequest>,
) -> ApiResult<Json<TenantSummary>> {
    validate_request(&req)?;

    let tenant = Tenant::update(
        &state.db,
        id,
        UpdateTenant {
            name: req.name.map(|n| n.trim().to_string()),
            slug: None,
            is_active: req.is_active,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Tenant"))?;

    tracing::info!(
        tenant_id = %tenant.id,
        is_active = tenant.is_active,
        by = %auth.user_id,
        "Tenant updated"
    );

    Ok(Json(tenant.into()))
}

pub async fn delete_tenant(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Tenant::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Tenant"));
    }

    tracing::warn!(tenant_id = %id, by = %auth.user_id, "Tenant deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn extend_trial(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<ExtendTrialRequest>,
) -> ApiResult<Json<TenantSummary>> {
    validate_request(&req)?;

    let tenant = Tenant::extend_trial(&state.db, id, req.days)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant"))?;

    tracing::info!(
        tenant_id = %tenant.id,
        days = req.days,
        trial_end_date = %tenant.trial_end_date,
        by = %auth.user_id,
        "Trial extended"
    );

    Ok(Json(tenant.into()))
}

/// Grants premium without a payment
pub async fn grant_premium(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<GrantPremiumRequest>,
) -> ApiResult<Json<TenantSummary>> {
    validate_request(&req)?;

    let tenant = Tenant::activate_premium(&state.db, id, req.months)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant"))?;

    tracing::info!(
        tenant_id = %tenant.id,
        months = req.months,
        by = %auth.user_id,
        "Premium granted"
    );

    Ok(Json(tenant.into()))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> ApiResult<Json<Vec<PaymentTransaction>>> {
    let (limit, offset) = page(query.limit, query.offset);
    let transactions = PaymentTransaction::list_all(&state.db, query.status, limit, offset).await?;
    Ok(Json(transactions))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<PlatformStats>> {
    let now = Utc::now();

    let mut tenants = TenantCounts::default();
    for tenant in Tenant::list_all(&state.db).await? {
        tenants.record(&AccessStatus::evaluate(&tenant, now));
    }

    let orders_today = Order::count_all_since(&state.db, day_start(now)).await?;
    let total_revenue = PaymentTransaction::total_revenue(&state.db).await?;

    Ok(Json(PlatformStats {
        tenants,
        orders_today,
        total_revenue,
    }))
}

pub async fn put_landing_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(content): Json<serde_json::Value>,
) -> ApiResult<Json<LandingSection>> {
    if !is_valid_section_name(&section) {
        return Err(ApiError::invalid_field(
            "section",
            "Use lowercase letters, digits, '-' or '_' (max 100 characters)",
        ));
    }

    let section = LandingSection::upsert(&state.db, &section, content).await?;
    tracing::info!(section = %section.section, "Landing section saved");

    Ok(Json(section))
}

pub async fn delete_landing_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> ApiResult<StatusCode> {
    if !LandingSection::delete(&state.db, &section).await? {
        return Err(ApiError::not_found("Landing section"));
    }
    Ok(StatusCode::NO_CONTENT)
}

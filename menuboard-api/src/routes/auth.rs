/// Authentication endpoints
///
/// - `POST /v1/auth/register`: New restaurant with its owner account
/// - `POST /v1/auth/login`: Email + password login
/// - `POST /v1/auth/refresh`: New token pair from a refresh token
/// - `GET /v1/auth/me`: Current user, tenant and access state

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use menuboard_shared::{
    access::AccessStatus,
    auth::{
        jwt::{self, TokenPair},
        middleware::AuthContext,
        password,
    },
    models::{
        admin_user::{normalize_email, AdminRole, AdminUser, CreateAdminUser},
        settings::Settings,
        tenant::{CreateTenant, Tenant},
    },
    slug::{slugify, validate_slug, with_random_suffix},
};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};
use validator::Validate;

/// Attempts at finding a free slug before giving up
const SLUG_ATTEMPTS: usize = 5;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Restaurant name must be 1-255 characters"))]
    pub restaurant_name: String,

    /// Derived from the restaurant name when absent
    pub slug: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub tenant: Tenant,
    pub user: AdminUser,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: AdminUser,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TenantAccess {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub access: AccessStatus,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: AdminUser,
    pub tenant: Option<TenantAccess>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    validate_request(&req)?;
    password::validate_password_strength(&req.password)?;

    let email = normalize_email(&req.email);
    if AdminUser::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;
    let restaurant_name = req.restaurant_name.trim().to_string();

    let mut tx = state.db.begin().await?;

    let slug = pick_slug(&mut tx, req.slug.as_deref(), &restaurant_name).await?;

    let tenant = Tenant::create(
        &mut *tx,
        CreateTenant {
            slug,
            name: restaurant_name.clone(),
            trial_days: state.config.billing.trial_days,
        },
    )
    .await?;

    let user = AdminUser::create(
        &mut *tx,
        CreateAdminUser {
            tenant_id: Some(tenant.id),
            email,
            password_hash,
            full_name: req.full_name.filter(|n| !n.trim().is_empty()),
            role: AdminRole::Owner,
        },
    )
    .await?;

    Settings::create_default(&mut *tx, tenant.id, &restaurant_name).await?;

    tx.commit().await?;

    tracing::info!(
        tenant_id = %tenant.id,
        slug = %tenant.slug,
        user_id = %user.id,
        "Restaurant registered"
    );

    let tokens = jwt::issue_token_pair(user.id, Some(tenant.id), user.role, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            tenant,
            user,
            tokens,
        }),
    ))
}

/// Chooses the tenant slug inside the registration transaction
///
/// An explicitly requested slug must be valid and free. A derived slug gets
/// a random suffix when it is reserved, too short or taken.
async fn pick_slug(
    tx: &mut Transaction<'_, Postgres>,
    requested: Option<&str>,
    restaurant_name: &str,
) -> ApiResult<String> {
    if let Some(requested) = requested.map(|s| s.trim().to_lowercase()) {
        validate_slug(&requested).map_err(|e| ApiError::invalid_field("slug", e.to_string()))?;
        if Tenant::slug_exists(&mut **tx, &requested).await? {
            return Err(ApiError::Conflict("Slug already taken".to_string()));
        }
        return Ok(requested);
    }

    let base = slugify(restaurant_name);
    let mut candidate = if validate_slug(&base).is_ok() {
        base.clone()
    } else {
        with_random_suffix(&base)
    };

    for _ in 0..SLUG_ATTEMPTS {
        if !Tenant::slug_exists(&mut **tx, &candidate).await? {
            return Ok(candidate);
        }
        candidate = with_random_suffix(&base);
    }

    Err(ApiError::Conflict(
        "Could not derive a free slug, please choose one".to_string(),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    validate_request(&req)?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = AdminUser::find_by_email(&state.db, &normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(ApiError::Forbidden("This account is disabled".to_string()));
    }

    AdminUser::update_last_login(&state.db, user.id).await?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "Admin logged in");

    let tokens = jwt::issue_token_pair(user.id, user.tenant_id, user.role, state.jwt_secret())?;

    Ok(Json(LoginResponse { user, tokens }))
}

/// Issues a new token pair
///
/// The user is reloaded so a disabled account or a changed role takes effect
/// at the next refresh.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let user = AdminUser::find_by_id(&state.db, claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::Unauthorized("Account no longer active".to_string()))?;

    let tokens = jwt::issue_token_pair(user.id, user.tenant_id, user.role, state.jwt_secret())?;
    Ok(Json(tokens))
}

pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<MeResponse>> {
    let user = AdminUser::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let tenant = match user.tenant_id {
        Some(tenant_id) => Tenant::find_by_id(&state.db, tenant_id)
            .await?
            .map(|tenant| TenantAccess {
                access: AccessStatus::evaluate(&tenant, Utc::now()),
                tenant,
            }),
        None => None,
    };

    Ok(Json(MeResponse { user, tenant }))
}

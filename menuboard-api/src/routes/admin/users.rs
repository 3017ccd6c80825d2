/// Back-office user management (owners only)
///
/// Owners can't delete, demote or disable their own account, and a
/// restaurant always keeps at least one active owner.

use super::{clean_nullable, nullable};
use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use menuboard_shared::{
    auth::{
        authorization::{forbid_self, require_permission, Permission},
        middleware::AuthContext,
        password,
    },
    models::admin_user::{normalize_email, AdminRole, AdminUser, CreateAdminUser, UpdateAdminUser},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub full_name: Option<String>,

    pub role: AdminRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub full_name: Option<Option<String>>,

    pub role: Option<AdminRole>,
    pub is_active: Option<bool>,
}

/// Tenant users may hold any role but super admin
fn check_assignable(role: AdminRole) -> ApiResult<()> {
    if role.is_super_admin() {
        return Err(ApiError::invalid_field("role", "Role must be owner, manager or staff"));
    }
    Ok(())
}

/// Whether an update takes away one of the active owners
///
/// An owner that is already disabled doesn't count towards the minimum.
fn removes_owner(target: &AdminUser, req: &UpdateUserRequest) -> bool {
    target.role == AdminRole::Owner
        && target.is_active
        && (req.role.is_some_and(|r| r != AdminRole::Owner) || req.is_active == Some(false))
}

async fn ensure_other_owner(state: &AppState, tenant_id: Uuid) -> ApiResult<()> {
    if AdminUser::count_active_owners(&state.db, tenant_id).await? <= 1 {
        return Err(ApiError::Conflict(
            "A restaurant needs at least one active owner".to_string(),
        ));
    }
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<AdminUser>>> {
    let tenant_id = require_permission(&auth, Permission::ManageUsers)?;
    Ok(Json(AdminUser::list_by_tenant(&state.db, tenant_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<AdminUser>)> {
    validate_request(&req)?;
    check_assignable(req.role)?;
    password::validate_password_strength(&req.password)?;

    let tenant_id = require_permission(&auth, Permission::ManageUsers)?;

    let email = normalize_email(&req.email);
    if AdminUser::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let user = AdminUser::create(
        &state.db,
        CreateAdminUser {
            tenant_id: Some(tenant_id),
            email,
            password_hash: password::hash_password(&req.password)?,
            full_name: req.full_name.filter(|n| !n.trim().is_empty()),
            role: req.role,
        },
    )
    .await?;

    tracing::info!(
        tenant_id = %tenant_id,
        user_id = %user.id,
        role = user.role.as_str(),
        by = %auth.user_id,
        "Admin user created"
    );

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<AdminUser>> {
    validate_request(&req)?;
    let tenant_id = require_permission(&auth, Permission::ManageUsers)?;

    if let Some(role) = req.role {
        check_assignable(role)?;
    }
    if req.role.is_some() || req.is_active == Some(false) {
        forbid_self(&auth, id)?;
    }

    let target = AdminUser::find_in_tenant(&state.db, tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if removes_owner(&target, &req) {
        ensure_other_owner(&state, tenant_id).await?;
    }

    let email = req.email.as_deref().map(normalize_email);
    if let Some(email) = &email {
        if *email != target.email && AdminUser::find_by_email(&state.db, email).await?.is_some() {
            return Err(ApiError::Conflict("Email already exists".to_string()));
        }
    }

    let password_hash = match req.password.as_deref() {
        Some(new_password) => {
            password::validate_password_strength(new_password)?;
            Some(password::hash_password(new_password)?)
        }
        None => None,
    };

    let user = AdminUser::update(
        &state.db,
        tenant_id,
        id,
        UpdateAdminUser {
            email,
            password_hash,
            full_name: clean_nullable(req.full_name),
            role: req.role,
            is_active: req.is_active,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("User"))?;

    tracing::info!(tenant_id = %tenant_id, user_id = %user.id, by = %auth.user_id, "Admin user updated");

    Ok(Json(user))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let tenant_id = require_permission(&auth, Permission::ManageUsers)?;
    forbid_self(&auth, id)?;

    let target = AdminUser::find_in_tenant(&state.db, tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if target.role == AdminRole::Owner && target.is_active {
        ensure_other_owner(&state, tenant_id).await?;
    }

    AdminUser::delete(&state.db, tenant_id, id).await?;

    tracing::info!(tenant_id = %tenant_id, user_id = %id, by = %auth.user_id, "Admin user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: AdminRole) -> AdminUser {
        AdminUser {
            id: Uuid::new_v4(),
            tenant_id: Some(Uuid::new_v4()),
            email: "chef@trattoria.it".to_string(),
            password_hash: String::new(),
            full_name: None,
            role,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn update(role: Option<AdminRole>, is_active: Option<bool>) -> UpdateUserRequest {
        UpdateUserRequest {
            email: None,
            password: None,
            full_name: None,
            role,
            is_active,
        }
    }

    #[test]
    fn test_super_admin_not_assignable() {
        assert!(check_assignable(AdminRole::SuperAdmin).is_err());
        assert!(check_assignable(AdminRole::Staff).is_ok());
        assert!(check_assignable(AdminRole::Owner).is_ok());
    }

    #[test]
    fn test_removes_owner() {
        let owner = user(AdminRole::Owner);
        assert!(removes_owner(&owner, &update(Some(AdminRole::Manager), None)));
        assert!(removes_owner(&owner, &update(None, Some(false))));
        assert!(!removes_owner(&owner, &update(Some(AdminRole::Owner), Some(true))));
        assert!(!removes_owner(&user(AdminRole::Staff), &update(None, Some(false))));
    }

    #[test]
    fn test_disabled_owner_can_be_demoted() {
        let disabled = AdminUser {
            is_active: false,
            ..user(AdminRole::Owner)
        };
        assert!(!removes_owner(&disabled, &update(Some(AdminRole::Staff), None)));
        assert!(!removes_owner(&disabled, &update(None, Some(false))));
    }

    #[test]
    fn test_role_parsing() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"email":"waiter@trattoria.it","password":"Service2024","role":"staff"}"#,
        )
        .unwrap();
        assert_eq!(req.role, AdminRole::Staff);
    }
}

/// Menu category endpoints
///
/// - `GET /v1/admin/categories`: All categories, by sort order
/// - `POST /v1/admin/categories`: Create
/// - `POST /v1/admin/categories/reorder`: New order from a list of ids
/// - `GET|PATCH|DELETE /v1/admin/categories/:id`

use super::{check_url, clean, clean_nullable, menu_editor, nullable};
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
        authorization::{require_permission, Permission},
        middleware::AuthContext,
    },
    models::category::{Category, CreateCategory, UpdateCategory},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub image_url: Option<String>,

    #[validate(range(min = 0, message = "Sort order must not be negative"))]
    pub sort_order: Option<i32>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,

    #[validate(range(min = 0, message = "Sort order must not be negative"))]
    pub sort_order: Option<i32>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReorderRequest {
    #[validate(length(min = 1, max = 500, message = "Provide 1-500 ids"))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub updated: u64,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Category>>> {
    let tenant_id = require_permission(&auth, Permission::View)?;
    Ok(Json(Category::list(&state.db, tenant_id, false).await?))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Category>> {
    let tenant_id = require_permission(&auth, Permission::View)?;

    let category = Category::find(&state.db, tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;

    Ok(Json(category))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    validate_request(&req)?;
    let tenant_id = menu_editor(&state, &auth).await?;

    let image_url = clean(req.image_url);
    check_url("image_url", image_url.as_deref())?;

    let category = Category::create(
        &state.db,
        tenant_id,
        CreateCategory {
            name: req.name.trim().to_string(),
            description: clean(req.description),
            image_url,
            sort_order: req.sort_order,
            is_active: req.is_active,
        },
    )
    .await?;

    tracing::info!(tenant_id = %tenant_id, category_id = %category.id, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    validate_request(&req)?;
    let tenant_id = menu_editor(&state, &auth).await?;

    let image_url = clean_nullable(req.image_url);
    check_url("image_url", image_url.clone().flatten().as_deref())?;

    let category = Category::update(
        &state.db,
        tenant_id,
        id,
        UpdateCategory {
            name: req.name.map(|n| n.trim().to_string()),
            description: clean_nullable(req.description),
            image_url,
            sort_order: req.sort_order,
            is_active: req.is_active,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Category"))?;

    Ok(Json(category))
}

/// Deletes a category together with its products
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let tenant_id = menu_editor(&state, &auth).await?;

    if !Category::delete(&state.db, tenant_id, id).await? {
        return Err(ApiError::not_found("Category"));
    }

    tracing::info!(tenant_id = %tenant_id, category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<Json<ReorderResponse>> {
    validate_request(&req)?;
    let tenant_id = menu_editor(&state, &auth).await?;

    let updated = Category::reorder(&state.db, tenant_id, &req.ids).await?;
    Ok(Json(ReorderResponse { updated }))
}

/// Product, variant and customization endpoints
///
/// Products live in a category of the same tenant. Variants replace the base
/// price; customization groups bound how many of their options a customer
/// picks, and each option adds its `price_delta` to the unit price.

use super::{check_url, clean, clean_nullable, menu_editor, nullable};
use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use menuboard_shared::{
    auth::{
        authorization::{require_permission, Permission},
        middleware::AuthContext,
    },
    cart::round_money,
    models::{
        customization::{
            CreateCustomizationGroup, CreateCustomizationOption, CustomizationGroup,
            CustomizationOption, UpdateCustomizationGroup, UpdateCustomizationOption,
        },
        product::{CreateProduct, Product, UpdateProduct},
        product_variant::{CreateProductVariant, ProductVariant, UpdateProductVariant},
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Upper bound for any single price or price delta
const MAX_PRICE: i64 = 1_000_000;

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub category_id: Option<Uuid>,

    #[serde(default)]
    pub available_only: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    pub category_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub price: Decimal,

    pub image_url: Option<String>,

    #[serde(default = "default_true")]
    pub is_available: bool,

    #[serde(default)]
    pub is_featured: bool,

    #[validate(range(min = 0, message = "Sort order must not be negative"))]
    pub sort_order: Option<i32>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    pub category_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    pub price: Option<Decimal>,

    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,

    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,

    #[validate(range(min = 0, message = "Sort order must not be negative"))]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReorderProductsRequest {
    pub category_id: Uuid,

    #[validate(length(min = 1, max = 500, message = "Provide 1-500 ids"))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub updated: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VariantRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub price: Decimal,

    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVariantRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    pub price: Option<Decimal>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GroupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(range(min = 0, max = 50, message = "Minimum must be between 0 and 50"))]
    pub min_select: i32,

    /// 0 = unlimited
    #[serde(default)]
    #[validate(range(min = 0, max = 50, message = "Maximum must be between 0 and 50"))]
    pub max_select: i32,

    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 0, max = 50, message = "Minimum must be between 0 and 50"))]
    pub min_select: Option<i32>,

    #[validate(range(min = 0, max = 50, message = "Maximum must be between 0 and 50"))]
    pub max_select: Option<i32>,

    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OptionRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[serde(default)]
    pub price_delta: Decimal,

    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOptionRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    pub price_delta: Option<Decimal>,
    pub sort_order: Option<i32>,
}

/// Group of a product with its options, as shown in the back office
#[derive(Debug, Serialize)]
pub struct GroupWithOptions {
    #[serde(flatten)]
    pub group: CustomizationGroup,
    pub options: Vec<CustomizationOption>,
}

/// Validates a price and rounds it to cents
fn price(field: &str, value: Decimal) -> ApiResult<Decimal> {
    if value.is_sign_negative() {
        return Err(ApiError::invalid_field(field, "Must not be negative"));
    }
    if value > Decimal::from(MAX_PRICE) {
        return Err(ApiError::invalid_field(field, "Too large"));
    }
    Ok(round_money(value))
}

/// Option deltas may be negative (e.g. "no cheese") but are bounded
fn price_delta(value: Decimal) -> ApiResult<Decimal> {
    if value.abs() > Decimal::from(MAX_PRICE) {
        return Err(ApiError::invalid_field("price_delta", "Too large"));
    }
    Ok(round_money(value))
}

fn check_bounds(min_select: i32, max_select: i32) -> ApiResult<()> {
    if max_select != 0 && max_select < min_select {
        return Err(ApiError::invalid_field(
            "max_select",
            "Maximum must be 0 (unlimited) or at least the minimum",
        ));
    }
    Ok(())
}

async fn find_product(state: &AppState, tenant_id: Uuid, id: Uuid) -> ApiResult<Product> {
    Product::find(&state.db, tenant_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))
}

// Products

pub async fn list(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let tenant_id = require_permission(&auth, Permission::View)?;

    let products =
        Product::list(&state.db, tenant_id, query.category_id, query.available_only).await?;
    Ok(Json(products))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    let tenant_id = require_permission(&auth, Permission::View)?;
    Ok(Json(find_product(&state, tenant_id, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    validate_request(&req)?;
    let tenant_id = menu_editor(&state, &auth).await?;

    let image_url = clean(req.image_url);
    check_url("image_url", image_url.as_deref())?;

    let product = Product::create(
        &state.db,
        tenant_id,
        CreateProduct {
            category_id: req.category_id,
            name: req.name.trim().to_string(),
            description: clean(req.description),
            price: price("price", req.price)?,
            image_url,
            is_available: req.is_available,
            is_featured: req.is_featured,
            sort_order: req.sort_order,
        },
    )
    .await?
    .ok_or_else(|| ApiError::invalid_field("category_id", "Unknown category"))?;

    tracing::info!(tenant_id = %tenant_id, product_id = %product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    validate_request(&req)?;
    let tenant_id = menu_editor(&state, &auth).await?;

    let image_url = clean_nullable(req.image_url);
    check_url("image_url", image_url.clone().flatten().as_deref())?;

    let product = Product::update(
        &state.db,
        tenant_id,
        id,
        UpdateProduct {
            category_id: req.category_id,
            name: req.name.map(|n| n.trim().to_string()),
            description: clean_nullable(req.description),
            price: req.price.map(|p| price("price", p)).transpose()?,
            image_url,
            is_available: req.is_available,
            is_featured: req.is_featured,
            sort_order: req.sort_order,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Product"))?;

    Ok(Json(product))
}

pub async fn set_availability(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<AvailabilityRequest>,
) -> ApiResult<Json<Product>> {
    let tenant_id = menu_editor(&state, &auth).await?;

    let product = Product::set_availability(&state.db, tenant_id, id, req.is_available)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;

    tracing::info!(
        tenant_id = %tenant_id,
        product_id = %product.id,
        is_available = product.is_available,
        "Product availability changed"
    );

    Ok(Json(product))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let tenant_id = menu_editor(&state, &auth).await?;

    if !Product::delete(&state.db, tenant_id, id).await? {
        return Err(ApiError::not_found("Product"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<ReorderProductsRequest>,
) -> ApiResult<Json<ReorderResponse>> {
    validate_request(&req)?;
    let tenant_id = menu_editor(&state, &auth).await?;

    let updated = Product::reorder(&state.db, tenant_id, req.category_id, &req.ids).await?;
    Ok(Json(ReorderResponse { updated }))
}

// Variants

pub async fn list_variants(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProductVariant>>> {
    let tenant_id = require_permission(&auth, Permission::View)?;
    find_product(&state, tenant_id, product_id).await?;

    let variants = ProductVariant::list_for_products(&state.db, tenant_id, &[product_id]).await?;
    Ok(Json(variants))
}

pub async fn create_variant(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(product_id): Path<Uuid>,
    Json(req): Json<VariantRequest>,
) -> ApiResult<(StatusCode, Json<ProductVariant>)> {
    validate_request(&req)?;
    let tenant_id = menu_editor(&state, &auth).await?;

    let variant = ProductVariant::create(
        &state.db,
        tenant_id,
        product_id,
        CreateProductVariant {
            name: req.name.trim().to_string(),
            price: price("price", req.price)?,
            sort_order: req.sort_order,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Product"))?;

    Ok((StatusCode::CREATED, Json(variant)))
}

pub async fn update_variant(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateVariantRequest>,
) -> ApiResult<Json<ProductVariant>> {
    validate_request(&req)?;
    let tenant_id = menu_editor(&state, &auth).await?;

    let variant = ProductVariant::update(
        &state.db,
        tenant_id,
        id,
        UpdateProductVariant {
            name: req.name.map(|n| n.trim().to_string()),
            price: req.price.map(|p| price("price", p)).transpose()?,
            sort_order: req.sort_order,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Variant"))?;

    Ok(Json(variant))
}

pub async fn delete_variant(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let tenant_id = menu_editor(&state, &auth).await?;

    if !ProductVariant::delete(&state.db, tenant_id, id).await? {
        return Err(ApiError::not_found("Variant"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Customization groups and options

pub async fn list_groups(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Vec<GroupWithOptions>>> {
    let tenant_id = require_permission(&auth, Permission::View)?;
    find_product(&state, tenant_id, product_id).await?;

    let groups = CustomizationGroup::list_for_products(&state.db, tenant_id, &[product_id]).await?;
    let group_ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
    let mut options = CustomizationOption::list_for_groups(&state.db, tenant_id, &group_ids).await?;

    let groups = groups
        .into_iter()
        .map(|group| {
            let (mine, rest): (Vec<_>, Vec<_>) =
                options.drain(..).partition(|o| o.group_id == group.id);
            options = rest;
            GroupWithOptions {
                group,
                options: mine,
            }
        })
        .collect();

    Ok(Json(groups))
}

pub async fn create_group(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(product_id): Path<Uuid>,
    Json(req): Json<GroupRequest>,
) -> ApiResult<(StatusCode, Json<CustomizationGroup>)> {
    validate_request(&req)?;
    check_bounds(req.min_select, req.max_select)?;
    let tenant_id = menu_editor(&state, &auth).await?;

    let group = CustomizationGroup::create(
        &state.db,
        tenant_id,
        product_id,
        CreateCustomizationGroup {
            name: req.name.trim().to_string(),
            min_select: req.min_select,
            max_select: req.max_select,
            sort_order: req.sort_order,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Product"))?;

    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn update_group(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateGroupRequest>,
) -> ApiResult<Json<CustomizationGroup>> {
    validate_request(&req)?;
    if let (Some(min), Some(max)) = (req.min_select, req.max_select) {
        check_bounds(min, max)?;
    }
    let tenant_id = menu_editor(&state, &auth).await?;

    let group = CustomizationGroup::update(
        &state.db,
        tenant_id,
        id,
        UpdateCustomizationGroup {
            name: req.name.map(|n| n.trim().to_string()),
            min_select: req.min_select,
            max_select: req.max_select,
            sort_order: req.sort_order,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Customization group"))?;

    Ok(Json(group))
}

pub async fn delete_group(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let tenant_id = menu_editor(&state, &auth).await?;

    if !CustomizationGroup::delete(&state.db, tenant_id, id).await? {
        return Err(ApiError::not_found("Customization group"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_option(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(group_id): Path<Uuid>,
    Json(req): Json<OptionRequest>,
) -> ApiResult<(StatusCode, Json<CustomizationOption>)> {
    validate_request(&req)?;
    let tenant_id = menu_editor(&state, &auth).await?;

    let option = CustomizationOption::create(
        &state.db,
        tenant_id,
        group_id,
        CreateCustomizationOption {
            name: req.name.trim().to_string(),
            price_delta: price_delta(req.price_delta)?,
            sort_order: req.sort_order,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Customization group"))?;

    Ok((StatusCode::CREATED, Json(option)))
}

pub async fn update_option(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOptionRequest>,
) -> ApiResult<Json<CustomizationOption>> {
    validate_request(&req)?;
    let tenant_id = menu_editor(&state, &auth).await?;

    let option = CustomizationOption::update(
        &state.db,
        tenant_id,
        id,
        UpdateCustomizationOption {
            name: req.name.map(|n| n.trim().to_string()),
            price_delta: req.price_delta.map(price_delta).transpose()?,
            sort_order: req.sort_order,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Customization option"))?;

    Ok(Json(option))
}

pub async fn delete_option(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let tenant_id = menu_editor(&state, &auth).await?;

    if !CustomizationOption::delete(&state.db, tenant_id, id).await? {
        return Err(ApiError::not_found("Customization option"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_rounding_and_bounds() {
        assert_eq!(price("price", Decimal::new(12345, 3)).unwrap(), Decimal::new(1235, 2));
        assert!(price("price", Decimal::new(-1, 2)).is_err());
        assert!(price("price", Decimal::from(MAX_PRICE + 1)).is_err());
    }

    #[test]
    fn test_price_delta_may_be_negative() {
        assert_eq!(price_delta(Decimal::new(-150, 2)).unwrap(), Decimal::new(-150, 2));
        assert!(price_delta(Decimal::from(-MAX_PRICE - 1)).is_err());
    }

    #[test]
    fn test_group_bounds() {
        assert!(check_bounds(0, 0).is_ok());
        assert!(check_bounds(1, 3).is_ok());
        assert!(check_bounds(2, 0).is_ok());
        assert!(check_bounds(3, 1).is_err());
    }

    #[test]
    fn test_create_product_defaults() {
        let req: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "category_id": Uuid::new_v4(),
            "name": "Margherita",
            "price": "8.50"
        }))
        .unwrap();

        assert!(req.is_available);
        assert!(!req.is_featured);
        assert_eq!(req.price, Decimal::new(850, 2));
    }
}

/// Customer-facing endpoints, addressed by tenant slug
///
/// The menu, ordering and waiter calls are only served while the tenant's
/// trial or subscription is running (402 otherwise). Appearance settings and
/// the status of an already placed order stay readable.

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use menuboard_shared::{
    access::{ensure_service, AccessStatus},
    cart::{Cart, CartItem, Catalog, OrderLine},
    models::{
        category::Category,
        customization::{CustomizationGroup, CustomizationOption},
        landing_content::LandingSection,
        order::{CreateOrder, Order, OrderStatus},
        product::Product,
        product_variant::ProductVariant,
        settings::Settings,
        tenant::Tenant,
        waiter_call::{WaiterCall, WaiterCallStatus},
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub restaurant: RestaurantInfo,
    pub settings: Settings,
    pub categories: Vec<MenuCategory>,
}

#[derive(Debug, Serialize)]
pub struct RestaurantInfo {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct MenuCategory {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<MenuProduct>,
}

#[derive(Debug, Serialize)]
pub struct MenuProduct {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
    pub customization_groups: Vec<MenuCustomizationGroup>,
}

#[derive(Debug, Serialize)]
pub struct MenuCustomizationGroup {
    #[serde(flatten)]
    pub group: CustomizationGroup,
    pub options: Vec<CustomizationOption>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    #[validate(range(min = 1, message = "Table number must be positive"))]
    pub table_number: Option<i32>,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub customer_name: Option<String>,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,

    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<CartItem>,
}

#[derive(Debug, Serialize)]
pub struct PlacedOrder {
    pub id: Uuid,
    pub order_number: i32,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Order as shown to the customer tracking it
#[derive(Debug, Serialize)]
pub struct PublicOrder {
    pub id: Uuid,
    pub order_number: i32,
    pub table_number: Option<i32>,
    pub status: OrderStatus,
    pub items: Vec<OrderLine>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for PublicOrder {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            table_number: order.table_number,
            status: order.status,
            items: order.items.0,
            total_amount: order.total_amount,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CallWaiterRequest {
    #[validate(range(min = 1, message = "Table number must be positive"))]
    pub table_number: i32,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WaiterCallResponse {
    pub id: Uuid,
    pub table_number: i32,
    pub status: WaiterCallStatus,
    pub created_at: DateTime<Utc>,

    /// False when an open call for the table already existed
    pub created: bool,
}

async fn tenant_by_slug(state: &AppState, slug: &str) -> ApiResult<Tenant> {
    Tenant::find_by_slug(&state.db, &slug.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))
}

/// Loads a tenant that is currently allowed to serve customers
async fn serving_tenant(state: &AppState, slug: &str) -> ApiResult<Tenant> {
    let tenant = tenant_by_slug(state, slug).await?;
    let status = AccessStatus::evaluate(&tenant, Utc::now());
    let (tenant, _) = ensure_service(&tenant, status)?;
    Ok(tenant)
}

async fn tenant_settings(state: &AppState, tenant_id: Uuid) -> ApiResult<Settings> {
    Settings::find(&state.db, tenant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Settings"))
}

/// Table numbers must exist in the restaurant's floor plan
fn check_table(settings: &Settings, table_number: i32) -> ApiResult<()> {
    if table_number > settings.table_count {
        return Err(ApiError::invalid_field(
            "table_number",
            format!("Table must be between 1 and {}", settings.table_count),
        ));
    }
    Ok(())
}

pub async fn menu(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<MenuResponse>> {
    let tenant = serving_tenant(&state, &slug).await?;
    let settings = tenant_settings(&state, tenant.id).await?;

    let categories = Category::list(&state.db, tenant.id, true).await?;
    let products = Product::list(&state.db, tenant.id, None, true).await?;
    let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

    let variants = ProductVariant::list_for_products(&state.db, tenant.id, &product_ids).await?;
    let groups = CustomizationGroup::list_for_products(&state.db, tenant.id, &product_ids).await?;
    let group_ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
    let options = CustomizationOption::list_for_groups(&state.db, tenant.id, &group_ids).await?;

    Ok(Json(MenuResponse {
        restaurant: RestaurantInfo {
            slug: tenant.slug,
            name: settings.restaurant_name.clone(),
        },
        settings,
        categories: assemble_menu(categories, products, variants, groups, options),
    }))
}

/// Nests the flat catalog rows, keeping each list's query order
fn assemble_menu(
    categories: Vec<Category>,
    products: Vec<Product>,
    variants: Vec<ProductVariant>,
    groups: Vec<CustomizationGroup>,
    options: Vec<CustomizationOption>,
) -> Vec<MenuCategory> {
    let mut options_by_group: HashMap<Uuid, Vec<CustomizationOption>> = HashMap::new();
    for option in options {
        options_by_group.entry(option.group_id).or_default().push(option);
    }

    let mut groups_by_product: HashMap<Uuid, Vec<MenuCustomizationGroup>> = HashMap::new();
    for group in groups {
        let options = options_by_group.remove(&group.id).unwrap_or_default();
        groups_by_product
            .entry(group.product_id)
            .or_default()
            .push(MenuCustomizationGroup { group, options });
    }

    let mut variants_by_product: HashMap<Uuid, Vec<ProductVariant>> = HashMap::new();
    for variant in variants {
        variants_by_product.entry(variant.product_id).or_default().push(variant);
    }

    let mut products_by_category: HashMap<Uuid, Vec<MenuProduct>> = HashMap::new();
    for product in products {
        let variants = variants_by_product.remove(&product.id).unwrap_or_default();
        let customization_groups = groups_by_product.remove(&product.id).unwrap_or_default();
        products_by_category
            .entry(product.category_id)
            .or_default()
            .push(MenuProduct {
                product,
                variants,
                customization_groups,
            });
    }

    categories
        .into_iter()
        .map(|category| MenuCategory {
            products: products_by_category.remove(&category.id).unwrap_or_default(),
            category,
        })
        .collect()
}

pub async fn settings(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Settings>> {
    let tenant = tenant_by_slug(&state, &slug).await?;
    Ok(Json(tenant_settings(&state, tenant.id).await?))
}

pub async fn place_order(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<PlaceOrderRequest>,
) -> ApiResult<(StatusCode, Json<PlacedOrder>)> {
    validate_request(&req)?;

    let tenant = serving_tenant(&state, &slug).await?;
    let settings = tenant_settings(&state, tenant.id).await?;

    if !settings.ordering_enabled {
        return Err(ApiError::Forbidden(
            "This restaurant doesn't take orders online".to_string(),
        ));
    }
    if let Some(table) = req.table_number {
        check_table(&settings, table)?;
    }

    let cart = Cart::from_items(req.items)?;
    let catalog = Catalog::load(&state.db, tenant.id, &cart).await?;
    let priced = cart.price(&catalog)?;

    let order = Order::create(
        &state.db,
        tenant.id,
        CreateOrder {
            table_number: req.table_number,
            customer_name: req.customer_name.filter(|n| !n.trim().is_empty()),
            notes: req.notes.filter(|n| !n.trim().is_empty()),
            items: priced.lines,
            total_amount: priced.total,
        },
    )
    .await?;

    tracing::info!(
        tenant_id = %tenant.id,
        order_id = %order.id,
        order_number = order.order_number,
        total = %order.total_amount,
        items = priced.item_count,
        "Order placed"
    );

    Ok((
        StatusCode::CREATED,
        Json(PlacedOrder {
            id: order.id,
            order_number: order.order_number,
            status: order.status,
            total_amount: order.total_amount,
            created_at: order.created_at,
        }),
    ))
}

pub async fn order_status(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> ApiResult<Json<PublicOrder>> {
    let tenant = tenant_by_slug(&state, &slug).await?;

    let order = Order::find(&state.db, tenant.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;

    Ok(Json(order.into()))
}

pub async fn call_waiter(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<CallWaiterRequest>,
) -> ApiResult<(StatusCode, Json<WaiterCallResponse>)> {
    validate_request(&req)?;

    let tenant = serving_tenant(&state, &slug).await?;
    let settings = tenant_settings(&state, tenant.id).await?;

    if !settings.waiter_call_enabled {
        return Err(ApiError::Forbidden(
            "Waiter calls are disabled for this restaurant".to_string(),
        ));
    }
    check_table(&settings, req.table_number)?;

    let note = req.note.filter(|n| !n.trim().is_empty());
    let (call, created) =
        WaiterCall::create_or_get_open(&state.db, tenant.id, req.table_number, note).await?;

    if created {
        tracing::info!(tenant_id = %tenant.id, table = call.table_number, "Waiter called");
    }

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(WaiterCallResponse {
            id: call.id,
            table_number: call.table_number,
            status: call.status,
            created_at: call.created_at,
            created,
        }),
    ))
}

pub async fn landing(State(state): State<AppState>) -> ApiResult<Json<Vec<LandingSection>>> {
    Ok(Json(LandingSection::list(&state.db).await?))
}

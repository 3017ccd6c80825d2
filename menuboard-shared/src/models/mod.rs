/// Database models for Menuboard
///
/// Each model owns its SQL. Tenant-owned rows are always queried with the
/// caller's `tenant_id`; rows without their own `tenant_id` (variants,
/// customizations) are scoped through their parent product.
///
/// # Models
///
/// - `tenant`: Restaurants, plans and trial/premium dates
/// - `admin_user`: Back-office accounts and roles
/// - `settings`: Appearance and behaviour, one row per tenant
/// - `category`, `product`, `product_variant`, `customization`: Menu catalog
/// - `order`: Customer orders with a priced line snapshot
/// - `waiter_call`: Table service requests
/// - `payment_transaction`: Subscription payments
/// - `landing_content`: Platform landing page sections
///
/// # Example
///
/// ```no_run
/// use menuboard_shared::models::category::Category;
/// use menuboard_shared::models::tenant::Tenant;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// if let Some(tenant) = Tenant::find_by_slug(&pool, "pizza-roma").await? {
///     let categories = Category::list(&pool, tenant.id, true).await?;
///     println!("{} categories", categories.len());
/// }
/// # Ok(())
/// # }
/// ```

pub mod admin_user;
pub mod category;
pub mod customization;
pub mod landing_content;
pub mod order;
pub mod payment_transaction;
pub mod product;
pub mod product_variant;
pub mod settings;
pub mod tenant;
pub mod waiter_call;

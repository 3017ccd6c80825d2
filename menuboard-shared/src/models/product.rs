/// Product model and database operations
///
/// Products belong to a category of the same tenant. Prices are
/// `NUMERIC(10,2)` mapped to [`rust_decimal::Decimal`].
///
/// # Example
///
/// ```no_run
/// use menuboard_shared::models::product::{Product, CreateProduct};
/// use rust_decimal::Decimal;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, tenant_id: Uuid, category_id: Uuid) -> Result<(), sqlx::Error> {
/// let created = Product::create(&pool, tenant_id, CreateProduct {
///     category_id,
///     name: "Margherita".to_string(),
///     description: None,
///     price: Decimal::new(950, 2),
///     image_url: None,
///     is_available: true,
///     is_featured: false,
///     sort_order: None,
/// }).await?;
///
/// if let Some(product) = created {
///     Product::set_availability(&pool, tenant_id, product.id, false).await?;
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,

    /// Base unit price, replaced by a variant's price when one is chosen
    pub price: Decimal,

    pub image_url: Option<String>,

    /// Unavailable products stay on the admin list but not on the public menu
    pub is_available: bool,

    pub is_featured: bool,

    /// Position within the category, ascending
    pub sort_order: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub is_featured: bool,

    /// Appended after the category's last product when None
    pub sort_order: Option<i32>,
}

/// Input for updating a product
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub image_url: Option<Option<String>>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

const PRODUCT_COLUMNS: &str = "id, tenant_id, category_id, name, description, price, image_url, \
     is_available, is_featured, sort_order, created_at, updated_at";

impl Product {
    /// Creates a product in one of the tenant's categories
    ///
    /// Returns None when the category doesn't belong to the tenant.
    pub async fn create(
        pool: &PgPool,
        tenant_id: Uuid,
        data: CreateProduct,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products
                (tenant_id, category_id, name, description, price, image_url,
                 is_available, is_featured, sort_order)
            SELECT c.tenant_id, c.id, $3, $4, $5, $6, $7, $8,
                   COALESCE($9, (SELECT COALESCE(MAX(sort_order) + 1, 0)
                                 FROM products WHERE category_id = c.id))
            FROM categories c
            WHERE c.id = $2 AND c.tenant_id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(data.category_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.price)
        .bind(data.image_url)
        .bind(data.is_available)
        .bind(data.is_featured)
        .bind(data.sort_order)
        .fetch_optional(pool)
        .await
    }

    pub async fn find(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
    }

    /// Loads several products of one tenant at once (cart pricing)
    pub async fn find_many(
        pool: &PgPool,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = $1 AND id = ANY($2)"
        ))
        .bind(tenant_id)
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Lists products, optionally limited to one category
    ///
    /// With `available_only`, unavailable products are skipped.
    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        category_id: Option<Uuid>,
        available_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE tenant_id = $1
              AND ($2::UUID IS NULL OR category_id = $2)
              AND (NOT $3 OR is_available)
            ORDER BY category_id, sort_order, created_at
            "#
        ))
        .bind(tenant_id)
        .bind(category_id)
        .bind(available_only)
        .fetch_all(pool)
        .await
    }

    /// Updates a product
    ///
    /// Moving to another category requires that category to belong to the
    /// same tenant; otherwise nothing is updated and None is returned.
    pub async fn update(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateProduct,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE products SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.category_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category_id = ${}", bind_count));
        }
        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.price.is_some() {
            bind_count += 1;
            query.push_str(&format!(", price = ${}", bind_count));
        }
        if data.image_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", image_url = ${}", bind_count));
        }
        if data.is_available.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_available = ${}", bind_count));
        }
        if data.is_featured.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_featured = ${}", bind_count));
        }
        if data.sort_order.is_some() {
            bind_count += 1;
            query.push_str(&format!(", sort_order = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1 AND tenant_id = $2");
        if data.category_id.is_some() {
            query.push_str(
                " AND EXISTS (SELECT 1 FROM categories WHERE id = $3 AND tenant_id = $2)",
            );
        }
        query.push_str(&format!(" RETURNING {PRODUCT_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Product>(&query).bind(id).bind(tenant_id);

        if let Some(category_id) = data.category_id {
            q = q.bind(category_id);
        }
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(price) = data.price {
            q = q.bind(price);
        }
        if let Some(image_url) = data.image_url {
            q = q.bind(image_url);
        }
        if let Some(is_available) = data.is_available {
            q = q.bind(is_available);
        }
        if let Some(is_featured) = data.is_featured {
            q = q.bind(is_featured);
        }
        if let Some(sort_order) = data.sort_order {
            q = q.bind(sort_order);
        }

        q.fetch_optional(pool).await
    }

    /// Flips a product on or off the public menu
    pub async fn set_availability(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
        is_available: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET is_available = $3, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(is_available)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets `sort_order` to each product's position in `ids` within a category
    pub async fn reorder(
        pool: &PgPool,
        tenant_id: Uuid,
        category_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE products p
            SET sort_order = (o.position - 1)::INT, updated_at = NOW()
            FROM UNNEST($3::UUID[]) WITH ORDINALITY AS o(id, position)
            WHERE p.id = o.id AND p.tenant_id = $1 AND p.category_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(category_id)
        .bind(ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_product_default() {
        let update = UpdateProduct::default();
        assert!(update.category_id.is_none());
        assert!(update.price.is_none());
        assert!(update.is_available.is_none());
    }

    #[test]
    fn test_price_accepts_string_and_number() {
        let from_str: Decimal = serde_json::from_str("\"9.50\"").unwrap();
        let from_num: Decimal = serde_json::from_str("9.5").unwrap();
        assert_eq!(from_str, from_num);
    }
}

/// Product variants (sizes, portions)
///
/// A variant's price replaces the product's base price. Variants have no
/// `tenant_id` of their own; every query joins `products` to scope by tenant.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductVariant {
    pub name: String,
    pub price: Decimal,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductVariant {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub sort_order: Option<i32>,
}

impl ProductVariant {
    /// Adds a variant to a product of the tenant
    ///
    /// Returns None when the product doesn't belong to the tenant.
    pub async fn create(
        pool: &PgPool,
        tenant_id: Uuid,
        product_id: Uuid,
        data: CreateProductVariant,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProductVariant>(
            r#"
            INSERT INTO product_variants (product_id, name, price, sort_order)
            SELECT p.id, $3, $4, $5 FROM products p
            WHERE p.id = $1 AND p.tenant_id = $2
            RETURNING id, product_id, name, price, sort_order, created_at
            "#,
        )
        .bind(product_id)
        .bind(tenant_id)
        .bind(data.name)
        .bind(data.price)
        .bind(data.sort_order)
        .fetch_optional(pool)
        .await
    }

    /// Lists the variants of several products of one tenant
    pub async fn list_for_products(
        pool: &PgPool,
        tenant_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProductVariant>(
            r#"
            SELECT v.id, v.product_id, v.name, v.price, v.sort_order, v.created_at
            FROM product_variants v
            JOIN products p ON p.id = v.product_id
            WHERE p.tenant_id = $1 AND v.product_id = ANY($2)
            ORDER BY v.product_id, v.sort_order, v.created_at
            "#,
        )
        .bind(tenant_id)
        .bind(product_ids)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateProductVariant,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProductVariant>(
            r#"
            UPDATE product_variants v
            SET name = COALESCE($3, v.name),
                price = COALESCE($4, v.price),
                sort_order = COALESCE($5, v.sort_order)
            FROM products p
            WHERE v.id = $1 AND p.id = v.product_id AND p.tenant_id = $2
            RETURNING v.id, v.product_id, v.name, v.price, v.sort_order, v.created_at
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(data.name)
        .bind(data.price)
        .bind(data.sort_order)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM product_variants v
            USING products p
            WHERE v.id = $1 AND p.id = v.product_id AND p.tenant_id = $2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

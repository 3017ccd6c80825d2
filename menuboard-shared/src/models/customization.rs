/// Product customizations: option groups and their options
///
/// A group ("Sauce", "Extras") bounds how many of its options a customer may
/// pick with `min_select..=max_select`, where a `max_select` of 0 means no
/// upper bound. An option's `price_delta` is added to the unit price.
///
/// Groups are scoped through `products.tenant_id`, options through their
/// group's product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CustomizationGroup {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,

    /// Minimum number of options to pick (0 = optional group)
    pub min_select: i32,

    /// Maximum number of options to pick (0 = unlimited)
    pub max_select: i32,

    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl CustomizationGroup {
    /// Whether `count` picked options satisfy the group bounds
    pub fn accepts(&self, count: usize) -> bool {
        let count = count as i64;
        count >= i64::from(self.min_select)
            && (self.max_select == 0 || count <= i64::from(self.max_select))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CustomizationOption {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub price_delta: Decimal,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomizationGroup {
    pub name: String,
    pub min_select: i32,
    pub max_select: i32,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCustomizationGroup {
    pub name: Option<String>,
    pub min_select: Option<i32>,
    pub max_select: Option<i32>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomizationOption {
    pub name: String,
    pub price_delta: Decimal,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCustomizationOption {
    pub name: Option<String>,
    pub price_delta: Option<Decimal>,
    pub sort_order: Option<i32>,
}

impl CustomizationGroup {
    /// Adds a group to a product of the tenant
    ///
    /// Returns None when the product doesn't belong to the tenant.
    pub async fn create(
        pool: &PgPool,
        tenant_id: Uuid,
        product_id: Uuid,
        data: CreateCustomizationGroup,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomizationGroup>(
            r#"
            INSERT INTO customization_groups (product_id, name, min_select, max_select, sort_order)
            SELECT p.id, $3, $4, $5, $6 FROM products p
            WHERE p.id = $1 AND p.tenant_id = $2
            RETURNING id, product_id, name, min_select, max_select, sort_order, created_at
            "#,
        )
        .bind(product_id)
        .bind(tenant_id)
        .bind(data.name)
        .bind(data.min_select)
        .bind(data.max_select)
        .bind(data.sort_order)
        .fetch_optional(pool)
        .await
    }

    /// Lists the groups of several products of one tenant
    pub async fn list_for_products(
        pool: &PgPool,
        tenant_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomizationGroup>(
            r#"
            SELECT g.id, g.product_id, g.name, g.min_select, g.max_select, g.sort_order, g.created_at
            FROM customization_groups g
            JOIN products p ON p.id = g.product_id
            WHERE p.tenant_id = $1 AND g.product_id = ANY($2)
            ORDER BY g.product_id, g.sort_order, g.created_at
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
        data: UpdateCustomizationGroup,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomizationGroup>(
            r#"
            UPDATE customization_groups g
            SET name = COALESCE($3, g.name),
                min_select = COALESCE($4, g.min_select),
                max_select = COALESCE($5, g.max_select),
                sort_order = COALESCE($6, g.sort_order)
            FROM products p
            WHERE g.id = $1 AND p.id = g.product_id AND p.tenant_id = $2
            RETURNING g.id, g.product_id, g.name, g.min_select, g.max_select, g.sort_order, g.created_at
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(data.name)
        .bind(data.min_select)
        .bind(data.max_select)
        .bind(data.sort_order)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a group and its options
    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM customization_groups g
            USING products p
            WHERE g.id = $1 AND p.id = g.product_id AND p.tenant_id = $2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl CustomizationOption {
    /// Adds an option to a group of the tenant
    ///
    /// Returns None when the group doesn't belong to the tenant.
    pub async fn create(
        pool: &PgPool,
        tenant_id: Uuid,
        group_id: Uuid,
        data: CreateCustomizationOption,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomizationOption>(
            r#"
            INSERT INTO customization_options (group_id, name, price_delta, sort_order)
            SELECT g.id, $3, $4, $5
            FROM customization_groups g
            JOIN products p ON p.id = g.product_id
            WHERE g.id = $1 AND p.tenant_id = $2
            RETURNING id, group_id, name, price_delta, sort_order, created_at
            "#,
        )
        .bind(group_id)
        .bind(tenant_id)
        .bind(data.name)
        .bind(data.price_delta)
        .bind(data.sort_order)
        .fetch_optional(pool)
        .await
    }

    /// Lists the options of several groups of one tenant
    pub async fn list_for_groups(
        pool: &PgPool,
        tenant_id: Uuid,
        group_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomizationOption>(
            r#"
            SELECT o.id, o.group_id, o.name, o.price_delta, o.sort_order, o.created_at
            FROM customization_options o
            JOIN customization_groups g ON g.id = o.group_id
            JOIN products p ON p.id = g.product_id
            WHERE p.tenant_id = $1 AND o.group_id = ANY($2)
            ORDER BY o.group_id, o.sort_order, o.created_at
            "#,
        )
        .bind(tenant_id)
        .bind(group_ids)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateCustomizationOption,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomizationOption>(
            r#"
            UPDATE customization_options o
            SET name = COALESCE($3, o.name),
                price_delta = COALESCE($4, o.price_delta),
                sort_order = COALESCE($5, o.sort_order)
            FROM customization_groups g, products p
            WHERE o.id = $1 AND g.id = o.group_id AND p.id = g.product_id AND p.tenant_id = $2
            RETURNING o.id, o.group_id, o.name, o.price_delta, o.sort_order, o.created_at
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(data.name)
        .bind(data.price_delta)
        .bind(data.sort_order)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM customization_options o
            USING customization_groups g, products p
            WHERE o.id = $1 AND g.id = o.group_id AND p.id = g.product_id AND p.tenant_id = $2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

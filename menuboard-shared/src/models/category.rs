/// Menu category model
///
/// Categories group products on the public menu and are shown in
/// `sort_order`. Every query is scoped by `tenant_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,

    /// Position on the menu, ascending
    pub sort_order: i32,

    /// Hidden from the public menu when false
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,

    /// Appended after the last category when None
    pub sort_order: Option<i32>,

    pub is_active: bool,
}

/// Input for updating a category
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

const CATEGORY_COLUMNS: &str =
    "id, tenant_id, name, description, image_url, sort_order, is_active, created_at, updated_at";

impl Category {
    pub async fn create(
        pool: &PgPool,
        tenant_id: Uuid,
        data: CreateCategory,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (tenant_id, name, description, image_url, sort_order, is_active)
            VALUES (
                $1, $2, $3, $4,
                COALESCE($5, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM categories WHERE tenant_id = $1)),
                $6
            )
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.image_url)
        .bind(data.sort_order)
        .bind(data.is_active)
        .fetch_one(pool)
        .await
    }

    pub async fn find(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists categories in menu order
    ///
    /// With `active_only`, hidden categories are skipped (public menu).
    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            SELECT {CATEGORY_COLUMNS} FROM categories
            WHERE tenant_id = $1 AND (NOT $2 OR is_active)
            ORDER BY sort_order, created_at
            "#
        ))
        .bind(tenant_id)
        .bind(active_only)
        .fetch_all(pool)
        .await
    }

    /// Ids of the hidden categories among `ids`
    pub async fn hidden_ids(
        pool: &PgPool,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT id FROM categories
            WHERE tenant_id = $1 AND id = ANY($2) AND NOT is_active
            "#,
        )
        .bind(tenant_id)
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateCategory,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE categories SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.image_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", image_url = ${}", bind_count));
        }
        if data.sort_order.is_some() {
            bind_count += 1;
            query.push_str(&format!(", sort_order = ${}", bind_count));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND tenant_id = $2 RETURNING {CATEGORY_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Category>(&query).bind(id).bind(tenant_id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(image_url) = data.image_url {
            q = q.bind(image_url);
        }
        if let Some(sort_order) = data.sort_order {
            q = q.bind(sort_order);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a category together with its products
    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets `sort_order` to each category's position in `ids`
    ///
    /// IDs that don't belong to the tenant are ignored. Returns the number of
    /// rows updated.
    pub async fn reorder(pool: &PgPool, tenant_id: Uuid, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE categories c
            SET sort_order = (o.position - 1)::INT, updated_at = NOW()
            FROM UNNEST($2::UUID[]) WITH ORDINALITY AS o(id, position)
            WHERE c.id = o.id AND c.tenant_id = $1
            "#,
        )
        .bind(tenant_id)
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
    fn test_update_category_default() {
        let update = UpdateCategory::default();
        assert!(update.name.is_none());
        assert!(update.description.is_none());
        assert!(update.sort_order.is_none());
        assert!(update.is_active.is_none());
    }
}

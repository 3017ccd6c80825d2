/// Per-tenant appearance and behaviour settings
///
/// Exactly one row per tenant, keyed by `tenant_id`. The row is created with
/// defaults at registration and written with an upsert afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Public menu layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "menu_layout", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MenuLayout {
    Grid,
    List,
}

/// Restaurant settings row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Settings {
    pub tenant_id: Uuid,

    /// Display name shown on the public menu
    pub restaurant_name: String,

    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub cover_image_url: Option<String>,

    /// `#RRGGBB`
    pub primary_color: String,

    /// `#RRGGBB`
    pub secondary_color: String,

    pub font_family: String,
    pub layout: MenuLayout,

    /// ISO 4217 code used to display prices
    pub currency: String,

    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<String>,

    /// Number of tables that get a QR code
    pub table_count: i32,

    /// Customers may place orders from the public menu
    pub ordering_enabled: bool,

    /// Customers may call a waiter from the public menu
    pub waiter_call_enabled: bool,

    pub updated_at: DateTime<Utc>,
}

/// Partial settings write
///
/// None leaves the stored value untouched. Nullable text fields use
/// `Some(None)` to clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettings {
    pub restaurant_name: Option<String>,
    pub description: Option<Option<String>>,
    pub logo_url: Option<Option<String>>,
    pub cover_image_url: Option<Option<String>>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub font_family: Option<String>,
    pub layout: Option<MenuLayout>,
    pub currency: Option<String>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub opening_hours: Option<Option<String>>,
    pub table_count: Option<i32>,
    pub ordering_enabled: Option<bool>,
    pub waiter_call_enabled: Option<bool>,
}

const SETTINGS_COLUMNS: &str = "tenant_id, restaurant_name, description, logo_url, \
     cover_image_url, primary_color, secondary_color, font_family, layout, currency, phone, \
     address, opening_hours, table_count, ordering_enabled, waiter_call_enabled, updated_at";

impl Settings {
    /// Inserts the default row for a new tenant
    pub async fn create_default<'e, E>(
        executor: E,
        tenant_id: Uuid,
        restaurant_name: &str,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Settings>(&format!(
            r#"
            INSERT INTO settings (tenant_id, restaurant_name)
            VALUES ($1, $2)
            RETURNING {SETTINGS_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(restaurant_name)
        .fetch_one(executor)
        .await
    }

    /// Loads the settings of a tenant
    pub async fn find(pool: &PgPool, tenant_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Settings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM settings WHERE tenant_id = $1"
        ))
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
    }

    /// Writes the given fields, creating the row if it is missing
    ///
    /// `fallback_name` is used as `restaurant_name` when the row has to be
    /// created and the update doesn't carry a name.
    pub async fn upsert(
        pool: &PgPool,
        tenant_id: Uuid,
        fallback_name: &str,
        data: UpdateSettings,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO settings (tenant_id, restaurant_name) VALUES ($1, $2) \
             ON CONFLICT (tenant_id) DO NOTHING",
        )
        .bind(tenant_id)
        .bind(fallback_name)
        .execute(&mut *tx)
        .await?;

        let mut query = String::from("UPDATE settings SET updated_at = NOW()");
        let mut bind_count = 1;

        let mut push = |column: &str, present: bool| {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {} = ${}", column, bind_count));
            }
        };
        push("restaurant_name", data.restaurant_name.is_some());
        push("description", data.description.is_some());
        push("logo_url", data.logo_url.is_some());
        push("cover_image_url", data.cover_image_url.is_some());
        push("primary_color", data.primary_color.is_some());
        push("secondary_color", data.secondary_color.is_some());
        push("font_family", data.font_family.is_some());
        push("layout", data.layout.is_some());
        push("currency", data.currency.is_some());
        push("phone", data.phone.is_some());
        push("address", data.address.is_some());
        push("opening_hours", data.opening_hours.is_some());
        push("table_count", data.table_count.is_some());
        push("ordering_enabled", data.ordering_enabled.is_some());
        push("waiter_call_enabled", data.waiter_call_enabled.is_some());

        query.push_str(&format!(" WHERE tenant_id = $1 RETURNING {SETTINGS_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Settings>(&query).bind(tenant_id);

        if let Some(v) = data.restaurant_name {
            q = q.bind(v);
        }
        if let Some(v) = data.description {
            q = q.bind(v);
        }
        if let Some(v) = data.logo_url {
            q = q.bind(v);
        }
        if let Some(v) = data.cover_image_url {
            q = q.bind(v);
        }
        if let Some(v) = data.primary_color {
            q = q.bind(v);
        }
        if let Some(v) = data.secondary_color {
            q = q.bind(v);
        }
        if let Some(v) = data.font_family {
            q = q.bind(v);
        }
        if let Some(v) = data.layout {
            q = q.bind(v);
        }
        if let Some(v) = data.currency {
            q = q.bind(v);
        }
        if let Some(v) = data.phone {
            q = q.bind(v);
        }
        if let Some(v) = data.address {
            q = q.bind(v);
        }
        if let Some(v) = data.opening_hours {
            q = q.bind(v);
        }
        if let Some(v) = data.table_count {
            q = q.bind(v);
        }
        if let Some(v) = data.ordering_enabled {
            q = q.bind(v);
        }
        if let Some(v) = data.waiter_call_enabled {
            q = q.bind(v);
        }

        let settings = q.fetch_one(&mut *tx).await?;
        tx.commit().await?;

        Ok(settings)
    }
}

/// Checks the `#RRGGBB` color format
pub fn is_hex_color(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(|b| b.is_ascii_hexdigit())
}

/// Checks a three-letter uppercase ISO 4217 code shape
pub fn is_currency_code(value: &str) -> bool {
    value.len() == 3 && value.bytes().all(|b| b.is_ascii_uppercase())
}

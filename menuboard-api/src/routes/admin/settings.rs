/// Appearance settings and table QR codes
///
/// QR codes are returned as the URLs to encode; clients render the images.

use super::{check_url, clean, clean_nullable, nullable};
use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
};
use axum::{extract::State, Json};
use menuboard_shared::{
    auth::{
        authorization::{require_permission, Permission},
        middleware::AuthContext,
    },
    models::settings::{is_currency_code, is_hex_color, MenuLayout, Settings, UpdateSettings},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MAX_TABLES: i32 = 500;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 255, message = "Restaurant name must be 1-255 characters"))]
    pub restaurant_name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub logo_url: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub cover_image_url: Option<Option<String>>,

    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Font family must be 1-100 characters"))]
    pub font_family: Option<String>,

    pub layout: Option<MenuLayout>,
    pub currency: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub opening_hours: Option<Option<String>>,

    #[validate(range(min = 0, max = 500, message = "Table count must be between 0 and 500"))]
    pub table_count: Option<i32>,

    pub ordering_enabled: Option<bool>,
    pub waiter_call_enabled: Option<bool>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TableQrCode {
    pub table_number: i32,
    pub url: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct QrCodes {
    /// Menu without a table number (e.g. for the door or flyers)
    pub menu_url: String,
    pub tables: Vec<TableQrCode>,
}

/// Builds `{base}/{slug}` and `{base}/{slug}?table={n}` for tables 1..=count
pub fn build_qr_codes(base_url: &str, slug: &str, table_count: i32) -> QrCodes {
    let menu_url = format!("{}/{}", base_url.trim_end_matches('/'), slug);
    let tables = (1..=table_count.clamp(0, MAX_TABLES))
        .map(|n| TableQrCode {
            table_number: n,
            url: format!("{menu_url}?table={n}"),
        })
        .collect();

    QrCodes { menu_url, tables }
}

fn check_color(field: &str, value: Option<&str>) -> ApiResult<()> {
    match value {
        Some(color) if !is_hex_color(color) => {
            Err(ApiError::invalid_field(field, "Use the #RRGGBB format"))
        }
        _ => Ok(()),
    }
}

/// Checks the fields the validator derive can't express
fn check_update(req: &UpdateSettingsRequest) -> ApiResult<Option<String>> {
    check_color("primary_color", req.primary_color.as_deref())?;
    check_color("secondary_color", req.secondary_color.as_deref())?;

    for (field, value) in [("logo_url", &req.logo_url), ("cover_image_url", &req.cover_image_url)] {
        check_url(field, value.as_ref().and_then(|v| v.as_deref()))?;
    }

    let currency = req.currency.as_deref().map(|c| c.trim().to_ascii_uppercase());
    if let Some(code) = &currency {
        if !is_currency_code(code) {
            return Err(ApiError::invalid_field("currency", "Use a 3-letter ISO 4217 code"));
        }
    }

    Ok(currency)
}

pub async fn get(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<Settings>> {
    let tenant_id = require_permission(&auth, Permission::View)?;

    let settings = Settings::find(&state.db, tenant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Settings"))?;

    Ok(Json(settings))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<Settings>> {
    validate_request(&req)?;
    let currency = check_update(&req)?;

    let tenant_id = require_permission(&auth, Permission::ManageMenu)?;
    let (tenant, _) = state.gate.require_service(tenant_id).await?;

    let settings = Settings::upsert(
        &state.db,
        tenant_id,
        &tenant.name,
        UpdateSettings {
            restaurant_name: req.restaurant_name.map(|n| n.trim().to_string()),
            description: clean_nullable(req.description),
            logo_url: clean_nullable(req.logo_url),
            cover_image_url: clean_nullable(req.cover_image_url),
            primary_color: req.primary_color,
            secondary_color: req.secondary_color,
            font_family: clean(req.font_family),
            layout: req.layout,
            currency,
            phone: clean_nullable(req.phone),
            address: clean_nullable(req.address),
            opening_hours: clean_nullable(req.opening_hours),
            table_count: req.table_count,
            ordering_enabled: req.ordering_enabled,
            waiter_call_enabled: req.waiter_call_enabled,
        },
    )
    .await?;

    tracing::info!(tenant_id = %tenant_id, by = %auth.user_id, "Settings updated");

    Ok(Json(settings))
}

pub async fn qr_codes(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<QrCodes>> {
    let tenant_id = require_permission(&auth, Permission::ManageMenu)?;
    let (tenant, _) = state.gate.require_service(tenant_id).await?;

    let table_count = Settings::find(&state.db, tenant_id)
        .await?
        .map(|s| s.table_count)
        .unwrap_or(0);

    Ok(Json(build_qr_codes(
        &state.config.api.public_menu_base_url,
        &tenant.slug,
        table_count,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_qr_codes() {
        let codes = build_qr_codes("https://menu.example.com/", "pizza-roma", 3);

        assert_eq!(codes.menu_url, "https://menu.example.com/pizza-roma");
        assert_eq!(codes.tables.len(), 3);
        assert_eq!(
            codes.tables[2],
            TableQrCode {
                table_number: 3,
                url: "https://menu.example.com/pizza-roma?table=3".to_string(),
            }
        );
    }

    #[test]
    fn test_build_qr_codes_without_tables() {
        let codes = build_qr_codes("https://menu.example.com", "pizza-roma", 0);
        assert!(codes.tables.is_empty());
    }

    #[test]
    fn test_check_update() {
        let ok = UpdateSettingsRequest {
            primary_color: Some("#1A2B3C".to_string()),
            currency: Some("eur".to_string()),
            ..Default::default()
        };
        assert_eq!(check_update(&ok).unwrap(), Some("EUR".to_string()));

        let bad_color = UpdateSettingsRequest {
            secondary_color: Some("red".to_string()),
            ..Default::default()
        };
        assert!(check_update(&bad_color).is_err());

        let bad_currency = UpdateSettingsRequest {
            currency: Some("EURO".to_string()),
            ..Default::default()
        };
        assert!(check_update(&bad_currency).is_err());

        let bad_logo = UpdateSettingsRequest {
            logo_url: Some(Some("ftp://logo.png".to_string())),
            ..Default::default()
        };
        assert!(check_update(&bad_logo).is_err());
    }

    #[test]
    fn test_table_count_validation() {
        let req = UpdateSettingsRequest {
            table_count: Some(MAX_TABLES + 1),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}

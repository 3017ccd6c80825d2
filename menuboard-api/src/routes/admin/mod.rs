/// Restaurant back office
///
/// Every handler resolves the caller's tenant through
/// [`require_permission`](menuboard_shared::auth::authorization::require_permission):
///
/// | Area                     | Permission      | Gated |
/// |--------------------------|-----------------|-------|
/// | reads, feeds             | `View`          | no    |
/// | order/waiter status      | `HandleService` | no    |
/// | catalog, settings, QR    | `ManageMenu`    | yes   |
/// | users                    | `ManageUsers`   | no    |
/// | billing                  | `ManageBilling` | no    |
///
/// Gated writes fail with 402 once the trial or subscription is over, while
/// reads and billing stay reachable so the owner can renew.

pub mod billing;
pub mod categories;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;
pub mod waiter_calls;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use menuboard_shared::auth::{
    authorization::{require_permission, Permission},
    middleware::AuthContext,
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Tenant of a caller allowed to edit the menu while service is allowed
pub(crate) async fn menu_editor(state: &AppState, auth: &AuthContext) -> ApiResult<Uuid> {
    let tenant_id = require_permission(auth, Permission::ManageMenu)?;
    state.gate.require_service(tenant_id).await?;
    Ok(tenant_id)
}

/// Distinguishes an absent field (None) from an explicit null (Some(None))
///
/// Use together with `#[serde(default)]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims optional text; blank becomes None
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Like [`clean`] for a nullable update field; a blank value clears it
pub(crate) fn clean_nullable(value: Option<Option<String>>) -> Option<Option<String>> {
    value.map(clean)
}

/// Checks that an image or link field holds an http(s) URL
pub(crate) fn check_url(field: &str, value: Option<&str>) -> ApiResult<()> {
    match value {
        Some(url)
            if url.len() > 2048
                || !(url.starts_with("https://") || url.starts_with("http://")) =>
        {
            Err(ApiError::invalid_field(field, "Must be an http(s) URL"))
        }
        _ => Ok(()),
    }
}

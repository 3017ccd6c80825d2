/// Payment provider webhook
///
/// `POST /v1/billing/activate` receives the outcome of a checkout started by
/// `POST /v1/admin/billing/checkout`. The raw body must carry a valid
/// `X-Signature` (hex HMAC-SHA256 with the shared webhook secret) before it
/// is parsed.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::{DateTime, Utc};
use menuboard_shared::{
    auth::signature::{self, SignatureError},
    models::payment_transaction::{PaymentOutcome, PaymentStatus, PaymentTransaction},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Deserialize)]
pub struct ActivationRequest {
    pub provider_reference: String,
    pub status: ProviderStatus,
}

#[derive(Debug, Serialize)]
pub struct ActivationResponse {
    pub provider_reference: String,
    pub transaction_status: PaymentStatus,

    /// activated | already_activated | failed | ignored
    pub outcome: &'static str,

    pub tenant_id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_until: Option<DateTime<Utc>>,
}

pub async fn activate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<ActivationResponse>> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::Missing)?;

    if let Err(e) = signature::verify(&state.config.billing.webhook_secret, &body, provided) {
        tracing::warn!(error = %e, "Rejected billing webhook");
        return Err(e.into());
    }

    let req: ActivationRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    let outcome = PaymentTransaction::apply_provider_result(
        &state.db,
        &req.provider_reference,
        req.status == ProviderStatus::Succeeded,
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Transaction"))?;

    let response = match outcome {
        PaymentOutcome::Activated {
            transaction,
            tenant,
        } => {
            tracing::info!(
                tenant_id = %tenant.id,
                months = transaction.months,
                premium_until = ?tenant.premium_until,
                "Premium activated"
            );
            respond(transaction, "activated", tenant.premium_until)
        }
        PaymentOutcome::AlreadyActivated { transaction } => {
            tracing::debug!(reference = %transaction.provider_reference, "Duplicate activation");
            respond(transaction, "already_activated", None)
        }
        PaymentOutcome::Failed { transaction } => {
            tracing::info!(tenant_id = %transaction.tenant_id, "Payment failed");
            respond(transaction, "failed", None)
        }
        PaymentOutcome::Ignored { transaction } => {
            tracing::warn!(
                reference = %transaction.provider_reference,
                "Failure reported for a succeeded payment, ignoring"
            );
            respond(transaction, "ignored", None)
        }
    };

    Ok(Json(response))
}

fn respond(
    transaction: PaymentTransaction,
    outcome: &'static str,
    premium_until: Option<DateTime<Utc>>,
) -> ActivationResponse {
    ActivationResponse {
        provider_reference: transaction.provider_reference,
        transaction_status: transaction.status,
        outcome,
        tenant_id: transaction.tenant_id,
        premium_until,
    }
}

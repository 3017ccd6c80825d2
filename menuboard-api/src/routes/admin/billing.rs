/// Subscription billing for restaurant owners
///
/// Reachable in every access state, so an expired restaurant can renew.

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use menuboard_shared::{
    access::AccessStatus,
    auth::{
        authorization::{require_permission, Permission},
        middleware::AuthContext,
    },
    cart::round_money,
    models::payment_transaction::{CreatePaymentTransaction, PaymentTransaction},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct BillingOverview {
    pub access: AccessStatus,
    pub monthly_price: Decimal,
    pub currency: String,
    pub transactions: Vec<PaymentTransaction>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(range(min = 1, max = 12, message = "Months must be between 1 and 12"))]
    pub months: i32,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub transaction_id: Uuid,

    /// Token to hand to the payment provider
    pub provider_reference: String,

    pub amount: Decimal,
    pub currency: String,
    pub months: i32,
}

pub fn checkout_amount(monthly_price: Decimal, months: i32) -> Decimal {
    round_money(monthly_price * Decimal::from(months))
}

pub async fn overview(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<BillingOverview>> {
    let tenant_id = require_permission(&auth, Permission::ManageBilling)?;
    let (_, access) = state.gate.check(tenant_id).await?;

    let transactions = PaymentTransaction::list_by_tenant(&state.db, tenant_id).await?;

    Ok(Json(BillingOverview {
        access,
        monthly_price: state.config.billing.monthly_price,
        currency: state.config.billing.currency.clone(),
        transactions,
    }))
}

pub async fn checkout(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    validate_request(&req)?;
    let tenant_id = require_permission(&auth, Permission::ManageBilling)?;

    let (tenant, access) = state.gate.check(tenant_id).await?;
    if access == AccessStatus::Suspended {
        return Err(ApiError::Forbidden(
            "This restaurant account is suspended".to_string(),
        ));
    }

    let billing = &state.config.billing;
    let transaction = PaymentTransaction::create(
        &state.db,
        tenant.id,
        CreatePaymentTransaction {
            amount: checkout_amount(billing.monthly_price, req.months),
            currency: billing.currency.clone(),
            months: req.months,
        },
    )
    .await?;

    tracing::info!(
        tenant_id = %tenant.id,
        transaction_id = %transaction.id,
        months = transaction.months,
        amount = %transaction.amount,
        "Checkout started"
    );

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            transaction_id: transaction.id,
            provider_reference: transaction.provider_reference,
            amount: transaction.amount,
            currency: transaction.currency,
            months: transaction.months,
        }),
    ))
}

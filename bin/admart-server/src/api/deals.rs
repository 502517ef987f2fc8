use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::success;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

/// GET /deals/:id
pub async fn get_deal(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let deal = state.db.deals().get(deal_id).await?;
    Ok(success(deal))
}

#[derive(Debug, Deserialize)]
pub struct PaymentWalletRequest {
    /// The address the advertiser will pay from; the confirmation job
    /// matches inbound transfers against it.
    pub user_wallet: String,
}

/// POST /deals/:id/get-payment-wallet — mint (or return) the deal's
/// escrow wallet and pending payment.
pub async fn get_payment_wallet(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
    Json(request): Json<PaymentWalletRequest>,
) -> ApiResult<Json<Value>> {
    if request.user_wallet.trim().is_empty() {
        return Err(ApiError::Validation {
            message: "user_wallet must not be empty".to_string(),
        });
    }

    let payment = state
        .manager
        .request_payment_wallet(deal_id, &request.user_wallet)
        .await?;
    Ok(success(payment))
}

/// POST /deals/:id/submit-transaction — the payer claims to have
/// funded the escrow; start the confirmation poll.
pub async fn submit_transaction(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let payment = state.manager.submit_transaction(deal_id).await?;
    state.jobs.add_payment_confirmation(deal_id, payment.id);
    Ok(success(payment))
}

/// GET /deals/:id/get-payment — the latest payment row for the deal.
pub async fn get_payment(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let payments = state.db.payments().list_for_deal(deal_id).await?;
    let latest = payments.into_iter().next().ok_or(ApiError::NotFound {
        entity: "payment",
    })?;
    Ok(success(latest))
}

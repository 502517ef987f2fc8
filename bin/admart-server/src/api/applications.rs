use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::success;
use crate::error::ApiResult;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationDecision {
    Accepted,
    Rejected,
}

#[derive(Debug, Deserialize)]
pub struct ReviewApplicationRequest {
    pub status: ApplicationDecision,
}

/// POST /ads/:id/applications/:application_id
///
/// The advertiser's verdict on a channel owner's application.
/// Acceptance creates the deal; the response carries it.
pub async fn review_application(
    State(state): State<AppState>,
    Path((ad_request_id, application_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ReviewApplicationRequest>,
) -> ApiResult<Json<Value>> {
    match request.status {
        ApplicationDecision::Accepted => {
            let deal = state
                .manager
                .accept_application(ad_request_id, application_id)
                .await?;
            Ok(success(json!({ "deal": deal })))
        }
        ApplicationDecision::Rejected => {
            state
                .manager
                .reject_application(ad_request_id, application_id)
                .await?;
            Ok(success(json!({
                "application_id": application_id,
                "status": "rejected",
            })))
        }
    }
}

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::success;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use admart_models::CreativeStatus;

#[derive(Debug, Deserialize)]
pub struct SubmitCreativeRequest {
    pub content: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// POST /deals/:id/creatives — a new draft version for the deal.
pub async fn submit_creative(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
    Json(request): Json<SubmitCreativeRequest>,
) -> ApiResult<Json<Value>> {
    if request.content.trim().is_empty() {
        return Err(ApiError::Validation {
            message: "content must not be empty".to_string(),
        });
    }

    let deal = state.db.deals().get(deal_id).await?;
    if deal.is_terminal() {
        return Err(ApiError::Conflict {
            message: "deal is already settled".to_string(),
        });
    }

    let creative = state
        .db
        .creatives()
        .create(deal_id, &request.content, &request.media_urls)
        .await?;

    Ok(success(creative))
}

/// GET /deals/:id/creatives — all versions, newest first.
pub async fn list_creatives(
    State(state): State<AppState>,
    Path(deal_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    // 404 for an unknown deal rather than an empty list.
    state.db.deals().get(deal_id).await?;
    let creatives = state.db.creatives().list_for_deal(deal_id).await?;
    Ok(success(creatives))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCreativeRequest {
    pub content: Option<String>,
    pub media_urls: Option<Vec<String>>,
    pub status: Option<CreativeStatus>,
    pub review_note: Option<String>,
}

/// PATCH /creatives/:id
///
/// Without `status`: content/media edits, drafts only. With `status`:
/// the review flow — `submitted` sends the draft out (deal →
/// creative_submitted), `approved` opens the payment stage,
/// `revision_requested` records the note and leaves the deal where it
/// is so a new version can be drafted.
pub async fn update_creative(
    State(state): State<AppState>,
    Path(creative_id): Path<Uuid>,
    Json(request): Json<UpdateCreativeRequest>,
) -> ApiResult<Json<Value>> {
    let creatives = state.db.creatives();
    let creative = creatives.get(creative_id).await?;

    let Some(status) = request.status else {
        let updated = creatives
            .update_draft(
                creative_id,
                request.content.as_deref(),
                request.media_urls.as_deref(),
            )
            .await?;
        return Ok(success(updated));
    };

    match status {
        CreativeStatus::Submitted => {
            if !creative.is_editable() {
                return Err(ApiError::Conflict {
                    message: format!("creative is {:?}, only drafts can be submitted", creative.status),
                });
            }
            let updated = creatives.mark_submitted(creative_id).await?;
            state
                .db
                .deals()
                .transition_creative_submitted(creative.deal_id)
                .await?;
            Ok(success(updated))
        }
        CreativeStatus::Approved => {
            if !creative.is_pending_review() {
                return Err(ApiError::Conflict {
                    message: format!("creative is {:?}, not awaiting review", creative.status),
                });
            }
            let updated = creatives
                .set_review_verdict(creative_id, CreativeStatus::Approved, None)
                .await?;
            state
                .db
                .deals()
                .transition_creative_approved(creative.deal_id)
                .await?;
            Ok(success(updated))
        }
        CreativeStatus::RevisionRequested => {
            if !creative.is_pending_review() {
                return Err(ApiError::Conflict {
                    message: format!("creative is {:?}, not awaiting review", creative.status),
                });
            }
            let updated = creatives
                .set_review_verdict(
                    creative_id,
                    CreativeStatus::RevisionRequested,
                    request.review_note.as_deref(),
                )
                .await?;
            Ok(success(updated))
        }
        CreativeStatus::Draft => Err(ApiError::Validation {
            message: "a creative cannot be moved back to draft".to_string(),
        }),
    }
}

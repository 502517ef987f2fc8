use crate::CreativeStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A versioned content draft belonging to a deal.
///
/// Versions start at 1 and are strictly increasing per deal; the
/// highest version is the "current" creative. The channel owner moves
/// a draft to `Submitted`, the advertiser moves it to `Approved` or
/// `RevisionRequested`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creative {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub version: i32,

    pub content: String,
    pub media_urls: Vec<String>,

    pub status: CreativeStatus,
    pub review_note: Option<String>,

    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Creative {
    /// A draft the channel owner may still edit.
    pub fn is_editable(&self) -> bool {
        self.status == CreativeStatus::Draft
    }

    /// Waiting on the advertiser's verdict.
    pub fn is_pending_review(&self) -> bool {
        self.status == CreativeStatus::Submitted
    }
}

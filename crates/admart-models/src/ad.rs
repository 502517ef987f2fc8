use crate::{AdFormat, AdRequestStatus, ApplicationStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An advertiser's open request for a placement. The deal copies its
/// price, format and deadline when an application is accepted, and
/// settlement writes the terminal outcome back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdRequest {
    pub id: Uuid,
    pub title: String,
    pub budget: Decimal,
    pub ad_format: AdFormat,
    pub deadline: DateTime<Utc>,
    #[serde(with = "crate::wire::string_i64")]
    pub advertiser_tg_id: i64,
    pub status: AdRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A channel owner's application to fill an ad request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdApplication {
    pub id: Uuid,
    pub ad_request_id: Uuid,
    pub channel_id: Uuid,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// The slice of a Telegram channel the deal lifecycle needs: where to
/// post and where to pay out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: Uuid,
    #[serde(with = "crate::wire::string_i64")]
    pub tg_id: i64,
    pub title: Option<String>,
    pub tg_link: String,
    /// Channel owner's registered payout address, if any.
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

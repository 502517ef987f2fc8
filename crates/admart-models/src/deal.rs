use crate::{AdFormat, DealStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One accepted advertiser-channel arrangement for a single placement.
///
/// A deal is created when an advertiser accepts an application and is
/// never deleted; `Completed` and `Cancelled` are final. All status
/// changes go through the transition methods in
/// [`crate::deal_transitions`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: Uuid,
    pub application_id: Uuid,
    pub channel_id: Uuid,
    #[serde(with = "crate::wire::string_i64")]
    pub advertiser_tg_id: i64,

    pub ad_format: AdFormat,
    /// Agreed price in whole TON, decimal precision. Converted to
    /// nanoton only at the transfer call, never stored in that unit.
    pub agreed_price: Decimal,

    pub status: DealStatus,

    pub scheduled_post_at: DateTime<Utc>,
    pub min_post_duration_hours: i32,

    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,

    /// Telegram message id of the published post. Set once the
    /// publication job succeeds.
    #[serde(with = "crate::wire::string_i64_opt")]
    pub tg_post_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, DealStatus::Completed | DealStatus::Cancelled)
    }
}

/// The two ways a posted deal can close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// Post survived the minimum duration: pay the channel owner.
    Completed,
    /// Post disappeared early: refund the advertiser.
    Cancelled,
}

use crate::{PaymentKind, PaymentStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One escrow transaction record.
///
/// The `EscrowHold` payment for a deal is unique on `deal_id`;
/// settlement adds a `ReleaseToOwner` or `Refund` row referencing the
/// same escrow wallet. Status only moves forward and `tx_hash` is
/// written exactly once, at confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub escrow_wallet_id: Uuid,

    pub kind: PaymentKind,
    pub status: PaymentStatus,

    /// Amount in whole TON, decimal precision.
    pub amount_ton: Decimal,

    pub from_address: String,
    pub to_address: String,

    pub tx_hash: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

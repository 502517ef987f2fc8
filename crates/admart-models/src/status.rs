use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "deal_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    AwaitingCreative,  // Deal created, waiting for the channel owner's draft
    CreativeSubmitted, // Draft sent to the advertiser for review
    AwaitingPayment,   // Creative approved, waiting for escrow funding
    Scheduled,         // Payment confirmed, publish job queued
    Posted,            // Content is live on the channel
    Completed,         // Post survived the minimum duration, owner paid out
    Cancelled,         // Post removed early, advertiser refunded
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "creative_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CreativeStatus {
    Draft,
    Submitted,
    Approved,
    RevisionRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "payment_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,    // Wallet issued, nothing seen on chain
    Confirming, // Payer claims to have sent, polling the chain
    Confirmed,  // Inbound transfer matched, tx hash recorded
    Failed,
}

/// What a payment row moves and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "payment_kind", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    EscrowHold,
    ReleaseToOwner,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "ad_request_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AdRequestStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "ad_application_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "ad_format", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AdFormat {
    Post,
    Story,
    Forward,
}

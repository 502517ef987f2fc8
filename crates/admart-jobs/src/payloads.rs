//! Job payloads for the deal lifecycle.
//!
//! Handlers are pure functions of their payload: everything they need
//! travels in these structs, never in process state captured at
//! enqueue time.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Poll the chain for the payer's escrow deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmationJob {
    pub deal_id: Uuid,
    pub payment_id: Uuid,
}

/// Publish the approved creative at the deal's scheduled time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPostingJob {
    pub deal_id: Uuid,
}

/// Verify the post is still live after the holding period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostAlivenessJob {
    pub deal_id: Uuid,
    pub post_id: i64,
}

/// Queue tuning for the three deal job kinds.
///
/// Confirmation polls the chain once a minute for up to 24 hours.
/// Publication and aliveness lean on the single delegated messaging
/// session, so their worker counts shrink as their urgency drops.
pub struct QueueConfig;

impl QueueConfig {
    pub const BLOCKCHAIN_CHECK_INTERVAL: Duration = Duration::from_secs(60);
    pub const BLOCKCHAIN_MAX_ATTEMPTS: u32 = 1440;
    pub const CONFIRMATION_CONCURRENCY: usize = 5;

    pub const PUBLISH_MAX_ATTEMPTS: u32 = 3;
    pub const PUBLISH_RETRY_DELAY: Duration = Duration::from_secs(60);
    pub const PUBLISH_CONCURRENCY: usize = 3;

    pub const POST_ALIVENESS_CHECK_DELAY: Duration = Duration::from_secs(86_400);
    pub const ALIVENESS_MAX_ATTEMPTS: u32 = 3;
    pub const ALIVENESS_RETRY_DELAY: Duration = Duration::from_secs(60);
    pub const ALIVENESS_CONCURRENCY: usize = 2;
}

use crate::Result;
use admart_models::EscrowWallet;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of scanning an escrow address for the payer's deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCheck {
    pub received: bool,
    pub tx_hash: Option<String>,
}

impl TransferCheck {
    pub fn not_received() -> Self {
        Self {
            received: false,
            tx_hash: None,
        }
    }
}

/// Outcome of an outbound transfer attempt.
///
/// Settlement runs through this instead of `Result` on purpose: a
/// broadcast failure must reach the caller as data, not unwind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub success: bool,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
}

impl TransferOutcome {
    pub fn sent(tx_hash: String) -> Self {
        Self {
            success: true,
            tx_hash: Some(tx_hash),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            tx_hash: None,
            error: Some(error.into()),
        }
    }
}

/// A message fetched back from a channel by the aliveness check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedMessage {
    pub id: i64,
    pub date: Option<DateTime<Utc>>,
}

// implementors of this trait should be stateless
#[async_trait]
pub trait BlockchainGateway: Send + Sync {
    /// Generate a fresh custodial wallet. No network call.
    fn create_escrow_wallet(&self) -> Result<EscrowWallet>;

    /// Look for an inbound transfer to `to_address` from
    /// `from_address` of at least `min_amount` TON in the address's
    /// recent history. An empty or partial window yields
    /// `received: false`, never an error, so the polling job stays
    /// retryable.
    async fn check_incoming_transfer(
        &self,
        to_address: &str,
        from_address: &str,
        min_amount: Decimal,
    ) -> Result<TransferCheck>;

    /// Send `amount` TON from the escrow wallet to `to_address`.
    /// Failures are folded into the outcome, never raised.
    async fn transfer(
        &self,
        wallet: &EscrowWallet,
        to_address: &str,
        amount: Decimal,
    ) -> TransferOutcome;
}

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Post `content` to a channel via the shared delegated session,
    /// returning the new message id. Absence of an active session is
    /// a hard failure.
    async fn send_message(&self, channel_tg_id: i64, content: &str) -> Result<i64>;

    /// Fetch a message by id, purely to test existence. A deleted
    /// message is `Ok(None)`.
    async fn fetch_message(&self, channel_tg_id: i64, message_id: i64)
        -> Result<Option<PostedMessage>>;
}

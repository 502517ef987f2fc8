use crate::error::{self, Error, Result};
use crate::traits::{BlockchainGateway, TransferCheck, TransferOutcome};
use admart_models::EscrowWallet;
use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use snafu::ResultExt;
use tracing::{debug, warn};
use uuid::Uuid;

const NANOTON_PER_TON: u64 = 1_000_000_000;

/// How far back we scan the escrow address when polling for the
/// payer's deposit. The confirmation job re-runs every minute, so a
/// short window is enough.
const TX_SCAN_LIMIT: u32 = 20;

/// Convert a decimal TON amount to nanoton. This is the only place
/// amounts leave human units.
pub fn to_nano(amount: Decimal) -> Result<u128> {
    if amount.is_sign_negative() {
        return Err(Error::AmountOutOfRange { amount });
    }
    (amount * Decimal::from(NANOTON_PER_TON))
        .trunc()
        .to_u128()
        .ok_or(Error::AmountOutOfRange { amount })
}

/// TON gateway over the toncenter JSON-RPC v2 HTTP API.
pub struct TonGateway {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

#[derive(Deserialize)]
struct RpcEnvelope {
    ok: bool,
    result: Option<serde_json::Value>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct RawTransaction {
    transaction_id: TransactionId,
    in_msg: Option<RawMessage>,
}

#[derive(Deserialize)]
struct TransactionId {
    hash: String,
}

#[derive(Deserialize)]
struct RawMessage {
    source: Option<String>,
    /// Value in nanoton, stringly typed on the wire.
    value: Option<String>,
}

/// The signed payload the wallet contract accepts as an external
/// message. Serialized, signed, and shipped as a base64 cell.
#[derive(Serialize)]
struct TransferOrder<'a> {
    to: &'a str,
    amount_nano: u128,
    valid_until: i64,
    comment: &'a str,
}

impl TonGateway {
    pub fn new(endpoint: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    async fn rpc(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key.expose_secret());
        }

        let envelope: RpcEnvelope = request
            .send()
            .await
            .context(error::TransportSnafu)?
            .json()
            .await
            .context(error::TransportSnafu)?;

        if !envelope.ok {
            return Err(Error::Rpc {
                message: envelope
                    .error
                    .unwrap_or_else(|| format!("{method} returned ok=false")),
            });
        }
        envelope.result.ok_or_else(|| Error::Rpc {
            message: format!("{method} returned no result"),
        })
    }

    fn signing_key(wallet: &EscrowWallet) -> Result<SigningKey> {
        let bytes = hex::decode(wallet.private_key()).map_err(|e| Error::KeyMaterial {
            message: format!("private key is not valid hex: {e}"),
        })?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| Error::KeyMaterial {
            message: "private key must be 32 bytes".to_string(),
        })?;
        Ok(SigningKey::from_bytes(&bytes))
    }
}

/// Raw-form address for workchain 0: the account id is the hash of
/// the wallet's initial state, which for the standard wallet contract
/// is determined by the public key.
fn derive_address(public_key: &VerifyingKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"admart-wallet-v1");
    hasher.update(public_key.to_bytes());
    format!("0:{}", hex::encode(hasher.finalize()))
}

#[async_trait]
impl BlockchainGateway for TonGateway {
    fn create_escrow_wallet(&self) -> Result<EscrowWallet> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        let address = derive_address(&verifying_key);

        debug!(%address, "created escrow wallet");

        Ok(EscrowWallet::new(
            Uuid::new_v4(),
            address,
            hex::encode(verifying_key.to_bytes()),
            hex::encode(signing_key.to_bytes()),
            Utc::now(),
        ))
    }

    async fn check_incoming_transfer(
        &self,
        to_address: &str,
        from_address: &str,
        min_amount: Decimal,
    ) -> Result<TransferCheck> {
        let min_nano = to_nano(min_amount)?;

        let result = self
            .rpc(
                "getTransactions",
                json!({ "address": to_address, "limit": TX_SCAN_LIMIT }),
            )
            .await?;

        // A fresh address has no history yet; that is a normal "not
        // paid" answer, not an error.
        let transactions: Vec<RawTransaction> = match serde_json::from_value(result) {
            Ok(txs) => txs,
            Err(e) => {
                warn!("unparseable transaction window for {to_address}: {e}");
                return Ok(TransferCheck::not_received());
            }
        };

        for tx in transactions {
            let Some(in_msg) = tx.in_msg else { continue };
            let Some(source) = in_msg.source else { continue };
            if source != from_address {
                continue;
            }
            let value: u128 = in_msg
                .value
                .as_deref()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            if value >= min_nano {
                return Ok(TransferCheck {
                    received: true,
                    tx_hash: Some(tx.transaction_id.hash),
                });
            }
        }

        Ok(TransferCheck::not_received())
    }

    async fn transfer(
        &self,
        wallet: &EscrowWallet,
        to_address: &str,
        amount: Decimal,
    ) -> TransferOutcome {
        let amount_nano = match to_nano(amount) {
            Ok(v) => v,
            Err(e) => return TransferOutcome::failed(e.to_string()),
        };
        let signing_key = match Self::signing_key(wallet) {
            Ok(k) => k,
            Err(e) => return TransferOutcome::failed(e.to_string()),
        };

        let order = TransferOrder {
            to: to_address,
            amount_nano,
            valid_until: (Utc::now() + chrono::Duration::minutes(5)).timestamp(),
            comment: "Ad payment release",
        };
        let order_bytes = match serde_json::to_vec(&order) {
            Ok(b) => b,
            Err(e) => return TransferOutcome::failed(format!("order serialization: {e}")),
        };
        let signature = signing_key.sign(&order_bytes);

        // External message: public key + signature + signed order.
        let mut message = Vec::with_capacity(96 + order_bytes.len());
        message.extend_from_slice(&signing_key.verifying_key().to_bytes());
        message.extend_from_slice(&signature.to_bytes());
        message.extend_from_slice(&order_bytes);
        let boc = base64::engine::general_purpose::STANDARD.encode(&message);

        match self.rpc("sendBocReturnHash", json!({ "boc": boc })).await {
            Ok(result) => {
                let tx_hash = result
                    .get("hash")
                    .and_then(|h| h.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| hex::encode(Sha256::digest(&message)));
                debug!(%to_address, %amount, %tx_hash, "broadcast transfer");
                TransferOutcome::sent(tx_hash)
            }
            Err(e) => {
                warn!("transfer broadcast failed: {e}");
                TransferOutcome::failed(e.to_string())
            }
        }
    }
}

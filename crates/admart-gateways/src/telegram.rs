use crate::error::{self, Error, Result};
use crate::traits::{MessagingGateway, PostedMessage};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use snafu::ResultExt;
use tracing::{debug, info};

/// Messaging gateway over the session-bridge HTTP API.
///
/// The bridge holds the single delegated Telegram account used to
/// post and verify on behalf of the platform; this client is shared
/// by every publication and aliveness job, and correctness under
/// concurrency relies on the low worker counts for those job kinds.
pub struct DelegatedSession {
    http: reqwest::Client,
    base_url: String,
    session_token: SecretString,
}

#[derive(Deserialize)]
struct BridgeEnvelope<T> {
    ok: bool,
    result: Option<T>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct BridgeMessage {
    id: i64,
    date: Option<chrono::DateTime<chrono::Utc>>,
}

impl DelegatedSession {
    pub fn new(base_url: impl Into<String>, session_token: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            session_token,
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}/session/{}", self.base_url, method);

        let envelope: BridgeEnvelope<T> = self
            .http
            .post(&url)
            .bearer_auth(self.session_token.expose_secret())
            .json(&params)
            .send()
            .await
            .context(error::TransportSnafu)?
            .json()
            .await
            .context(error::TransportSnafu)?;

        if !envelope.ok {
            let message = envelope.error.unwrap_or_default();
            // The bridge reports a logged-out or disabled account
            // distinctly; everything else is a plain RPC failure.
            if message == "SESSION_INACTIVE" {
                return Err(Error::SessionInactive);
            }
            return Err(Error::Rpc {
                message: format!("{method}: {message}"),
            });
        }
        envelope.result.ok_or_else(|| Error::Rpc {
            message: format!("{method} returned no result"),
        })
    }
}

#[async_trait]
impl MessagingGateway for DelegatedSession {
    async fn send_message(&self, channel_tg_id: i64, content: &str) -> Result<i64> {
        let message: BridgeMessage = self
            .call(
                "sendMessage",
                json!({ "chat_id": channel_tg_id, "text": content }),
            )
            .await?;

        info!(channel_tg_id, message_id = message.id, "posted to channel");
        Ok(message.id)
    }

    async fn fetch_message(
        &self,
        channel_tg_id: i64,
        message_id: i64,
    ) -> Result<Option<PostedMessage>> {
        // The bridge returns null entries for ids that no longer
        // resolve, which is exactly the aliveness signal.
        let messages: Vec<Option<BridgeMessage>> = self
            .call(
                "getMessages",
                json!({ "chat_id": channel_tg_id, "message_ids": [message_id] }),
            )
            .await?;

        let found = messages.into_iter().flatten().next().map(|m| PostedMessage {
            id: m.id,
            date: m.date,
        });

        debug!(channel_tg_id, message_id, alive = found.is_some(), "aliveness probe");
        Ok(found)
    }
}

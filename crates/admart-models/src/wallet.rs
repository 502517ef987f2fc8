use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;
use zeroize::Zeroize;

/// A custodial wallet generated per payment, held in trust by the
/// service until settlement. Created once, immutable thereafter.
///
/// The private key is protected against accidental logging: `Debug`
/// redacts it and serialization omits it entirely. Only the
/// payout/refund path may read it, via [`EscrowWallet::private_key`].
pub struct EscrowWallet {
    pub id: Uuid,
    pub address: String,
    pub public_key: String,
    private_key: SecretString,
    pub created_at: DateTime<Utc>,
}

impl EscrowWallet {
    pub fn new(
        id: Uuid,
        address: String,
        public_key: String,
        private_key: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            address,
            public_key,
            private_key: SecretString::from(private_key),
            created_at,
        }
    }

    /// Key material for signing an outbound transfer. Read once per
    /// transfer operation; never cache the result.
    pub fn private_key(&self) -> &str {
        self.private_key.expose_secret()
    }
}

impl fmt::Debug for EscrowWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EscrowWallet")
            .field("id", &self.id)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Serialize for EscrowWallet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("EscrowWallet", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("address", &self.address)?;
        state.serialize_field("public_key", &self.public_key)?;
        state.serialize_field("created_at", &self.created_at)?;
        state.end()
    }
}

impl Drop for EscrowWallet {
    fn drop(&mut self) {
        // SecretString zeroizes itself; clear the address too so no
        // half-wallet lingers in freed memory.
        self.address.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_wallet() -> EscrowWallet {
        EscrowWallet::new(
            Uuid::new_v4(),
            "EQDk2VTvn04SUKJrW7RXahzWC8MJJeH8Xf3sUKvZSg3ufFo4".to_string(),
            "aabbcc".to_string(),
            "very_secret_key_material".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn debug_redacts_private_key() {
        let wallet = test_wallet();
        let debug_str = format!("{wallet:?}");
        assert!(debug_str.contains("EQDk2VTvn04SUKJrW7RXahzWC8MJJeH8Xf3sUKvZSg3ufFo4"));
        assert!(!debug_str.contains("very_secret_key_material"));
    }

    #[test]
    fn serialization_excludes_private_key() {
        let wallet = test_wallet();
        let json = serde_json::to_string(&wallet).unwrap();
        assert!(json.contains("address"));
        assert!(!json.contains("very_secret_key_material"));
        assert!(!json.contains("private_key"));
    }
}

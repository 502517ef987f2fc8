use config::{Config, File};
use secrecy::SecretString;
use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use std::path::Path;

#[derive(Debug, Snafu)]
pub enum SettingsError {
    #[snafu(display("Failed to load config: {source}"))]
    Load { source: config::ConfigError },
}

type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// toncenter JSON-RPC endpoint, e.g. the testnet v2 URL.
    pub toncenter_url: String,
    /// toncenter API key, if the endpoint requires one.
    pub toncenter_api_key: Option<SecretString>,

    /// Base URL of the delegated-session bridge.
    pub session_bridge_url: String,
    /// Token identifying the shared delegated account session.
    pub session_token: SecretString,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let config_path = "admart-server.toml";

        let mut builder = Config::builder();
        if Path::new(config_path).exists() {
            builder = builder.add_source(File::with_name(config_path));
        }
        // Env overrides, e.g. ADMART__TONCENTER_URL (useful for tests).
        builder = builder.add_source(config::Environment::with_prefix("ADMART").separator("__"));

        let settings = builder.build().context(LoadSnafu)?;
        settings.try_deserialize().context(LoadSnafu)
    }
}

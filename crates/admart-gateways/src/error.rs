use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Invalid address format: {address}"))]
    InvalidAddress { address: String },

    #[snafu(display("Wallet key material is invalid: {message}"))]
    KeyMaterial { message: String },

    #[snafu(display("RPC error: {message}"))]
    Rpc { message: String },

    #[snafu(display("RPC transport failed: {source}"))]
    Transport { source: reqwest::Error },

    #[snafu(display("No active delegated session"))]
    SessionInactive,

    #[snafu(display("Amount {amount} cannot be represented in nanoton"))]
    AmountOutOfRange { amount: rust_decimal::Decimal },

    #[snafu(display("Serialization error: {message}"))]
    Serialization { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

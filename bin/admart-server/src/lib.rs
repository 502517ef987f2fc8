use clap::Parser;
use snafu::prelude::*;
use std::net::IpAddr;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod server;
pub mod services;

#[derive(Debug, Parser)]
#[command(name = "admart-server", about = "Telegram ad-marketplace deal engine")]
pub struct AdmartServerArgs {
    /// Address to bind the HTTP server to
    #[arg(long, env = "ADMART_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to bind the HTTP server to
    #[arg(long, env = "ADMART_PORT", default_value_t = 4000)]
    pub port: u16,

    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Log filter, e.g. "info" or "admart_server=debug"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Failed to load settings: {source}"))]
    Settings { source: config::SettingsError },

    #[snafu(display("Failed to bind server: {source}"))]
    ServerBind { source: std::io::Error },

    #[snafu(display("Server failed to start: {source}"))]
    ServerStart { source: std::io::Error },

    #[snafu(display("Failed to initialize database: {source}"))]
    DatabaseInit { source: db::DbError },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

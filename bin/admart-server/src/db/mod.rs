pub mod ad_repo;
pub mod creative_repo;
pub mod deal_repo;
pub mod payment_repo;
pub mod row_mappers;
#[cfg(test)]
pub mod test_support;

pub use ad_repo::AdRepository;
pub use creative_repo::CreativeRepository;
pub use deal_repo::DealRepository;
pub use payment_repo::PaymentRepository;

use admart_models::TransitionError;
use snafu::Snafu;
use sqlx::{
    migrate::Migrator,
    postgres::{PgPool, PgPoolOptions},
};
use std::time::Duration;
use tracing::info;

// Embeds all migration files from ./migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Snafu)]
pub enum DbError {
    #[snafu(display("Database query failed: {source}"))]
    Query { source: sqlx::Error },

    #[snafu(display("Record not found"))]
    NotFound,

    #[snafu(display("Invalid data format: {message}"))]
    InvalidData { message: String },

    #[snafu(display("Database migration failed: {source}"))]
    Migration { source: sqlx::migrate::MigrateError },

    #[snafu(display("Invalid state transition: {source}"))]
    InvalidState { source: TransitionError },
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            _ => DbError::Query { source: err },
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration { source: err }
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect with pooling and run migrations.
    pub async fn connect(database_url: &str) -> DbResult<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await?;

        Self::from_pool(pool).await
    }

    /// Build from an existing pool (useful for tests).
    pub async fn from_pool(pool: PgPool) -> DbResult<Self> {
        MIGRATOR.run(&pool).await?;
        info!("Database initialization complete");
        Ok(Self { pool })
    }

    pub fn deals(&self) -> DealRepository {
        DealRepository::new(self.pool.clone())
    }

    pub fn creatives(&self) -> CreativeRepository {
        CreativeRepository::new(self.pool.clone())
    }

    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new(self.pool.clone())
    }

    pub fn ads(&self) -> AdRepository {
        AdRepository::new(self.pool.clone())
    }
}

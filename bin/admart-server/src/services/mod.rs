pub mod deal_jobs;
pub mod deal_manager;

pub use deal_jobs::{DealJobs, JobTuning};
pub use deal_manager::{ConfirmationCheck, DealManager};

use crate::db::DbError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ServiceError {
    #[snafu(display("Database error: {source}"))]
    Database { source: DbError },

    #[snafu(display("Gateway error: {source}"))]
    Gateway { source: admart_gateways::Error },

    /// The operation cannot run in the current state; retrying without
    /// a state change will not help.
    #[snafu(display("{message}"))]
    Precondition { message: String },
}

impl From<DbError> for ServiceError {
    fn from(source: DbError) -> Self {
        ServiceError::Database { source }
    }
}

impl From<admart_gateways::Error> for ServiceError {
    fn from(source: admart_gateways::Error) -> Self {
        ServiceError::Gateway { source }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub mod error;
pub mod traits;

// Gateway implementations
pub mod telegram;
pub mod ton;

pub use error::{Error, Result};
pub use telegram::DelegatedSession;
pub use ton::TonGateway;
pub use traits::{
    BlockchainGateway, MessagingGateway, PostedMessage, TransferCheck, TransferOutcome,
};

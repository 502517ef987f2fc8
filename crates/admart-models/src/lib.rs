pub mod ad;
pub mod creative;
pub mod deal;
pub mod deal_transitions;
pub mod payment;
pub mod status;
pub mod wallet;
pub mod wire;

pub use ad::*;
pub use creative::*;
pub use deal::*;
pub use deal_transitions::*;
pub use payment::*;
pub use status::*;
pub use wallet::*;

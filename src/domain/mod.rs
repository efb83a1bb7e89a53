pub mod destination;
pub mod withdrawal;

pub use destination::DestinationSpec;
pub use withdrawal::{WithdrawalPricing, WithdrawalState};

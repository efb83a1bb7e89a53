pub mod destinations;
pub mod disconnect;
pub mod oauth_linker;
pub mod reconciliation;
pub mod wallet;
pub mod withdrawals;

pub use destinations::DestinationService;
pub use disconnect::DisconnectService;
pub use oauth_linker::OauthLinker;
pub use reconciliation::ReconciliationService;
pub use wallet::WalletService;
pub use withdrawals::WithdrawalService;

// All service modules
pub mod alerts;
pub mod contracts;
pub mod page;
pub mod transaction_service;
pub mod wallet_service;

// Re-export for convenience
pub use alerts::{AlertKind, AlertTiming};
pub use contracts::{ConfirmationPolicy, ContractRegistry};
pub use page::{PageController, PageView};
pub use transaction_service::{ApproveOutcome, TransactionService};
pub use wallet_service::WalletService;

pub mod provider;

#[cfg(test)]
pub mod mock_provider;

pub use provider::{HttpWalletProvider, WalletProvider};

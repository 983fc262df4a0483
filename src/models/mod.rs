// src/models/mod.rs
pub mod wallet;

pub use wallet::{
    address_to_string,
    parse_address,
    short_address,
    AllowanceInfo,
    ApiResponse,
    ContractAddresses,
    ContractOverview,
    DepositBalances,
    NativeCurrency,
    NetworkDescriptor,
    TokenInfo,
    TransactionStatus,
    WalletInfo,
};

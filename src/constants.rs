/// Application constants

use crate::models::{ContractAddresses, NativeCurrency, NetworkDescriptor};

// Target network (BSC Testnet)
pub const NETWORK: NetworkDescriptor = NetworkDescriptor {
    chain_id: 97,
    chain_name: "BSC Testnet",
    rpc_url: "https://data-seed-prebsc-2-s3.binance.org:8545/",
    fallback_rpc_urls: &[
        "https://data-seed-prebsc-1-s1.binance.org:8545/",
        "https://data-seed-prebsc-2-s1.binance.org:8545/",
        "https://bsc-testnet.public.blastapi.io",
    ],
    explorer_url: "https://testnet.bscscan.com/",
    native_currency: NativeCurrency {
        name: "BNB",
        symbol: "tBNB",
        decimals: 18,
    },
};

// Deployed contracts
pub const CONTRACT_ADDRESSES: ContractAddresses = ContractAddresses {
    payment_contract: "0x9b35D27FC8E4042a5f8d07428b3dA9A62440B906",
    usdt_token: "0x337610d27c682E347C9cD60BD4b3b107C9d34dDd",
    admin: "0x754Cda8029484677F63016b979ed3107056Ef008",
};

// Human-readable ABI fragments
pub const PAYMENT_CONTRACT_ABI: &[&str] = &[
    "function getAdmin() view returns (address)",
    "function getUSDTToken() view returns (address)",
    "function getTotalDepositedBNB() view returns (uint256)",
    "function getUserBNBBalance(address user) view returns (uint256)",
    "function getContractBalance() view returns (uint256)",
    "function depositBNB() payable",
    "function withdrawBNB(uint256 amount)",
    "function chargeUSDT(address user, uint256 amount)",
    "function chargeBNB(address user, uint256 amount)",
    "function updateUSDTToken(address newTokenAddress)",
    "function transferAdmin(address newAdmin)",
    "function recoverToken(address token, uint256 amount)",
];

pub const USDT_TOKEN_ABI: &[&str] = &[
    "function name() view returns (string)",
    "function symbol() view returns (string)",
    "function decimals() view returns (uint8)",
    "function totalSupply() view returns (uint256)",
    "function balanceOf(address account) view returns (uint256)",
    "function allowance(address owner, address spender) view returns (uint256)",
    "function approve(address spender, uint256 amount) returns (bool)",
    "function transfer(address to, uint256 amount) returns (bool)",
    "function transferFrom(address from, address to, uint256 amount) returns (bool)",
];

// Token decimals on the deployed test token; always prefer the queried value.
pub const USDT_DECIMALS_FALLBACK: u8 = 6;

// EIP-1193 / JSON-RPC error codes
pub const CODE_USER_REJECTED: i64 = 4001;
pub const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;
pub const CODE_RPC_INTERNAL: i64 = -32603;
pub const CODE_ACTION_REJECTED: &str = "ACTION_REJECTED";
pub const CODE_USER_REJECTED_NAMED: &str = "USER_REJECTED";

// Failure text longer than this is replaced by a generic message
pub const MAX_RAW_ERROR_MESSAGE_LEN: usize = 100;

// Alert banner timings
pub const ALERT_VISIBLE_MS: u64 = 2000;
pub const ALERT_SLIDE_OUT_MS: u64 = 500;

// Transaction confirmation
pub const TX_POLL_INTERVAL_MS: u64 = 1500;
pub const TX_CONFIRM_TIMEOUT_SECS: u64 = 180;

// Wallet prompts can wait on the user
pub const WALLET_REQUEST_TIMEOUT_SECS: u64 = 120;

// API version
pub const API_VERSION: &str = "v1";

// WebSocket configuration
pub const WS_HEARTBEAT_INTERVAL_SECS: u64 = 30;
pub const WS_CLIENT_TIMEOUT_SECS: u64 = 60;

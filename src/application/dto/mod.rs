//! # Data Transfer Objects
//!
//! Read models returned by use cases.
//!
//! Contract view functions return positional ABI values; the types here
//! give them names and check their shape once, at the boundary.

pub mod contract_views;

pub use contract_views::{
    AccountInfo, DailySpending, GlobalMiningStats, Miner, Outputs, PresaleStats, PurchaseInfo,
    TokenStats, UserMiningStats, WalletInfo,
};

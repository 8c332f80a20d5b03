//! ITcoin: a small proof-of-work ledger whose nodes gossip over HTTP.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod node;
pub mod p2p;
pub mod transaction;
pub mod wallet;

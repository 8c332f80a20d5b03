use serde::{Deserialize, Serialize};

use crate::blockchain::Block;
use crate::p2p::Peer;
use crate::transaction::Transaction;

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub difficulty: usize,
    pub mining_reward: f64,
    pub valid: bool,
    pub chain: &'a [Block],
}

#[derive(Serialize, Deserialize)]
pub struct SyncResponse {
    pub adopted: bool,
    pub length: usize,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct NewTxRequest {
    pub receiver: String,
    pub amount: f64,
    /// Defaults to the node's own identity.
    pub sender: Option<String>,
}

#[derive(Serialize)]
pub struct MempoolResponse<'a> {
    pub size: usize,
    pub transactions: &'a [Transaction],
}

/* ---------- Balance / Network / Wallet ---------- */

#[derive(Serialize, Deserialize)]
pub struct BalanceResponse {
    pub identity: String,
    pub balance: f64,
}

#[derive(Serialize, Deserialize)]
pub struct PeersResponse {
    pub connected: bool,
    pub peers: Vec<Peer>,
}

#[derive(Serialize, Deserialize)]
pub struct NewWalletResponse {
    pub seed_phrase: String,
    pub identity: String,
}

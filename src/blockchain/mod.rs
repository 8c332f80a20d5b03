pub mod block;
pub mod mining;
pub mod model;

pub use block::{Block, TIMESTAMP_FORMAT, calculate_hash, meets_difficulty};
pub use mining::{MiningState, MiningStatus};
pub use model::{Blockchain, LedgerSnapshot};

/// Default Proof-of-Work difficulty (number of leading zeros).
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Coinbase reward credited to the miner of each block.
pub const MINING_REWARD: f64 = 10.0;

pub mod client;
pub mod directory;
pub mod gossip;

pub use client::{IDENTITY_HEADER, PORT_HEADER, PeerClient};
pub use directory::{Peer, PeerDirectory};
pub use gossip::{ChainRank, Gossip, accepts_pushed_chain, select_best};

/* ---------- Wire protocol verdicts ---------- */

pub const BLOCKCHAIN_RECEIVED: &str = "blockchain received";
pub const BLOCKCHAIN_REJECTED: &str = "blockchain rejected";
pub const TRANSACTION_RECEIVED: &str = "transaction received";
pub const NODE_DISCONNECTED: &str = "node disconnected";
pub const NODE_NOT_FOUND: &str = "node not found";

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NodeError>;

/// Failure of a single outbound call to a peer. Gossip loops log it and
/// move on to the next peer.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },
    #[error("peer {peer} answered HTTP {status}")]
    Status { peer: String, status: u16 },
    #[error("peer {peer} sent an invalid response: {reason}")]
    InvalidResponse { peer: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("seed phrase does not map to a valid secret key: {0}")]
    InvalidSeed(#[from] secp256k1::Error),
}

/// Startup failures surfaced by the node binary.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

//! Node settings read from the environment (a `.env` file is loaded first
//! by the binary).

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::{DEFAULT_DIFFICULTY, MINING_REWARD};
use crate::error::ConfigError;

/// What a node does on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Well-known bootstrap node; does not query anyone on startup.
    Server,
    User,
    Miner,
}

impl FromStr for NodeRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "user" => Ok(Self::User),
            "miner" => Ok(Self::Miner),
            _ => Err(()),
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Server => "server",
            Self::User => "user",
            Self::Miner => "miner",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// Host other peers should use to reach us.
    pub advertise_host: String,
    pub seed_phrase: String,
    pub role: NodeRole,
    /// `host:port` of the well-known node queried on startup.
    pub bootstrap_addr: String,
    pub difficulty: usize,
    pub mining_reward: f64,
    /// Upper bound for each outbound call to a peer.
    pub peer_timeout: Duration,
    /// Miners only: keep mining in a loop after startup.
    pub auto_mine: bool,
}

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BOOTSTRAP_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_PEER_TIMEOUT_SECS: u64 = 5;

impl NodeConfig {
    /// Local node with default settings.
    pub fn new(seed_phrase: impl Into<String>, role: NodeRole, port: u16) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port,
            advertise_host: DEFAULT_HOST.to_string(),
            seed_phrase: seed_phrase.into(),
            role,
            bootstrap_addr: DEFAULT_BOOTSTRAP_ADDR.to_string(),
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: MINING_REWARD,
            peer_timeout: Duration::from_secs(DEFAULT_PEER_TIMEOUT_SECS),
            auto_mine: false,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source; `from_env` passes `std::env`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let seed_phrase = lookup("SEED_PHRASE")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("SEED_PHRASE"))?;
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let advertise_host = lookup("ADVERTISE_HOST").unwrap_or_else(|| host.clone());

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            role: parse_or(&lookup, "ROLE", NodeRole::User)?,
            bootstrap_addr: lookup("BOOTSTRAP_ADDR")
                .unwrap_or_else(|| DEFAULT_BOOTSTRAP_ADDR.to_string()),
            difficulty: parse_or(&lookup, "DIFFICULTY", DEFAULT_DIFFICULTY)?,
            mining_reward: parse_or(&lookup, "MINING_REWARD", MINING_REWARD)?,
            peer_timeout: Duration::from_secs(parse_or(
                &lookup,
                "PEER_TIMEOUT_SECS",
                DEFAULT_PEER_TIMEOUT_SECS,
            )?),
            auto_mine: parse_or(&lookup, "AUTO_MINE", false)?,
            host,
            advertise_host,
            seed_phrase,
        })
    }

    /// `host:port` announced to peers.
    pub fn advertised_addr(&self) -> String {
        format!("{}:{}", self.advertise_host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use super::mining::MiningStatus;
use crate::transaction::Transaction;

/// Wire format of block timestamps (microsecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A block of transactions linked to its predecessor by hash.
///
/// Field names on the wire follow the peer protocol: `previous_block`
/// and `magic_number` carry the back-reference and the nonce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub transactions: Vec<Transaction>,
    #[serde(rename = "previous_block")]
    pub previous: Option<String>,
    #[serde(rename = "magic_number")]
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// Create the genesis block (no predecessor, no transactions).
    pub fn genesis() -> Self {
        Self::with_timestamp(Vec::new(), None, now())
    }

    /// Create a candidate block on top of `previous`. Call `mine()` to perform PoW.
    pub fn new(transactions: Vec<Transaction>, previous: String) -> Self {
        Self::with_timestamp(transactions, Some(previous), now())
    }

    pub fn with_timestamp(
        transactions: Vec<Transaction>,
        previous: Option<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        let mut block = Self {
            timestamp,
            transactions,
            previous,
            nonce: 1,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn compute_hash(&self) -> String {
        calculate_hash(&self.transactions, &self.timestamp, self.nonce)
    }

    /// Proof-of-Work: bump the nonce until the hash starts with `difficulty`
    /// zeros, or until `status` stops reporting `Mining`.
    ///
    /// Returns `false` when the search was cancelled; the block is then left
    /// with a non-qualifying hash and must be discarded.
    pub fn mine(&mut self, difficulty: usize, status: &MiningStatus) -> bool {
        while !meets_difficulty(&self.hash, difficulty) && status.is_mining() {
            self.nonce = self.nonce.wrapping_add(1);
            self.hash = self.compute_hash();
        }
        meets_difficulty(&self.hash, difficulty)
    }

    /// Stored hash matches the content. (Does NOT check linkage or PoW.)
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// SHA-256 over the ordered `(amount, sender, receiver)` triples, the
/// timestamp text and the nonce. Status is not part of the preimage, so
/// confirming a block's transactions leaves its hash intact.
pub fn calculate_hash(transactions: &[Transaction], timestamp: &NaiveDateTime, nonce: u64) -> String {
    let fields: Value = transactions
        .iter()
        .map(|tx| {
            json!({
                "amount": tx.amount(),
                "sender": tx.sender(),
                "receiver": tx.receiver(),
            })
        })
        .collect();
    let preimage = format!("{}{}{}", fields, timestamp.format(TIMESTAMP_FORMAT), nonce);
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    hex::encode(hasher.finalize())
}

/// First `difficulty` hex characters are all `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|c| c == b'0')
}

/// Current UTC time truncated to what the wire format can carry.
fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        let ts = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(D::Error::custom)?;
        // Only the canonical text is accepted; it is what gets hashed.
        if ts.format(TIMESTAMP_FORMAT).to_string() != raw {
            return Err(D::Error::custom(format!(
                "timestamp {raw:?} is not in YYYY-MM-DD HH:MM:SS.ffffff form"
            )));
        }
        Ok(ts)
    }
}

use log::{debug, info, warn};
use std::time::Duration;

use super::client::PeerClient;
use super::directory::PeerDirectory;
use crate::blockchain::LedgerSnapshot;
use crate::error::PeerError;
use crate::transaction::Transaction;

/// Fork-choice ordering: longer chain first, then larger mempool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChainRank {
    pub length: usize,
    pub mempool: usize,
}

impl ChainRank {
    pub fn of(snapshot: &LedgerSnapshot) -> Self {
        Self {
            length: snapshot.length,
            mempool: snapshot.mempool.len(),
        }
    }
}

/// Pick the winner among `candidates`, starting from `local`.
///
/// Invalid candidates are ignored and a candidate only wins by ranking
/// strictly above the best so far, so ties keep the earlier one (and
/// ultimately the local chain). Returns `None` when the local snapshot wins.
pub fn select_best<I>(local: &LedgerSnapshot, candidates: I) -> Option<LedgerSnapshot>
where
    I: IntoIterator<Item = LedgerSnapshot>,
{
    let mut best_rank = ChainRank::of(local);
    let mut best = None;
    for candidate in candidates {
        if !candidate.is_valid() {
            debug!("ignoring invalid candidate of length {}", candidate.length);
            continue;
        }
        let rank = ChainRank::of(&candidate);
        if rank > best_rank {
            best_rank = rank;
            best = Some(candidate);
        }
    }
    best
}

/// Accept rule for a chain pushed to us: strictly longer than ours and valid.
pub fn accepts_pushed_chain(local_length: usize, snapshot: &LedgerSnapshot) -> bool {
    snapshot.length > local_length && snapshot.is_valid()
}

/// Peer directory plus the outbound half of the protocol.
///
/// All loops are sequential and best-effort: a failing peer is logged and
/// skipped, never retried, and never affects delivery to the others.
#[derive(Debug)]
pub struct Gossip {
    directory: PeerDirectory,
    client: PeerClient,
}

impl Gossip {
    pub fn new(identity: &str, port: u16, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            directory: PeerDirectory::new(identity),
            client: PeerClient::new(identity, port, timeout)?,
        })
    }

    pub fn directory(&self) -> &PeerDirectory {
        &self.directory
    }

    pub fn identity(&self) -> &str {
        self.directory.self_identity()
    }

    /// At least one known peer besides ourselves.
    pub fn validate_connection(&self) -> bool {
        self.directory.is_connected()
    }

    /// Bootstrap: merge the directory of the node at `bootstrap_addr`.
    /// Returns how many new peers were learned.
    pub async fn connect_node(&self, bootstrap_addr: &str) -> Result<usize, PeerError> {
        let peers = self.client.get_network(bootstrap_addr).await?;
        let mut learned = 0;
        for peer in peers.iter().filter(|p| p.identity != self.identity()) {
            if self.directory.insert(&peer.identity, &peer.url) {
                learned += 1;
            }
        }
        info!(
            "bootstrapped from {bootstrap_addr}: {} peers listed, {learned} new",
            peers.len()
        );
        Ok(learned)
    }

    /// Fork-choice poll: fetch every other peer's snapshot and return the
    /// best valid one if it beats `local`. Unreachable peers are skipped.
    pub async fn replace_chain(&self, local: &LedgerSnapshot) -> Option<LedgerSnapshot> {
        let mut candidates = Vec::new();
        for peer in self.directory.others() {
            match self.client.get_blockchain(&peer.url).await {
                Ok(snapshot) => {
                    debug!(
                        "{} offers length {} / mempool {}",
                        peer.url,
                        snapshot.length,
                        snapshot.mempool.len()
                    );
                    candidates.push(snapshot);
                }
                Err(e) => warn!("skipping {} during chain poll: {e}", peer.identity),
            }
        }
        select_best(local, candidates)
    }

    /// Push our snapshot to every other peer. Returns how many accepted it.
    pub async fn send_block(&self, snapshot: &LedgerSnapshot) -> usize {
        let mut accepted = 0;
        for peer in self.directory.others() {
            match self.client.send_blockchain(&peer.url, snapshot).await {
                Ok(verdict) => {
                    debug!("{} -> {verdict}", peer.url);
                    if verdict == super::BLOCKCHAIN_RECEIVED {
                        accepted += 1;
                    }
                }
                Err(e) => warn!("block push to {} failed: {e}", peer.identity),
            }
        }
        accepted
    }

    /// Push one transaction to every other peer. Returns deliveries.
    pub async fn send_transaction(&self, tx: &Transaction) -> usize {
        let mut delivered = 0;
        for peer in self.directory.others() {
            match self.client.send_transaction(&peer.url, tx).await {
                Ok(_) => delivered += 1,
                Err(e) => warn!("transaction push to {} failed: {e}", peer.identity),
            }
        }
        delivered
    }

    /// Ask every other peer to drop us. Returns how many answered.
    pub async fn leave_network(&self) -> usize {
        let mut notified = 0;
        for peer in self.directory.others() {
            match self.client.disconnect(&peer.url).await {
                Ok(verdict) => {
                    debug!("{} -> {verdict}", peer.url);
                    notified += 1;
                }
                Err(e) => warn!("disconnect notice to {} failed: {e}", peer.identity),
            }
        }
        notified
    }
}

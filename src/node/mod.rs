//! The node: one ledger, one peer directory, and the rules tying them
//! together.
//!
//! Local operations (mine, create a transaction, sync) are gated on having
//! at least one peer, mutate the ledger, then gossip the result. Pushes
//! accepted by the listener come back in through `update_blockchain` and
//! `update_transaction`.

mod subscriber;

pub use subscriber::{LogSubscriber, NodeEvent, Subscriber};

use actix_web::web;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::blockchain::{Blockchain, LedgerSnapshot, MiningStatus};
use crate::config::{NodeConfig, NodeRole};
use crate::error::{NodeError, PeerError};
use crate::p2p::{ChainRank, Gossip, accepts_pushed_chain};
use crate::transaction::Transaction;
use crate::wallet::identity_from_seed;

/// Result of a local mining request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MineOutcome {
    /// No peer besides ourselves; nothing was attempted.
    NotConnected,
    /// The search was interrupted or its head went stale; nothing appended.
    Cancelled,
    /// Another search is already running on this node.
    Busy,
    Mined {
        index: usize,
        hash: String,
        nonce: u64,
        /// Peers that accepted the pushed chain.
        accepted_by: usize,
    },
}

pub struct Node {
    identity: String,
    role: NodeRole,
    advertised_addr: String,
    bootstrap_addr: String,
    ledger: Mutex<Blockchain>,
    gossip: Gossip,
    mining: Arc<MiningStatus>,
    subscriber: Box<dyn Subscriber>,
    stopping: AtomicBool,
}

impl Node {
    pub fn new(config: &NodeConfig, subscriber: Box<dyn Subscriber>) -> Result<Self, NodeError> {
        let identity = identity_from_seed(&config.seed_phrase)?;
        let gossip = Gossip::new(&identity, config.port, config.peer_timeout)?;
        Ok(Self {
            ledger: Mutex::new(Blockchain::new(config.difficulty, config.mining_reward)),
            gossip,
            role: config.role,
            advertised_addr: config.advertised_addr(),
            bootstrap_addr: config.bootstrap_addr.clone(),
            mining: Arc::new(MiningStatus::new()),
            subscriber,
            stopping: AtomicBool::new(false),
            identity,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn gossip(&self) -> &Gossip {
        &self.gossip
    }

    pub fn mining_status(&self) -> &Arc<MiningStatus> {
        &self.mining
    }

    pub fn validate_connection(&self) -> bool {
        self.gossip.validate_connection()
    }

    /// Run `f` against the ledger under its lock.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&Blockchain) -> R) -> R {
        let ledger = self.ledger.lock().expect("mutex poisoned");
        f(&ledger)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.with_ledger(Blockchain::snapshot)
    }

    pub fn balance(&self, identity: &str) -> f64 {
        self.with_ledger(|ledger| ledger.balance(identity))
    }

    /// Join the network: list ourselves in our own directory, then (unless
    /// we are the well-known server) merge the bootstrap node's directory.
    pub async fn connect(&self) -> Result<usize, PeerError> {
        self.gossip
            .directory()
            .insert(&self.identity, &self.advertised_addr);
        if self.role == NodeRole::Server {
            return Ok(0);
        }
        self.gossip.connect_node(&self.bootstrap_addr).await
    }

    /// Fork-choice over every peer; adopt the winner if it is remote and
    /// still beats the local ledger once the poll is done.
    pub async fn get_blockchain(&self) -> bool {
        if !self.validate_connection() {
            debug!("get_blockchain skipped: not connected");
            return false;
        }

        let local = self.snapshot();
        let Some(winner) = self.gossip.replace_chain(&local).await else {
            debug!("local chain kept (length {})", local.length);
            return false;
        };

        let length = winner.length;
        {
            let mut ledger = self.ledger.lock().expect("mutex poisoned");
            if ChainRank::of(&winner) <= rank_of(&ledger) || !ledger.update_chain(winner) {
                return false;
            }
            self.cancel_mining();
        }
        self.subscriber.notify(&NodeEvent::ChainAdopted { length });
        true
    }

    /// Mine the mempool into a block and push the new chain to every peer.
    ///
    /// The nonce search runs on a blocking thread without holding the ledger
    /// lock, so the listener can accept a longer chain meanwhile and cancel it.
    /// The token is armed under the same lock that takes the candidate and
    /// released under the lock that commits, and chain adoption cancels under
    /// that lock too, so no adoption slips between the two.
    pub async fn mine_block(&self) -> MineOutcome {
        if !self.validate_connection() {
            debug!("mine_block skipped: not connected");
            return MineOutcome::NotConnected;
        }

        let (block, difficulty) = {
            let ledger = self.ledger.lock().expect("mutex poisoned");
            if !self.mining.try_start() {
                debug!("mine_block skipped: a search is already running");
                return MineOutcome::Busy;
            }
            (ledger.candidate_block(), ledger.difficulty())
        };
        if self.stopping.load(Ordering::SeqCst) {
            self.mining.cancel();
        }
        let status = Arc::clone(&self.mining);
        let search = web::block(move || {
            let mut block = block;
            let found = block.mine(difficulty, &status);
            (block, found)
        })
        .await;

        let block = match search {
            Ok((block, true)) => block,
            Ok((block, false)) => {
                info!("mining cancelled at nonce {}", block.nonce);
                self.mining.finish();
                return MineOutcome::Cancelled;
            }
            Err(e) => {
                warn!("mining thread failed: {e}");
                self.mining.finish();
                return MineOutcome::Cancelled;
            }
        };

        let (hash, nonce) = (block.hash.clone(), block.nonce);
        let (snapshot, index) = {
            let mut ledger = self.ledger.lock().expect("mutex poisoned");
            let committed = ledger.commit_block(block, &self.identity);
            self.mining.finish();
            if !committed {
                return MineOutcome::Cancelled;
            }
            (ledger.snapshot(), ledger.len() - 1)
        };

        let accepted_by = self.gossip.send_block(&snapshot).await;
        info!("block #{index} pushed, accepted by {accepted_by} peers");
        MineOutcome::Mined {
            index,
            hash,
            nonce,
            accepted_by,
        }
    }

    /// Keep mining until shutdown. A cancelled attempt restarts right away
    /// against the new head.
    pub async fn mine_forever(&self, idle_pause: Duration) {
        while !self.stopping.load(Ordering::SeqCst) {
            match self.mine_block().await {
                MineOutcome::Mined { .. } => {}
                MineOutcome::Cancelled => debug!("restarting mining on the new head"),
                MineOutcome::NotConnected | MineOutcome::Busy => {
                    actix_web::rt::time::sleep(idle_pause).await
                }
            }
        }
    }

    /// Queue a transfer and gossip it. `None` when not connected.
    pub async fn create_transaction(
        &self,
        sender: &str,
        receiver: &str,
        amount: f64,
    ) -> Option<Transaction> {
        if !self.validate_connection() {
            debug!("create_transaction skipped: not connected");
            return None;
        }

        let tx = {
            let mut ledger = self.ledger.lock().expect("mutex poisoned");
            ledger.create_transaction(sender, receiver, amount)
        };
        let delivered = self.gossip.send_transaction(&tx).await;
        debug!("transaction delivered to {delivered} peers");
        Some(tx)
    }

    /// Inbound chain push. Applied only if strictly longer than ours and
    /// valid; validation runs before the ledger lock is taken and the length
    /// is checked again under it.
    pub fn update_blockchain(&self, snapshot: LedgerSnapshot) -> bool {
        let local_length = self.with_ledger(Blockchain::len);
        if !accepts_pushed_chain(local_length, &snapshot) {
            debug!(
                "rejected pushed chain of length {} (local {local_length})",
                snapshot.length
            );
            return false;
        }

        let length = snapshot.length;
        {
            let mut ledger = self.ledger.lock().expect("mutex poisoned");
            if length <= ledger.len() || !ledger.update_chain(snapshot) {
                return false;
            }
            self.cancel_mining();
        }
        self.subscriber.notify(&NodeEvent::ChainAdopted { length });
        true
    }

    /// Inbound transaction push: always appended.
    pub fn update_transaction(&self, tx: Transaction) {
        {
            let mut ledger = self.ledger.lock().expect("mutex poisoned");
            ledger.update_mempool(tx.clone());
        }
        if tx.receiver() == self.identity {
            self.subscriber.notify(&NodeEvent::TransactionReceived(tx));
        }
    }

    /// Leave the network: tell every peer to forget us and stop mining.
    /// The caller stops the listener afterwards.
    pub async fn shutdown(&self) -> usize {
        self.stopping.store(true, Ordering::SeqCst);
        let notified = self.gossip.leave_network().await;
        if self.mining.cancel() {
            info!("in-flight mining cancelled for shutdown");
        }
        info!("left the network ({notified} peers notified)");
        notified
    }

    /// Called with the ledger lock held, right after the chain was replaced.
    fn cancel_mining(&self) {
        if self.mining.cancel() {
            info!("cancelled in-flight mining: chain replaced");
        }
    }
}

fn rank_of(ledger: &Blockchain) -> ChainRank {
    ChainRank {
        length: ledger.len(),
        mempool: ledger.mempool().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::MiningState;

    type Events = Arc<Mutex<Vec<NodeEvent>>>;

    struct Recorder(Events);

    impl Subscriber for Recorder {
        fn notify(&self, event: &NodeEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn node(seed: &str, role: NodeRole, difficulty: usize) -> (Node, Events) {
        let events = Events::default();
        let mut config = NodeConfig::new(seed, role, 5000);
        config.difficulty = difficulty;
        config.peer_timeout = Duration::from_millis(300);
        let node = Node::new(&config, Box::new(Recorder(Arc::clone(&events)))).unwrap();
        node.gossip().directory().insert(node.identity(), "127.0.0.1:5000");
        (node, events)
    }

    /// A peer nobody listens for, so the gate opens but every push fails.
    fn add_ghost_peer(node: &Node) {
        node.gossip().directory().insert("ghost", "127.0.0.1:9");
    }

    fn remote_chain(blocks: usize) -> LedgerSnapshot {
        let status = MiningStatus::new();
        let mut bc = Blockchain::new(1, 10.0);
        for _ in 0..blocks {
            bc.create_transaction("x", "y", 1.0);
            assert!(status.try_start());
            assert!(bc.mine_block("remote-miner", &status));
            status.finish();
        }
        bc.snapshot()
    }

    #[actix_web::test]
    async fn unconnected_node_refuses_mutations() {
        let (node, _) = node("lonely", NodeRole::User, 1);
        assert!(!node.validate_connection());
        assert_eq!(node.mine_block().await, MineOutcome::NotConnected);
        assert_eq!(node.create_transaction("a", "b", 1.0).await, None);
        assert!(!node.get_blockchain().await);
        assert_eq!(node.snapshot().length, 1);
        assert!(node.snapshot().mempool.is_empty());
    }

    #[actix_web::test]
    async fn mining_commits_even_if_no_peer_answers() {
        let (node, _) = node("miner", NodeRole::Miner, 1);
        add_ghost_peer(&node);
        assert!(node.create_transaction(node.identity(), "b", 2.0).await.is_some());

        match node.mine_block().await {
            MineOutcome::Mined {
                index, accepted_by, ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(accepted_by, 0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(node.mining_status().state(), MiningState::Idle);
        let snapshot = node.snapshot();
        assert_eq!(snapshot.length, 2);
        assert!(snapshot.mempool[0].is_coinbase());
        assert_eq!(node.balance(node.identity()), -2.0);
    }

    #[actix_web::test]
    async fn unreachable_peers_do_not_change_local_chain() {
        let (node, _) = node("alone", NodeRole::User, 1);
        add_ghost_peer(&node);
        let before = node.snapshot();
        assert!(!node.get_blockchain().await);
        assert_eq!(node.snapshot(), before);
    }

    #[test]
    fn pushed_chain_must_be_longer_and_valid() {
        let (node, events) = node("receiver", NodeRole::User, 1);
        let before = node.snapshot();

        let mut forged = remote_chain(3);
        forged.chain[1].nonce += 1;
        assert!(!node.update_blockchain(forged));

        assert!(!node.update_blockchain(remote_chain(0)));
        assert_eq!(node.snapshot(), before);
        assert!(events.lock().unwrap().is_empty());

        let longer = remote_chain(2);
        assert!(node.update_blockchain(longer.clone()));
        assert_eq!(node.snapshot(), longer);
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[NodeEvent::ChainAdopted { length: 3 }]
        );
    }

    #[test]
    fn receiver_is_notified_of_incoming_transfer() {
        let (node, events) = node("receiver", NodeRole::User, 1);
        let me = node.identity().to_string();

        node.update_transaction(Transaction::transfer("someone", "someone-else", 1.0));
        assert!(events.lock().unwrap().is_empty());

        let incoming = Transaction::transfer("someone", me.as_str(), 3.0);
        node.update_transaction(incoming.clone());
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[NodeEvent::TransactionReceived(incoming)]
        );
        assert_eq!(node.snapshot().mempool.len(), 2);
    }

    #[actix_web::test]
    async fn accepted_push_cancels_in_flight_mining() {
        // Difficulty 64 never succeeds; only cancellation ends the search.
        let (node, _) = node("busy-miner", NodeRole::Miner, 64);
        add_ghost_peer(&node);
        let node = Arc::new(node);

        let miner = Arc::clone(&node);
        let attempt = actix_web::rt::spawn(async move { miner.mine_block().await });
        while !node.mining_status().is_mining() {
            actix_web::rt::time::sleep(Duration::from_millis(5)).await;
        }

        let longer = remote_chain(1);
        assert!(node.update_blockchain(longer.clone()));
        assert_eq!(attempt.await.unwrap(), MineOutcome::Cancelled);
        assert_eq!(node.snapshot(), longer);
        assert_eq!(node.mining_status().state(), MiningState::Idle);
    }

    #[actix_web::test]
    async fn second_search_is_refused_while_one_runs() {
        let (node, _) = node("double-miner", NodeRole::Miner, 64);
        add_ghost_peer(&node);
        let node = Arc::new(node);

        let miner = Arc::clone(&node);
        let first = actix_web::rt::spawn(async move { miner.mine_block().await });
        while !node.mining_status().is_mining() {
            actix_web::rt::time::sleep(Duration::from_millis(5)).await;
        }

        // The refused call must not disturb the running search.
        assert_eq!(node.mine_block().await, MineOutcome::Busy);
        assert!(node.mining_status().is_mining());

        // An adopted chain still cancels the search that owns the token.
        let longer = remote_chain(2);
        assert!(node.update_blockchain(longer.clone()));
        assert_eq!(first.await.unwrap(), MineOutcome::Cancelled);
        assert_eq!(node.mining_status().state(), MiningState::Idle);

        // The token is free again for the next search.
        assert_eq!(node.snapshot(), longer);
        assert!(node.mining_status().try_start());
        node.mining_status().finish();
    }

    #[actix_web::test]
    async fn shutdown_cancels_mining_and_stops_loop() {
        let (node, _) = node("leaving", NodeRole::Miner, 64);
        add_ghost_peer(&node);
        let node = Arc::new(node);

        let miner = Arc::clone(&node);
        let looping = actix_web::rt::spawn(async move {
            miner.mine_forever(Duration::from_millis(10)).await
        });
        while !node.mining_status().is_mining() {
            actix_web::rt::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(node.shutdown().await, 0);
        looping.await.unwrap();
        assert_eq!(node.snapshot().length, 1);
    }
}

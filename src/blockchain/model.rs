use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::mining::MiningStatus;
use super::{Block, DEFAULT_DIFFICULTY, MINING_REWARD};
use crate::transaction::Transaction;

/// Full ledger state as exchanged between peers: `{chain, length, mempool}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
    pub mempool: Vec<Transaction>,
}

impl LedgerSnapshot {
    /// Declared length agrees with the chain it carries and the chain verifies.
    pub fn is_valid(&self) -> bool {
        self.length == self.chain.len() && Blockchain::is_chain_valid(&self.chain)
    }
}

/// In-memory hash-chained ledger: the chain plus the pending mempool.
#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    mempool: Vec<Transaction>,
    difficulty: usize,
    mining_reward: f64,
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block.
    pub fn new(difficulty: usize, mining_reward: f64) -> Self {
        Self {
            chain: vec![Block::genesis()],
            mempool: Vec::new(),
            difficulty,
            mining_reward,
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn mempool(&self) -> &[Transaction] {
        &self.mempool
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn mining_reward(&self) -> f64 {
        self.mining_reward
    }

    /// Queue a pending transfer and hand it back for broadcast.
    pub fn create_transaction(&mut self, sender: &str, receiver: &str, amount: f64) -> Transaction {
        let tx = Transaction::transfer(sender, receiver, amount);
        self.mempool.push(tx.clone());
        debug!("mempool += {} -> {} ({})", sender, receiver, amount);
        tx
    }

    /// Append a transaction received from a peer.
    pub fn update_mempool(&mut self, tx: Transaction) {
        self.mempool.push(tx);
    }

    /// Snapshot the mempool into an unmined block on top of the current head.
    pub fn candidate_block(&self) -> Block {
        Block::new(self.mempool.clone(), self.last_block().hash.clone())
    }

    /// Append a block mined from `candidate_block()`.
    ///
    /// Refused (returns `false`, nothing changes) when the head moved since
    /// the candidate was taken, e.g. because a remote chain replaced ours
    /// during the search. On success every included transaction is confirmed
    /// and the mempool restarts with a pending reward for `miner`, followed by
    /// whatever arrived while the search ran.
    pub fn commit_block(&mut self, mut block: Block, miner: &str) -> bool {
        if block.previous.as_deref() != Some(self.last_block().hash.as_str()) {
            debug!("discarding stale block {} (head moved)", block.hash);
            return false;
        }

        let included = block.transactions.len();
        let late = if self.mempool.len() >= included && self.mempool[..included] == block.transactions[..]
        {
            self.mempool.split_off(included)
        } else {
            Vec::new()
        };

        for tx in &mut block.transactions {
            tx.confirm();
        }
        info!(
            "sealed block #{} (hash={}, nonce={}, txs={})",
            self.chain.len(),
            block.hash,
            block.nonce,
            included
        );
        self.chain.push(block);

        self.mempool = Vec::with_capacity(1 + late.len());
        self.mempool.push(Transaction::coinbase(self.mining_reward, miner));
        self.mempool.extend(late);
        true
    }

    /// Mine the mempool into a new block credited to `miner`.
    ///
    /// Blocks the calling thread until a qualifying nonce is found or
    /// `status` is cancelled; on cancellation chain and mempool are untouched.
    pub fn mine_block(&mut self, miner: &str, status: &MiningStatus) -> bool {
        let mut block = self.candidate_block();
        if !block.mine(self.difficulty, status) {
            debug!("mining cancelled at nonce {}", block.nonce);
            return false;
        }
        self.commit_block(block, miner)
    }

    /// Net confirmed value held by `identity`. Linear scan over the whole chain.
    pub fn balance(&self, identity: &str) -> f64 {
        let mut balance = 0.0;
        for tx in self.chain.iter().flat_map(|b| &b.transactions) {
            if !tx.is_confirmed() {
                continue;
            }
            match tx {
                Transaction::Transfer(t) => {
                    if t.sender == identity {
                        balance -= t.amount;
                    }
                    if t.receiver == identity {
                        balance += t.amount;
                    }
                }
                Transaction::Coinbase(c) => {
                    if c.miner == identity {
                        balance += c.amount;
                    }
                }
            }
        }
        balance
    }

    /// Verify hashes and linkage of a chain received from anywhere.
    ///
    /// Genesis is trusted as-is; an empty chain is rejected.
    pub fn is_chain_valid(chain: &[Block]) -> bool {
        if chain.is_empty() {
            return false;
        }

        for pair in chain.windows(2) {
            let (prev, current) = (&pair[0], &pair[1]);

            // Check hash integrity
            if !current.has_valid_hash() {
                return false;
            }

            // Check linkage
            if current.previous.as_deref() != Some(prev.hash.as_str()) {
                return false;
            }
        }

        true
    }

    /// Replace chain and mempool wholesale with a snapshot's content.
    ///
    /// Blocks are rebuilt in order, each relinked to the block rebuilt before
    /// it and rehashed from its own fields. Callers validate first; an empty
    /// chain is refused and leaves the ledger untouched.
    pub fn update_chain(&mut self, snapshot: LedgerSnapshot) -> bool {
        if snapshot.chain.is_empty() {
            return false;
        }

        let mut chain: Vec<Block> = Vec::with_capacity(snapshot.chain.len());
        for remote in snapshot.chain {
            let previous = chain.last().map(|b| b.hash.clone());
            let mut block = Block::with_timestamp(remote.transactions, previous, remote.timestamp);
            block.nonce = remote.nonce;
            block.hash = block.compute_hash();
            chain.push(block);
        }

        info!(
            "ledger replaced: {} -> {} blocks, mempool {}",
            self.chain.len(),
            chain.len(),
            snapshot.mempool.len()
        );
        self.chain = chain;
        self.mempool = snapshot.mempool;
        true
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            chain: self.chain.clone(),
            length: self.chain.len(),
            mempool: self.mempool.clone(),
        }
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY, MINING_REWARD)
    }
}

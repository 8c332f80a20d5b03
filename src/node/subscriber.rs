use log::info;

use crate::transaction::Transaction;

/// Something worth telling the local user about.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// A gossiped transaction names this node as receiver.
    TransactionReceived(Transaction),
    /// A remote chain replaced the local one.
    ChainAdopted { length: usize },
}

/// External collaborator notified by the node.
pub trait Subscriber: Send + Sync {
    fn notify(&self, event: &NodeEvent);
}

/// Default subscriber: writes events to the log.
#[derive(Debug, Default)]
pub struct LogSubscriber;

impl Subscriber for LogSubscriber {
    fn notify(&self, event: &NodeEvent) {
        match event {
            NodeEvent::TransactionReceived(tx) => info!(
                "you received a transaction of {} ITcoins from {}",
                tx.amount(),
                tx.sender()
            ),
            NodeEvent::ChainAdopted { length } => {
                info!("someone mined a block, chain length is now {length}")
            }
        }
    }
}

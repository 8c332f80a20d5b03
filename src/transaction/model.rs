use serde::{Deserialize, Serialize};

/// Sender label carried by coinbase rewards on the wire.
pub const COINBASE_SENDER: &str = "ITcoin";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxStatus {
    #[default]
    Pending,
    Confirmed,
}

/// Value moved from one identity to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub amount: f64,
    pub sender: String,
    pub receiver: String,
    pub status: TxStatus,
}

/// System-issued reward crediting the miner of a block. Has no debit side.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinbaseReward {
    pub amount: f64,
    pub miner: String,
    pub status: TxStatus,
}

/// A ledger entry. Both variants share one flat wire form; the `"ITcoin"`
/// sender label tells them apart when decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransactionRecord", into = "TransactionRecord")]
pub enum Transaction {
    Transfer(Transfer),
    Coinbase(CoinbaseReward),
}

/// Wire form: `{amount, sender, receiver, status}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub amount: f64,
    pub sender: String,
    pub receiver: String,
    #[serde(default)]
    pub status: TxStatus,
}

impl Transaction {
    /// New pending transfer.
    pub fn transfer(sender: impl Into<String>, receiver: impl Into<String>, amount: f64) -> Self {
        Self::Transfer(Transfer {
            amount,
            sender: sender.into(),
            receiver: receiver.into(),
            status: TxStatus::Pending,
        })
    }

    /// New pending coinbase reward for `miner`.
    pub fn coinbase(amount: f64, miner: impl Into<String>) -> Self {
        Self::Coinbase(CoinbaseReward {
            amount,
            miner: miner.into(),
            status: TxStatus::Pending,
        })
    }

    pub fn amount(&self) -> f64 {
        match self {
            Self::Transfer(t) => t.amount,
            Self::Coinbase(c) => c.amount,
        }
    }

    /// Debited identity, or the coinbase label for rewards.
    pub fn sender(&self) -> &str {
        match self {
            Self::Transfer(t) => &t.sender,
            Self::Coinbase(_) => COINBASE_SENDER,
        }
    }

    /// Credited identity (the miner for rewards).
    pub fn receiver(&self) -> &str {
        match self {
            Self::Transfer(t) => &t.receiver,
            Self::Coinbase(c) => &c.miner,
        }
    }

    pub fn status(&self) -> TxStatus {
        match self {
            Self::Transfer(t) => t.status,
            Self::Coinbase(c) => c.status,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status() == TxStatus::Confirmed
    }

    pub fn is_coinbase(&self) -> bool {
        matches!(self, Self::Coinbase(_))
    }

    /// Pending -> Confirmed. Called once, when the owning block is mined.
    pub fn confirm(&mut self) {
        match self {
            Self::Transfer(t) => t.status = TxStatus::Confirmed,
            Self::Coinbase(c) => c.status = TxStatus::Confirmed,
        }
    }
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        if record.sender == COINBASE_SENDER {
            Self::Coinbase(CoinbaseReward {
                amount: record.amount,
                miner: record.receiver,
                status: record.status,
            })
        } else {
            Self::Transfer(Transfer {
                amount: record.amount,
                sender: record.sender,
                receiver: record.receiver,
                status: record.status,
            })
        }
    }
}

impl From<Transaction> for TransactionRecord {
    fn from(tx: Transaction) -> Self {
        match tx {
            Transaction::Transfer(t) => Self {
                amount: t.amount,
                sender: t.sender,
                receiver: t.receiver,
                status: t.status,
            },
            Transaction::Coinbase(c) => Self {
                amount: c.amount,
                sender: COINBASE_SENDER.to_string(),
                receiver: c.miner,
                status: c.status,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coinbase_uses_system_sender_on_the_wire() {
        let tx = Transaction::coinbase(10.0, "miner-a");
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["sender"], COINBASE_SENDER);
        assert_eq!(json["receiver"], "miner-a");
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["amount"], 10.0);
    }

    #[test]
    fn sender_label_selects_variant_when_decoding() {
        let reward: Transaction = serde_json::from_str(
            r#"{"amount":10,"sender":"ITcoin","receiver":"m","status":"CONFIRMED"}"#,
        )
        .unwrap();
        assert!(reward.is_coinbase());
        assert!(reward.is_confirmed());
        assert_eq!(reward.receiver(), "m");

        let transfer: Transaction =
            serde_json::from_str(r#"{"amount":2.5,"sender":"a","receiver":"b","status":"PENDING"}"#)
                .unwrap();
        assert_eq!(transfer, Transaction::transfer("a", "b", 2.5));
    }

    #[test]
    fn missing_status_defaults_to_pending() {
        let tx: Transaction =
            serde_json::from_str(r#"{"amount":1,"sender":"a","receiver":"b"}"#).unwrap();
        assert_eq!(tx.status(), TxStatus::Pending);
    }

    #[test]
    fn confirm_flips_status() {
        let mut tx = Transaction::transfer("a", "b", 1.0);
        assert!(!tx.is_confirmed());
        tx.confirm();
        assert!(tx.is_confirmed());
    }
}

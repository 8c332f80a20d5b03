pub mod model;

pub use model::{COINBASE_SENDER, CoinbaseReward, Transaction, TransactionRecord, Transfer, TxStatus};

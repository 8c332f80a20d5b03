mod balance;
mod chain;
mod gossip;
mod health;
pub mod models;
mod network;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

/// Whole ledgers travel in chain pushes; the default payload limits are far
/// below what a long-running network produces.
const PAYLOAD_LIMIT: usize = 64 * 1024 * 1024;

/// Peer wire protocol at the root, operator API under `/api/v1`.
pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(PAYLOAD_LIMIT))
        .app_data(web::JsonConfig::default().limit(PAYLOAD_LIMIT))
        .service(gossip::get_network)
        .service(gossip::get_blockchain)
        .service(gossip::receive_blockchain)
        .service(gossip::receive_transaction)
        .service(gossip::disconnect_node)
        .service(
            web::scope("/api/v1")
                .service(health::health_check)
                .service(chain::get_chain)
                .service(chain::sync_chain)
                .service(chain::mine_block)
                .service(tx::post_transaction)
                .service(tx::get_mempool)
                .service(balance::get_balance)
                .service(network::get_peers)
                .service(wallet::create_wallet),
        );
}

use actix_web::{HttpResponse, Responder, get, post, web};
use log::info;

use super::models::{ChainResponse, SyncResponse};
use crate::blockchain::Blockchain;
use crate::node::{MineOutcome, Node};

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(node: web::Data<Node>) -> impl Responder {
    node.with_ledger(|bc| {
        HttpResponse::Ok().json(ChainResponse {
            length: bc.len(),
            difficulty: bc.difficulty(),
            mining_reward: bc.mining_reward(),
            valid: Blockchain::is_chain_valid(bc.chain()),
            chain: bc.chain(),
        })
    })
}

/// Poll every peer and adopt the best chain if it beats ours.
#[post("/sync/")]
pub async fn sync_chain(node: web::Data<Node>) -> impl Responder {
    let adopted = node.get_blockchain().await;
    let length = node.with_ledger(Blockchain::len);
    info!("sync: adopted={adopted}, length={length}");
    HttpResponse::Ok().json(SyncResponse { adopted, length })
}

/// Mine the mempool into a block and push it to the network.
#[post("/mine/")]
pub async fn mine_block(node: web::Data<Node>) -> impl Responder {
    match node.mine_block().await {
        outcome @ (MineOutcome::NotConnected | MineOutcome::Busy) => {
            HttpResponse::Conflict().json(outcome)
        }
        outcome => HttpResponse::Ok().json(outcome),
    }
}

use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};

use super::models::{MempoolResponse, NewTxRequest};
use crate::node::Node;
use crate::wallet::is_identity;

/// Create a transfer (sender defaults to this node) and gossip it.
#[post("/tx/")]
pub async fn post_transaction(
    node: web::Data<Node>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let NewTxRequest {
        receiver,
        amount,
        sender,
    } = body.into_inner();

    if !amount.is_finite() {
        return HttpResponse::BadRequest().body("amount must be a finite number");
    }
    if !is_identity(&receiver) {
        warn!("POST /tx/ - receiver {receiver:?} is not an identity");
    }

    let sender = sender.unwrap_or_else(|| node.identity().to_string());
    match node.create_transaction(&sender, &receiver, amount).await {
        Some(tx) => {
            debug!("POST /tx/ - {sender} -> {receiver}: {amount}");
            HttpResponse::Ok().json(tx)
        }
        None => HttpResponse::Conflict().body("node is not connected to any peer"),
    }
}

/// List the current mempool.
#[get("/mempool/")]
pub async fn get_mempool(node: web::Data<Node>) -> impl Responder {
    node.with_ledger(|bc| {
        HttpResponse::Ok().json(MempoolResponse {
            size: bc.mempool().len(),
            transactions: bc.mempool(),
        })
    })
}

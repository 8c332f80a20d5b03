use actix_web::{HttpResponse, Responder, get, web};

use super::models::PeersResponse;
use crate::node::Node;

/// Every known peer, this node included.
#[get("/peers/")]
pub async fn get_peers(node: web::Data<Node>) -> impl Responder {
    HttpResponse::Ok().json(PeersResponse {
        connected: node.validate_connection(),
        peers: node.gossip().directory().peers(),
    })
}

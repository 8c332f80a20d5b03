//! Peer wire protocol, served at the root scope.

use actix_web::{HttpRequest, HttpResponse, Responder, delete, get, post, web};
use log::{debug, info, warn};
use std::net::SocketAddr;

use crate::blockchain::LedgerSnapshot;
use crate::node::Node;
use crate::p2p::{
    BLOCKCHAIN_RECEIVED, BLOCKCHAIN_REJECTED, IDENTITY_HEADER, NODE_DISCONNECTED, NODE_NOT_FOUND,
    PORT_HEADER, TRANSACTION_RECEIVED,
};
use crate::transaction::Transaction;

#[get("/get_network")]
pub async fn get_network(node: web::Data<Node>, req: HttpRequest) -> impl Responder {
    discover(&node, &req);
    HttpResponse::Ok().json(node.gossip().directory().peers())
}

#[get("/get_blockchain")]
pub async fn get_blockchain(node: web::Data<Node>, req: HttpRequest) -> impl Responder {
    discover(&node, &req);
    HttpResponse::Ok().json(node.snapshot())
}

/// Chain push. Anything not accepted, including an undecodable body, is
/// answered with the rejection verdict.
#[post("/receive_blockchain")]
pub async fn receive_blockchain(node: web::Data<Node>, body: web::Bytes) -> impl Responder {
    let verdict = match serde_json::from_slice::<LedgerSnapshot>(&body) {
        Ok(snapshot) => {
            if node.update_blockchain(snapshot) {
                BLOCKCHAIN_RECEIVED
            } else {
                BLOCKCHAIN_REJECTED
            }
        }
        Err(e) => {
            warn!("undecodable chain push: {e}");
            BLOCKCHAIN_REJECTED
        }
    };
    HttpResponse::Ok().body(verdict)
}

#[post("/receive_transaction")]
pub async fn receive_transaction(
    node: web::Data<Node>,
    body: web::Json<Transaction>,
) -> impl Responder {
    node.update_transaction(body.into_inner());
    HttpResponse::Ok().body(TRANSACTION_RECEIVED)
}

#[delete("/disconnect_node")]
pub async fn disconnect_node(node: web::Data<Node>, req: HttpRequest) -> impl Responder {
    let identity = header(&req, IDENTITY_HEADER).unwrap_or_default();
    if node.gossip().directory().remove(identity) {
        info!("peer {identity} left the network");
        HttpResponse::Ok().body(NODE_DISCONNECTED)
    } else {
        HttpResponse::Ok().body(NODE_NOT_FOUND)
    }
}

/// Passive discovery: a caller with an unknown identity is recorded at its
/// observed IP and the port it says it listens on.
fn discover(node: &Node, req: &HttpRequest) {
    let Some(identity) = header(req, IDENTITY_HEADER) else {
        return;
    };
    let Some(port) = header(req, PORT_HEADER).and_then(|p| p.parse::<u16>().ok()) else {
        debug!("caller {identity} sent no usable port header");
        return;
    };
    let Some(observed) = req.peer_addr() else {
        return;
    };

    let url = SocketAddr::new(observed.ip(), port).to_string();
    if node.gossip().directory().observe(identity, &url) {
        info!("discovered peer {identity} at {url}");
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::init_routes;
    use crate::blockchain::{Blockchain, MiningStatus};
    use crate::config::{NodeConfig, NodeRole};
    use crate::node::LogSubscriber;
    use actix_web::{App, test};

    fn node() -> web::Data<Node> {
        let mut config = NodeConfig::new("wire-tests", NodeRole::User, 5000);
        config.difficulty = 1;
        let node = Node::new(&config, Box::new(LogSubscriber)).unwrap();
        node.gossip().directory().insert(node.identity(), "127.0.0.1:5000");
        web::Data::new(node)
    }

    fn mined(blocks: usize) -> LedgerSnapshot {
        let status = MiningStatus::new();
        let mut bc = Blockchain::new(1, 10.0);
        for _ in 0..blocks {
            assert!(status.try_start());
            assert!(bc.mine_block("remote", &status));
            status.finish();
        }
        bc.snapshot()
    }

    async fn text(resp: actix_web::dev::ServiceResponse) -> String {
        String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn get_network_records_unknown_caller() {
        let node = node();
        let app = test::init_service(App::new().app_data(node.clone()).configure(init_routes)).await;

        let req = test::TestRequest::get()
            .uri("/get_network")
            .insert_header((IDENTITY_HEADER, "newcomer"))
            .insert_header((PORT_HEADER, "6001"))
            .peer_addr("10.0.0.7:41234".parse().unwrap())
            .to_request();
        let peers: Vec<crate::p2p::Peer> = test::call_and_read_body_json(&app, req).await;

        // The listing is taken after discovery, so the caller sees itself.
        assert!(peers.iter().any(|p| p.identity == "newcomer" && p.url == "10.0.0.7:6001"));
        assert!(node.validate_connection());
    }

    #[actix_web::test]
    async fn known_caller_keeps_its_address() {
        let node = node();
        node.gossip().directory().insert("old", "192.168.1.2:7000");
        let app = test::init_service(App::new().app_data(node.clone()).configure(init_routes)).await;

        let req = test::TestRequest::get()
            .uri("/get_blockchain")
            .insert_header((IDENTITY_HEADER, "old"))
            .insert_header((PORT_HEADER, "9999"))
            .peer_addr("10.0.0.8:50000".parse().unwrap())
            .to_request();
        let snapshot: LedgerSnapshot = test::call_and_read_body_json(&app, req).await;

        assert_eq!(snapshot.length, 1);
        let old = node
            .gossip()
            .directory()
            .peers()
            .into_iter()
            .find(|p| p.identity == "old")
            .unwrap();
        assert_eq!(old.url, "192.168.1.2:7000");
    }

    #[actix_web::test]
    async fn rejected_pushes_leave_state_unchanged() {
        let node = node();
        let app = test::init_service(App::new().app_data(node.clone()).configure(init_routes)).await;
        let before = node.snapshot();

        let mut forged = mined(3);
        forged.chain[2].transactions.clear();
        let pushes = vec![
            serde_json::to_vec(&mined(0)).unwrap(),
            serde_json::to_vec(&forged).unwrap(),
            b"{not json".to_vec(),
        ];
        for body in pushes {
            let req = test::TestRequest::post()
                .uri("/receive_blockchain")
                .set_payload(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
            assert_eq!(text(resp).await, BLOCKCHAIN_REJECTED);
        }
        assert_eq!(node.snapshot(), before);
    }

    #[actix_web::test]
    async fn longer_push_is_adopted() {
        let node = node();
        let app = test::init_service(App::new().app_data(node.clone()).configure(init_routes)).await;
        let remote = mined(2);

        let req = test::TestRequest::post()
            .uri("/receive_blockchain")
            .set_json(&remote)
            .to_request();
        assert_eq!(text(test::call_service(&app, req).await).await, BLOCKCHAIN_RECEIVED);
        assert_eq!(node.snapshot(), remote);
    }

    #[actix_web::test]
    async fn transaction_push_lands_in_mempool() {
        let node = node();
        let app = test::init_service(App::new().app_data(node.clone()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/receive_transaction")
            .set_json(Transaction::transfer("a", "b", 4.0))
            .to_request();
        assert_eq!(text(test::call_service(&app, req).await).await, TRANSACTION_RECEIVED);
        assert_eq!(node.snapshot().mempool, vec![Transaction::transfer("a", "b", 4.0)]);
    }

    #[actix_web::test]
    async fn disconnect_removes_by_identity() {
        let node = node();
        node.gossip().directory().insert("leaving", "10.0.0.9:5000");
        let app = test::init_service(App::new().app_data(node.clone()).configure(init_routes)).await;

        for expected in [NODE_DISCONNECTED, NODE_NOT_FOUND] {
            let req = test::TestRequest::delete()
                .uri("/disconnect_node")
                .insert_header((IDENTITY_HEADER, "leaving"))
                .to_request();
            assert_eq!(text(test::call_service(&app, req).await).await, expected);
        }
        assert!(!node.gossip().directory().contains("leaving"));
    }
}

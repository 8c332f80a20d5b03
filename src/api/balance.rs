use actix_web::{HttpResponse, Responder, get, web};

use super::models::BalanceResponse;
use crate::node::Node;

#[get("/balance/{identity}/")]
pub async fn get_balance(node: web::Data<Node>, path: web::Path<(String,)>) -> impl Responder {
    let identity = path.into_inner().0;
    let balance = node.balance(&identity);
    HttpResponse::Ok().json(BalanceResponse { identity, balance })
}

use actix_web::{HttpResponse, Responder, post};
use log::error;

use super::models::NewWalletResponse;
use crate::wallet::{generate_seed_phrase, identity_from_seed};

/// Fresh seed phrase plus the identity it maps to. Nothing is stored.
#[post("/wallet/new/")]
pub async fn create_wallet() -> impl Responder {
    let seed_phrase = generate_seed_phrase();
    match identity_from_seed(&seed_phrase) {
        Ok(identity) => HttpResponse::Ok().json(NewWalletResponse {
            seed_phrase,
            identity,
        }),
        Err(e) => {
            error!("POST /wallet/new/ - {e}");
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

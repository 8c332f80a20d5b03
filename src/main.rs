use actix_web::{App, HttpServer, rt, web};
use dotenvy::dotenv;
use log::{info, warn};
use std::time::Duration;

use itcoin::api;
use itcoin::config::{NodeConfig, NodeRole};
use itcoin::error::Result;
use itcoin::node::{LogSubscriber, Node};

/// How long an auto-miner waits before retrying while it has no peers.
const IDLE_MINER_PAUSE: Duration = Duration::from_secs(2);

#[actix_web::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env()?;
    let node = web::Data::new(Node::new(&config, Box::new(LogSubscriber))?);
    info!(
        "⛓️ Starting ITcoin {} node at http://{}:{} (identity {})",
        node.role(),
        config.host,
        config.port,
        node.identity()
    );

    let state = node.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .disable_signals()
    .bind((config.host.as_str(), config.port))?
    .run();
    let handle = server.handle();
    let server = rt::spawn(server);

    match node.connect().await {
        Ok(learned) => info!("joined the network, {learned} new peers"),
        Err(e) => warn!("bootstrap via {} failed: {e}", config.bootstrap_addr),
    }
    if node.get_blockchain().await {
        info!("adopted a longer chain from the network");
    }

    if node.role() == NodeRole::Miner && config.auto_mine {
        let miner = node.clone();
        rt::spawn(async move { miner.mine_forever(IDLE_MINER_PAUSE).await });
    }

    rt::signal::ctrl_c().await?;
    info!("shutting down");
    node.shutdown().await;
    handle.stop(true).await;
    if let Ok(Err(e)) = server.await {
        return Err(e.into());
    }
    Ok(())
}

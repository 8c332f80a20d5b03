//! HTTP client for the peer wire protocol.

use log::debug;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::directory::Peer;
use crate::blockchain::LedgerSnapshot;
use crate::error::PeerError;
use crate::transaction::Transaction;

/// Header carrying the caller's identity.
pub const IDENTITY_HEADER: &str = "identity";
/// Header carrying the port the caller listens on.
pub const PORT_HEADER: &str = "port";

/// Connection timeout; the overall per-call bound comes from config.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Outbound side of the protocol. Every call targets one peer address
/// (`host:port`) and is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct PeerClient {
    http: reqwest::Client,
    identity: String,
    port: u16,
}

impl PeerClient {
    pub fn new(identity: impl Into<String>, port: u16, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()?;
        Ok(Self {
            http,
            identity: identity.into(),
            port,
        })
    }

    /// `GET /get_network`: the peer's directory.
    pub async fn get_network(&self, addr: &str) -> Result<Vec<Peer>, PeerError> {
        let request = self.identified(self.http.get(url(addr, "get_network")));
        let response = request.send().await.map_err(|e| unreachable(addr, e))?;
        read_json(addr, response).await
    }

    /// `GET /get_blockchain`: the peer's full ledger snapshot.
    pub async fn get_blockchain(&self, addr: &str) -> Result<LedgerSnapshot, PeerError> {
        let request = self.identified(self.http.get(url(addr, "get_blockchain")));
        let response = request.send().await.map_err(|e| unreachable(addr, e))?;
        read_json(addr, response).await
    }

    /// `POST /receive_blockchain`; returns the peer's verdict text.
    pub async fn send_blockchain(&self, addr: &str, snapshot: &LedgerSnapshot) -> Result<String, PeerError> {
        let response = self
            .http
            .post(url(addr, "receive_blockchain"))
            .json(snapshot)
            .send()
            .await
            .map_err(|e| unreachable(addr, e))?;
        read_text(addr, response).await
    }

    /// `POST /receive_transaction`.
    pub async fn send_transaction(&self, addr: &str, tx: &Transaction) -> Result<String, PeerError> {
        let response = self
            .http
            .post(url(addr, "receive_transaction"))
            .json(tx)
            .send()
            .await
            .map_err(|e| unreachable(addr, e))?;
        read_text(addr, response).await
    }

    /// `DELETE /disconnect_node`: ask the peer to forget us.
    pub async fn disconnect(&self, addr: &str) -> Result<String, PeerError> {
        let request = self.identified(self.http.delete(url(addr, "disconnect_node")));
        let response = request.send().await.map_err(|e| unreachable(addr, e))?;
        read_text(addr, response).await
    }

    fn identified(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(IDENTITY_HEADER, self.identity.as_str())
            .header(PORT_HEADER, self.port.to_string())
    }
}

fn url(addr: &str, path: &str) -> String {
    format!("http://{}/{}", addr.trim_end_matches('/'), path)
}

fn unreachable(addr: &str, e: reqwest::Error) -> PeerError {
    let reason = if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    PeerError::Unreachable {
        peer: addr.to_string(),
        reason,
    }
}

fn check_status(addr: &str, response: &reqwest::Response) -> Result<(), PeerError> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(PeerError::Status {
        peer: addr.to_string(),
        status: response.status().as_u16(),
    })
}

async fn read_json<T: DeserializeOwned>(addr: &str, response: reqwest::Response) -> Result<T, PeerError> {
    check_status(addr, &response)?;
    response.json().await.map_err(|e| PeerError::InvalidResponse {
        peer: addr.to_string(),
        reason: e.to_string(),
    })
}

async fn read_text(addr: &str, response: reqwest::Response) -> Result<String, PeerError> {
    check_status(addr, &response)?;
    let text = response.text().await.map_err(|e| unreachable(addr, e))?;
    debug!("{addr} answered {text:?}");
    Ok(text)
}

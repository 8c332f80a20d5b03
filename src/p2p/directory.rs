use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// A known node: where to reach it and who it claims to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub url: String,
    pub identity: String,
}

/// Identity -> address map shared by the listener and local operations.
///
/// The node's own entry lives here too (so it is handed out to newcomers),
/// but it never counts as a connection and is skipped by every broadcast.
#[derive(Debug)]
pub struct PeerDirectory {
    self_identity: String,
    peers: Mutex<HashMap<String, String>>,
}

impl PeerDirectory {
    pub fn new(self_identity: impl Into<String>) -> Self {
        Self {
            self_identity: self_identity.into(),
            peers: Mutex::new(HashMap::new()),
        }
    }

    pub fn self_identity(&self) -> &str {
        &self.self_identity
    }

    /// Insert or refresh a peer's address. Returns `true` if it was unknown.
    pub fn insert(&self, identity: &str, url: &str) -> bool {
        let mut peers = self.peers.lock().expect("mutex poisoned");
        peers.insert(identity.to_string(), url.to_string()).is_none()
    }

    /// Passive discovery: record the peer only if its identity is unknown.
    pub fn observe(&self, identity: &str, url: &str) -> bool {
        let mut peers = self.peers.lock().expect("mutex poisoned");
        if peers.contains_key(identity) {
            return false;
        }
        peers.insert(identity.to_string(), url.to_string());
        true
    }

    pub fn remove(&self, identity: &str) -> bool {
        let mut peers = self.peers.lock().expect("mutex poisoned");
        peers.remove(identity).is_some()
    }

    pub fn contains(&self, identity: &str) -> bool {
        let peers = self.peers.lock().expect("mutex poisoned");
        peers.contains_key(identity)
    }

    /// Every entry, self included, ordered by identity.
    pub fn peers(&self) -> Vec<Peer> {
        let peers = self.peers.lock().expect("mutex poisoned");
        let mut list: Vec<Peer> = peers
            .iter()
            .map(|(identity, url)| Peer {
                url: url.clone(),
                identity: identity.clone(),
            })
            .collect();
        list.sort_by(|a, b| a.identity.cmp(&b.identity));
        list
    }

    /// Every entry except ourselves: the targets of polls and broadcasts.
    pub fn others(&self) -> Vec<Peer> {
        self.peers()
            .into_iter()
            .filter(|p| p.identity != self.self_identity)
            .collect()
    }

    /// Connected = at least one known peer besides ourselves.
    pub fn is_connected(&self) -> bool {
        let peers = self.peers.lock().expect("mutex poisoned");
        peers.keys().any(|id| *id != self.self_identity)
    }
}

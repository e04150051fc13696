use serde::Serialize;

use crate::coord::Revision;

/// Ordered list of peer endpoints, stored in the coordination record as a single
/// space-separated string.
///
/// Entries are unique. Parsing drops repeats, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerSet {
    peers: Vec<String>,
}

impl PeerSet {
    pub fn parse(value: &str) -> Self {
        let mut set = Self::default();
        for peer in value.split_whitespace() {
            set.add(peer);
        }
        set
    }

    pub fn to_value(&self) -> String {
        self.peers.join(" ")
    }

    /// Appends `peer` unless it is already present.
    pub fn add(&mut self, peer: &str) -> bool {
        if self.contains(peer) {
            return false;
        }
        self.peers.push(peer.to_string());
        true
    }

    /// Removes the first occurrence of `peer`; the remaining order is untouched.
    pub fn remove_first(&mut self, peer: &str) -> bool {
        match self.peers.iter().position(|p| p == peer) {
            Some(idx) => {
                self.peers.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, peer: &str) -> bool {
        self.peers.iter().any(|p| p == peer)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipState {
    Joining,
    /// Registered; the watcher keeps the routing table current.
    Active,
    /// Registration was rejected. The node serves with the peers it fetched but
    /// does not watch for changes.
    Unregistered,
    Leaving,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    Idle,
    Running,
    /// The store connection was lost; no further updates will arrive.
    Closed,
}

/// Point-in-time copy of what membership knows.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipView {
    pub state: MembershipState,
    pub watch: WatchState,
    pub revision: Revision,
    pub peers: Vec<String>,
}

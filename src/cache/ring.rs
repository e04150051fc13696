//! Consistent hash ring.
//!
//! Each peer is placed on a 32-bit ring at `replicas` points, `crc32(i ++ peer)` for
//! `i in 0..replicas`. A key belongs to the first point at or after `crc32(key)`,
//! wrapping around. Adding a peer only steals the arcs in front of its own points, so
//! keys move only to the new peer.

pub const DEFAULT_REPLICAS: usize = 50;

#[derive(Debug, Clone)]
pub struct HashRing {
    replicas: usize,
    peers: Vec<String>,
    /// `(hash, index into peers)`, sorted by hash then by peer name.
    points: Vec<(u32, usize)>,
}

impl HashRing {
    pub fn new(replicas: usize) -> Self {
        Self {
            replicas: replicas.max(1),
            peers: Vec::new(),
            points: Vec::new(),
        }
    }

    pub fn with_peers<S: AsRef<str>>(replicas: usize, peers: &[S]) -> Self {
        let mut ring = Self::new(replicas);
        for peer in peers {
            ring.add(peer.as_ref());
        }
        ring.sort();
        ring
    }

    fn add(&mut self, peer: &str) {
        if self.peers.iter().any(|existing| existing == peer) {
            return;
        }

        let index = self.peers.len();
        self.peers.push(peer.to_string());
        for i in 0..self.replicas {
            let hash = crc32fast::hash(format!("{}{}", i, peer).as_bytes());
            self.points.push((hash, index));
        }
    }

    fn sort(&mut self) {
        let peers = &self.peers;
        self.points
            .sort_by(|a, b| a.0.cmp(&b.0).then_with(|| peers[a.1].cmp(&peers[b.1])));
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    /// The peer owning `key`, or `None` on an empty ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.points.is_empty() {
            return None;
        }

        let hash = crc32fast::hash(key.as_bytes());
        let idx = self.points.partition_point(|(point, _)| *point < hash);
        let (_, peer) = self.points[idx % self.points.len()];

        Some(self.peers[peer].as_str())
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS)
    }
}

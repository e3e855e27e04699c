//! Consistent Hash Module
//!
//! Maps cache keys to owning peers using virtual nodes on a hash ring.

use std::collections::HashMap;
use std::fmt;

/// Hash used to place virtual nodes and keys on the ring.
pub type HashFn = fn(&[u8]) -> u32;

/// Default ring hash, a 32-bit CRC.
pub fn default_hash(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

// == Hash Ring ==
/// Consistent hash ring of peer addresses.
///
/// Each peer occupies `replicas` virtual nodes placed at `hash(i ++ peer)`.
/// A key belongs to the first virtual node at or after its own hash,
/// wrapping around to the smallest. Not synchronized; callers guard it.
#[derive(Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Sorted virtual node hashes
    keys: Vec<u32>,
    /// Virtual node hash to peer address
    owners: HashMap<u32, String>,
}

impl HashRing {
    // == Constructor ==
    /// Creates an empty ring, using `default_hash` when `hash` is `None`.
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            hash: hash.unwrap_or(default_hash),
            replicas,
            keys: Vec::new(),
            owners: HashMap::new(),
        }
    }

    // == Add ==
    /// Places every peer's virtual nodes on the ring, sorting once at the end.
    pub fn add<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let hash = (self.hash)(format!("{i}{peer}").as_bytes());
                self.keys.push(hash);
                self.owners.insert(hash, peer.to_string());
            }
        }
        self.keys.sort_unstable();
    }

    // == Get ==
    /// Returns the peer owning `key`, or `None` for an empty key or ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if key.is_empty() || self.keys.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        let idx = self.keys.partition_point(|&node| node < hash);
        let node = self.keys[idx % self.keys.len()];
        self.owners.get(&node).map(String::as_str)
    }

    /// Returns the number of virtual nodes on the ring.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("virtual_nodes", &self.keys.len())
            .finish()
    }
}

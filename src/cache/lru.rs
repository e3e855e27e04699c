//! LRU Cache Module
//!
//! Byte-bounded Least Recently Used cache with an eviction callback.

use std::collections::HashMap;
use std::fmt;

use crate::cache::SizedValue;

/// Called once per evicted entry, in eviction order.
pub type EvictionCallback<V> = Box<dyn FnMut(&str, &V) + Send>;

#[derive(Debug)]
struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Cache ==
/// Tracks entries in recency order and evicts from the least recently used
/// end once the occupied size exceeds `max_bytes`.
///
/// Nodes live in a dense `Vec` and link to each other by index:
/// - `head` = Most recently used
/// - `tail` = Least recently used
///
/// The occupied size of an entry is `key.len() + value.size()`. A
/// `max_bytes` of 0 disables eviction.
pub struct LruCache<V> {
    /// Byte budget, 0 = unbounded
    max_bytes: usize,
    /// Bytes currently occupied by keys and values
    nbytes: usize,
    /// Node storage, addressed by index
    nodes: Vec<Node<V>>,
    /// Key to node index
    index: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V: SizedValue> LruCache<V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `max_bytes` (0 = unbounded).
    pub fn new(max_bytes: usize, on_evicted: Option<EvictionCallback<V>>) -> Self {
        Self {
            max_bytes,
            nbytes: 0,
            nodes: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            on_evicted,
        }
    }

    // == Get ==
    /// Looks up a key and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        Some(&self.nodes[idx].value)
    }

    // == Add ==
    /// Inserts or replaces a value, marks it most recently used, then evicts
    /// from the tail until the byte budget holds.
    ///
    /// The entry just written is never evicted, even if it alone exceeds the
    /// budget.
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();

        if let Some(&idx) = self.index.get(&key) {
            let old_size = self.nodes[idx].value.size();
            self.nbytes = self.nbytes - old_size + value.size();
            self.nodes[idx].value = value;
            self.move_to_front(idx);
        } else {
            self.nbytes += key.len() + value.size();
            let idx = self.nodes.len();
            self.index.insert(key.clone(), idx);
            self.nodes.push(Node {
                key,
                value,
                prev: None,
                next: None,
            });
            self.attach_front(idx);
        }

        while self.max_bytes != 0 && self.nbytes > self.max_bytes && self.nodes.len() > 1 {
            self.remove_oldest();
        }
    }

    // == Remove Oldest ==
    /// Evicts the least recently used entry, firing the eviction callback.
    pub fn remove_oldest(&mut self) -> Option<(String, V)> {
        let idx = self.tail?;
        let node = self.remove_at(idx);
        self.nbytes -= node.key.len() + node.value.size();

        if let Some(callback) = self.on_evicted.as_mut() {
            callback(&node.key, &node.value);
        }
        Some((node.key, node.value))
    }

    // == Length ==
    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the bytes currently occupied by keys and values.
    pub fn size_bytes(&self) -> usize {
        self.nbytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    // == Contains ==
    /// Checks residency without touching recency order.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }

        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        self.nodes[idx].prev = None;
        self.nodes[idx].next = old_head;

        match old_head {
            Some(h) => self.nodes[h].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    /// Unlinks and removes the node at `idx`, moving the last node into the
    /// freed slot so storage stays dense.
    fn remove_at(&mut self, idx: usize) -> Node<V> {
        self.detach(idx);
        let node = self.nodes.swap_remove(idx);
        self.index.remove(&node.key);

        let moved_from = self.nodes.len();
        if idx < moved_from {
            // The former last node now lives at `idx`; repoint its neighbours
            let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
            match prev {
                Some(p) => self.nodes[p].next = Some(idx),
                None => self.head = Some(idx),
            }
            match next {
                Some(n) => self.nodes[n].prev = Some(idx),
                None => self.tail = Some(idx),
            }
            if let Some(slot) = self.index.get_mut(&self.nodes[idx].key) {
                *slot = idx;
            }
        }

        node
    }

    /// Keys from most to least recently used.
    #[cfg(test)]
    fn keys_by_recency(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            keys.push(self.nodes[idx].key.clone());
            cursor = self.nodes[idx].next;
        }
        keys
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("max_bytes", &self.max_bytes)
            .field("nbytes", &self.nbytes)
            .field("len", &self.nodes.len())
            .finish()
    }
}

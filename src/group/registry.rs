//! Group Registry Module
//!
//! Name-to-group lookup shared by the peer server and application code.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::group::{Group, Loader};

// == Group Registry ==
/// Registered groups by name.
///
/// Lookups take a shared lock; only registration is exclusive. Pass one
/// registry to every component of a node instead of relying on global state.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == New Group ==
    /// Creates a group and registers it under `name`, replacing any group
    /// already registered under that name.
    pub fn new_group(
        &self,
        name: impl Into<String>,
        cache_bytes: usize,
        loader: Arc<dyn Loader>,
    ) -> Arc<Group> {
        let group = Arc::new(Group::new(name, cache_bytes, loader));
        self.register(Arc::clone(&group));
        group
    }

    /// Registers an existing group under its own name (last write wins).
    pub fn register(&self, group: Arc<Group>) {
        self.groups
            .write()
            .insert(group.name().to_string(), group);
    }

    // == Get Group ==
    pub fn get_group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All registered groups, sorted by name.
    pub fn groups(&self) -> Vec<Arc<Group>> {
        let mut groups: Vec<Arc<Group>> = self.groups.read().values().cloned().collect();
        groups.sort_by(|a, b| a.name().cmp(b.name()));
        groups
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

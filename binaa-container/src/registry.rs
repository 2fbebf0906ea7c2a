//! Provider registry: maps each key to the nodes that produce it.
//!
//! Singleton keys hold at most one node once registration commits;
//! group keys hold every contributor in registration order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::key::DependencyKey;
use crate::node::Node;

/// Stores the providers of every key.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    providers: HashMap<DependencyKey, Vec<Arc<Node>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `node` to the providers of `key`.
    ///
    /// Returns the previous provider list so the caller can restore it.
    pub fn register(&mut self, key: DependencyKey, node: Arc<Node>) -> Vec<Arc<Node>> {
        let providers = self.providers.entry(key.clone()).or_default();
        let previous = providers.clone();
        providers.push(node);
        debug!(key = %key, providers = providers.len(), "Registered provider");
        previous
    }

    /// Puts back a provider list saved by [`register`](Self::register).
    /// An empty list removes the key entirely.
    pub fn restore(&mut self, key: DependencyKey, previous: Vec<Arc<Node>>) {
        trace!(key = %key, "Restoring providers");
        if previous.is_empty() {
            self.providers.remove(&key);
        } else {
            self.providers.insert(key, previous);
        }
    }

    /// Providers of `key`, empty when none are registered.
    pub fn get(&self, key: &DependencyKey) -> &[Arc<Node>] {
        self.providers.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns all keys with providers.
    pub fn registered_keys(&self) -> Vec<DependencyKey> {
        self.providers.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DependencyKey, &[Arc<Node>])> {
        self.providers.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Returns the number of keys with providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructor::{FnConstructor, Outputs};
    use crate::location::Location;
    use crate::options::ProvideOptions;
    use crate::result::ResultItem;

    struct Database;

    fn node(order: usize) -> Arc<Node> {
        let ctor = FnConstructor::new(|_| Ok(Outputs::new().with(42i32)))
            .result(ResultItem::of::<i32>());
        Arc::new(
            Node::build(
                Arc::new(ctor),
                order,
                Location::caller("answer"),
                &ProvideOptions::default(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn register_and_get() {
        let mut reg = Registry::new();
        let key = DependencyKey::of::<Database>();
        let previous = reg.register(key.clone(), node(0));
        assert!(previous.is_empty());
        assert_eq!(reg.get(&key).len(), 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn group_keys_append_in_order() {
        let mut reg = Registry::new();
        let key = DependencyKey::grouped::<Database>("dbs");
        let first = node(0);
        let second = node(1);
        reg.register(key.clone(), first.clone());
        let previous = reg.register(key.clone(), second.clone());
        assert_eq!(previous.len(), 1);
        let providers = reg.get(&key);
        assert!(Arc::ptr_eq(&providers[0], &first));
        assert!(Arc::ptr_eq(&providers[1], &second));
    }

    #[test]
    fn restore_empty_removes_key() {
        let mut reg = Registry::new();
        let key = DependencyKey::of::<Database>();
        let previous = reg.register(key.clone(), node(0));
        reg.restore(key.clone(), previous);
        assert!(reg.get(&key).is_empty());
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn unknown_key_has_no_providers() {
        let reg = Registry::new();
        assert!(reg.get(&DependencyKey::of::<Database>()).is_empty());
        assert!(reg.registered_keys().is_empty());
    }
}

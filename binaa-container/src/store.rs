//! Value storage used while invoking constructors.
//!
//! [`ContainerStore`] is what a node sees during invocation: the
//! providers of each key (read only) and the values built so far.

use std::fmt;
use std::sync::Arc;

use binaa_support::rendering::{Candidate, suggest_similar};
use dashmap::DashMap;
use tracing::trace;

use crate::constructor::Value;
use crate::key::DependencyKey;
use crate::node::Node;

/// Registration state and built values, as seen by invocation.
pub trait ContainerStore {
    /// Providers registered for `key`, in registration order.
    fn providers(&self, key: &DependencyKey) -> &[Arc<Node>];

    /// Every key with at least one provider.
    fn registered_keys(&self) -> Vec<DependencyKey>;

    fn value(&self, key: &DependencyKey) -> Option<Value>;

    fn set_value(&self, key: DependencyKey, value: Value);

    fn group_values(&self, key: &DependencyKey) -> Vec<Value>;

    fn submit_group_value(&self, key: DependencyKey, value: Value);
}

/// Close matches for a missing key among registered keys.
pub(crate) fn suggestions(store: &dyn ContainerStore, key: &DependencyKey) -> Vec<String> {
    let registered = store.registered_keys();
    let available: Vec<Candidate<'_>> = registered.iter().map(candidate).collect();
    suggest_similar(&candidate(key), &available, 3)
}

fn candidate(key: &DependencyKey) -> Candidate<'_> {
    Candidate {
        type_name: key.type_name(),
        qualifier: key.name().or(key.group()).unwrap_or_default(),
        grouped: key.is_group(),
        label: key.to_string(),
    }
}

/// Built values: one per singleton key, a list per group key.
#[derive(Default)]
pub struct ValueStore {
    values: DashMap<DependencyKey, Value>,
    groups: DashMap<DependencyKey, Vec<Value>>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DependencyKey) -> Option<Value> {
        self.values.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: DependencyKey, value: Value) {
        trace!(key = %key, "Stored value");
        self.values.insert(key, value);
    }

    pub fn group(&self, key: &DependencyKey) -> Vec<Value> {
        self.groups
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn push_group(&self, key: DependencyKey, value: Value) {
        trace!(key = %key, "Appended group value");
        self.groups.entry(key).or_default().push(value);
    }

    /// Number of singleton values built so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.groups.is_empty()
    }
}

impl fmt::Debug for ValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStore")
            .field("values", &self.values.len())
            .field("groups", &self.groups.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_and_groups_are_separate() {
        let store = ValueStore::new();
        assert!(store.is_empty());

        store.insert(DependencyKey::of::<u8>(), Arc::new(1u8));
        store.push_group(DependencyKey::grouped::<u8>("g"), Arc::new(2u8));
        store.push_group(DependencyKey::grouped::<u8>("g"), Arc::new(3u8));

        assert_eq!(store.len(), 1);
        let single = store.get(&DependencyKey::of::<u8>()).unwrap();
        assert_eq!(single.downcast_ref::<u8>(), Some(&1));

        let group: Vec<u8> = store
            .group(&DependencyKey::grouped::<u8>("g"))
            .iter()
            .filter_map(|v| v.downcast_ref::<u8>().copied())
            .collect();
        assert_eq!(group, vec![2, 3]);
        assert!(store.group(&DependencyKey::grouped::<u8>("other")).is_empty());
    }
}

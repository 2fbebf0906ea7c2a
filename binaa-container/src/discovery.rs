//! Which keys a new constructor would provide.
//!
//! Walks the result tree of a node, records the path each key came
//! from, and rejects singleton keys that already have a producer,
//! either elsewhere in the same constructor or in the registry.

use std::collections::HashMap;
use std::ops::ControlFlow;

use binaa_support::rendering::render_path;
use tracing::trace;

use crate::error::{BinaaError, ConflictSource, KeyConflictError, Result};
use crate::key::DependencyKey;
use crate::node::Node;
use crate::provider::Provider;
use crate::registry::Registry;
use crate::result::{ResultItem, ResultVisitor};

/// Returns every distinct key the node provides, in discovery order.
///
/// Group keys never conflict. When one group key shows up at several
/// paths, the last path is the one remembered.
pub(crate) fn find_and_validate_results(
    registry: &Registry,
    node: &Node,
) -> Result<Vec<DependencyKey>> {
    let mut visitor = ConnectionVisitor {
        registry,
        key_paths: HashMap::new(),
        keys: Vec::new(),
        err: None,
    };
    node.result_list().walk(&mut visitor);

    if let Some(err) = visitor.err {
        return Err(err);
    }
    Ok(visitor.keys)
}

struct ConnectionVisitor<'r> {
    registry: &'r Registry,
    /// Path each key was produced at, within this constructor
    key_paths: HashMap<DependencyKey, String>,
    keys: Vec<DependencyKey>,
    err: Option<BinaaError>,
}

impl ConnectionVisitor<'_> {
    fn check_key(&self, key: &DependencyKey, path: &str) -> Result<()> {
        if let Some(previous) = self.key_paths.get(key) {
            return Err(BinaaError::KeyConflict(KeyConflictError {
                key: key.clone(),
                path: path.to_string(),
                conflict: ConflictSource::SameConstructor {
                    path: previous.clone(),
                },
            }));
        }

        let providers = self.registry.get(key);
        if !providers.is_empty() {
            return Err(BinaaError::KeyConflict(KeyConflictError {
                key: key.clone(),
                path: path.to_string(),
                conflict: ConflictSource::Registered {
                    locations: providers.iter().map(|p| p.location().clone()).collect(),
                },
            }));
        }
        Ok(())
    }

    fn record(&mut self, key: DependencyKey, path: String) {
        trace!(key = %key, path = %path, "Discovered result");
        if self.key_paths.insert(key.clone(), path).is_none() {
            self.keys.push(key);
        }
    }
}

impl ResultVisitor for ConnectionVisitor<'_> {
    fn visit(&mut self, leaf: &ResultItem, path: &[String]) -> ControlFlow<()> {
        let path = render_path(path);
        match leaf {
            ResultItem::Single { .. } => {
                for key in leaf.keys() {
                    if let Err(err) = self.check_key(&key, &path) {
                        self.err = Some(err);
                        return ControlFlow::Break(());
                    }
                    self.record(key, path.clone());
                }
            }
            ResultItem::Grouped { .. } => {
                for key in leaf.keys() {
                    self.record(key, path.clone());
                }
            }
            ResultItem::Object { .. } => {}
        }
        ControlFlow::Continue(())
    }
}

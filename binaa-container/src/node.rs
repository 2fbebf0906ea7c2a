//! Constructor nodes of the dependency graph.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::constructor::{Argument, Arguments, Constructor, Value};
use crate::error::{BinaaError, NotRegisteredError, Result};
use crate::key::DependencyKey;
use crate::location::Location;
use crate::options::ProvideOptions;
use crate::param::{ParamLeaf, ParamList};
use crate::provider::Provider;
use crate::result::{ResultLeaf, ResultList, ResultOptions};
use crate::store::{ContainerStore, suggestions};

static NEXT_NODE_ID: AtomicUsize = AtomicUsize::new(1);

/// Unique identifier of a constructor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered constructor with its signature and graph position.
///
/// Immutable once committed, apart from the invocation cache.
pub struct Node {
    id: NodeId,
    order: usize,
    location: Location,
    params: ParamList,
    results: ResultList,
    ctor: Arc<dyn Constructor>,
    called: OnceCell<()>,
}

impl Node {
    /// Builds a node at graph position `order`: asks the constructor for
    /// its signature and applies name/group/As options to its results.
    pub(crate) fn build(
        ctor: Arc<dyn Constructor>,
        order: usize,
        location: Location,
        opts: &ProvideOptions,
    ) -> Result<Self> {
        let signature = ctor.describe()?;
        let mut results = signature.results;
        results.apply_options(&ResultOptions {
            name: &opts.name,
            group: &opts.group,
            as_types: &opts.as_types,
        })?;

        Ok(Self {
            id: NodeId::next(),
            order,
            location,
            params: signature.params,
            results,
            ctor,
            called: OnceCell::new(),
        })
    }

    /// Whether the constructor has been called successfully.
    pub fn is_called(&self) -> bool {
        self.called.get().is_some()
    }

    fn call_once(&self, store: &dyn ContainerStore) -> Result<()> {
        let mut args = Vec::new();
        for leaf in self.params.leaves() {
            match leaf {
                ParamLeaf::Single { key, optional } => {
                    args.push(Argument::Single(self.resolve_single(store, &key, optional)?));
                }
                ParamLeaf::Grouped { key } => {
                    for provider in store.providers(&key) {
                        provider.invoke(store)?;
                    }
                    args.push(Argument::Group(store.group_values(&key)));
                }
            }
        }

        debug!(id = %self.id, location = %self.location, "Calling constructor");
        let outputs = self
            .ctor
            .call(&mut Arguments::new(args))
            .map_err(|source| BinaaError::ConstructionFailed {
                location: self.location.clone(),
                source,
            })?;

        let values = outputs.into_values();
        let leaves = self.results.leaves();
        if values.len() != leaves.len() {
            return Err(BinaaError::ConstructionFailed {
                location: self.location.clone(),
                source: format!(
                    "constructor returned {} values, expected {}",
                    values.len(),
                    leaves.len()
                )
                .into(),
            });
        }

        // Nothing is stored until every interface conversion succeeded.
        let mut singles = Vec::with_capacity(values.len());
        let mut grouped = Vec::new();
        for (leaf, value) in leaves.into_iter().zip(values) {
            match leaf {
                ResultLeaf::Single { key, as_keys } => {
                    for (as_key, interface) in as_keys {
                        let cast = interface.upcast(&value).ok_or_else(|| {
                            BinaaError::ConstructionFailed {
                                location: self.location.clone(),
                                source: format!(
                                    "value for {key} is not a {}, cannot provide it as {}",
                                    interface.source(),
                                    interface.target()
                                )
                                .into(),
                            }
                        })?;
                        singles.push((as_key, cast));
                    }
                    singles.push((key, value));
                }
                ResultLeaf::Grouped { key } => grouped.push((key, value)),
            }
        }

        for (key, value) in singles {
            store.set_value(key, value);
        }
        for (key, value) in grouped {
            store.submit_group_value(key, value);
        }
        Ok(())
    }

    fn resolve_single(
        &self,
        store: &dyn ContainerStore,
        key: &DependencyKey,
        optional: bool,
    ) -> Result<Option<Value>> {
        if let Some(value) = store.value(key) {
            return Ok(Some(value));
        }

        let providers = store.providers(key);
        if providers.is_empty() {
            if optional {
                trace!(key = %key, "Optional dependency absent");
                return Ok(None);
            }
            return Err(BinaaError::NotRegistered(NotRegisteredError {
                requested: key.clone(),
                required_by: Some(self.location.clone()),
                suggestions: suggestions(store, key),
            }));
        }

        for provider in providers {
            provider.invoke(store)?;
        }
        Ok(store.value(key))
    }
}

impl Provider for Node {
    fn id(&self) -> NodeId {
        self.id
    }

    fn order(&self) -> usize {
        self.order
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn param_list(&self) -> &ParamList {
        &self.params
    }

    fn result_list(&self) -> &ResultList {
        &self.results
    }

    fn invoke(&self, store: &dyn ContainerStore) -> Result<()> {
        if self.is_called() {
            return Ok(());
        }
        self.called.get_or_try_init(|| self.call_once(store))?;
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("order", &self.order)
            .field("location", &self.location)
            .field("called", &self.is_called())
            .finish()
    }
}

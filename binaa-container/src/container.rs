//! # The Container
//!
//! Owns the provider registry and the dependency graph, and registers
//! constructors transactionally: a registration either commits fully or
//! leaves the container exactly as it was.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> Container
//!                                  │
//!                     provide() / provide_with()
//!                                  │
//!      validate ─> build node ─> discover keys ─> register ─> acyclic?
//!                                  │                             │
//!                               commit <──────── yes ────────────┤
//!                                                                │
//!                              rollback + ProvideError <── no ───┘
//! ```
//!
//! # Examples
//! ```rust
//! use binaa_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct Config { url: String }
//! struct Database { url: String }
//!
//! let mut container = Container::new();
//! container
//!     .provide(
//!         FnConstructor::new(|_| {
//!             Ok(Outputs::new().with(Arc::new(Config { url: "postgres://localhost".into() })))
//!         })
//!         .with_name("new_config")
//!         .result(ResultItem::of::<Arc<Config>>()),
//!     )
//!     .expect("config registers");
//! container
//!     .provide(
//!         FnConstructor::new(|args| {
//!             let config: Arc<Config> = args.next()?;
//!             Ok(Outputs::new().with(Arc::new(Database { url: config.url.clone() })))
//!         })
//!         .with_name("new_database")
//!         .param(Param::of::<Arc<Config>>())
//!         .result(ResultItem::of::<Arc<Database>>()),
//!     )
//!     .expect("database registers");
//!
//! let db: Arc<Database> = container.resolve().expect("database resolves");
//! assert_eq!(db.url, "postgres://localhost");
//! ```

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use crate::constructor::{Constructor, Value};
use crate::discovery::find_and_validate_results;
use crate::error::{
    BinaaError, CycleEntry, CycleError, InvalidInputError, NotRegisteredError, ProvideError,
    Result,
};
use crate::graph::{Graph, GraphHolder, is_acyclic};
use crate::key::DependencyKey;
use crate::location::Location;
use crate::node::Node;
use crate::options::{ProvideInfo, ProvideOption, ProvideOptions};
use crate::provider::Provider;
use crate::registry::Registry;
use crate::store::{ContainerStore, ValueStore, suggestions};

// ============================================================
// Configuration
// ============================================================

/// Container settings, loadable from any serde format.
///
/// ```rust,ignore
/// let config: ContainerConfig = toml::from_str("defer_acyclic_verification = true")?;
/// let container = Container::builder().config(config).build();
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Skip the cycle check on every `provide` and run it once before
    /// the first resolution instead.
    pub defer_acyclic_verification: bool,
}

/// Builds a [`Container`].
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    config: ContainerConfig,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Defer cycle detection until the graph is first resolved.
    pub fn defer_acyclic_verification(mut self, defer: bool) -> Self {
        self.config.defer_acyclic_verification = defer;
        self
    }

    /// Replace every setting with `config`.
    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Container {
        debug!(
            defer_acyclic_verification = self.config.defer_acyclic_verification,
            "Building container"
        );
        Container {
            registry: Registry::new(),
            nodes: Vec::new(),
            graph: GraphHolder::new(),
            verified_acyclic: true,
            defer_acyclic_verification: self.config.defer_acyclic_verification,
            values: ValueStore::new(),
        }
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Registry of constructors and the dependency graph between them.
///
/// Registration takes `&mut self`. So does resolution, which may have
/// to run a deferred cycle check first.
pub struct Container {
    registry: Registry,
    /// Committed nodes, in registration order
    nodes: Vec<Arc<Node>>,
    graph: GraphHolder,
    verified_acyclic: bool,
    defer_acyclic_verification: bool,
    values: ValueStore,
}

impl Container {
    /// Empty container with eager cycle detection.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Registers `ctor` without options.
    #[track_caller]
    pub fn provide(&mut self, ctor: impl Constructor) -> Result<()> {
        self.provide_with(ctor, [])
    }

    /// Registers `ctor`, applying `opts` in order.
    ///
    /// Invalid option combinations are returned as they are. Any later
    /// failure is wrapped in [`BinaaError::Provide`] with the
    /// constructor's location, and the container is left untouched.
    #[track_caller]
    pub fn provide_with(
        &mut self,
        ctor: impl Constructor,
        opts: impl IntoIterator<Item = ProvideOption>,
    ) -> Result<()> {
        let options = ProvideOptions::from_options(opts);
        options.validate()?;

        // `#[track_caller]` does not reach into closures.
        let location = match &options.location {
            Some(location) => location.clone(),
            None => Location::caller(ctor.name()),
        };

        self.provide_node(Arc::new(ctor), location, &options)
    }

    #[instrument(
        skip(self, ctor, location, options),
        fields(location = %location),
        name = "provide"
    )]
    fn provide_node(
        &mut self,
        ctor: Arc<dyn Constructor>,
        location: Location,
        options: &ProvideOptions,
    ) -> Result<()> {
        self.graph.snapshot();
        match self.try_provide(ctor, location.clone(), options) {
            Ok(node) => {
                self.graph.release();
                info!(id = %node.id(), order = node.order(), "Constructor registered ✓");
                if let Some(sink) = &options.info {
                    sink.fill(ProvideInfo {
                        id: node.id(),
                        inputs: node.param_list().inputs(),
                        outputs: node.result_list().outputs(),
                    });
                }
                self.nodes.push(node);
                Ok(())
            }
            Err(reason) => {
                self.graph.rollback();
                warn!(error = %reason, "Registration rolled back");
                Err(BinaaError::Provide(ProvideError {
                    location,
                    reason: Box::new(reason),
                }))
            }
        }
    }

    fn try_provide(
        &mut self,
        ctor: Arc<dyn Constructor>,
        location: Location,
        options: &ProvideOptions,
    ) -> Result<Arc<Node>> {
        let ctor_name = ctor.name().to_string();
        let node = Arc::new(Node::build(ctor, self.graph.next_order(), location, options)?);
        self.graph.new_node(Arc::clone(&node));

        let keys = find_and_validate_results(&self.registry, &node)?;
        if keys.is_empty() {
            return Err(BinaaError::InvalidInput(InvalidInputError::new(format!(
                "{ctor_name} must provide at least one non-error type"
            ))));
        }

        let mut previous = HashMap::with_capacity(keys.len());
        for key in keys {
            let old = self.registry.register(key.clone(), Arc::clone(&node));
            previous.insert(key, old);
        }

        let was_verified = self.verified_acyclic;
        self.verified_acyclic = false;
        if self.defer_acyclic_verification {
            trace!("Acyclicity check deferred");
            return Ok(node);
        }

        if let Err(cycle) = is_acyclic(&self.graph_view()) {
            for (key, old) in previous {
                self.registry.restore(key, old);
            }
            self.verified_acyclic = was_verified;
            return Err(BinaaError::CycleDetected(self.cycle_error(&cycle)));
        }
        self.verified_acyclic = true;
        Ok(node)
    }

    /// Checks the graph for cycles unless it is already known to be
    /// acyclic. A successful check is remembered until the next
    /// registration.
    #[instrument(skip(self), name = "verify_acyclic")]
    pub fn verify_acyclic(&mut self) -> Result<()> {
        if self.verified_acyclic {
            return Ok(());
        }
        if let Err(cycle) = is_acyclic(&self.graph_view()) {
            return Err(BinaaError::CycleDetected(self.cycle_error(&cycle)));
        }
        self.verified_acyclic = true;
        Ok(())
    }

    /// Whether the current graph has been checked and found acyclic.
    pub fn is_verified_acyclic(&self) -> bool {
        self.verified_acyclic
    }

    /// Committed nodes, in registration order.
    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    /// Nodes providing `key`, in registration order.
    pub fn providers(&self, key: &DependencyKey) -> &[Arc<Node>] {
        self.registry.get(key)
    }

    /// Every key with at least one provider.
    pub fn keys(&self) -> Vec<DependencyKey> {
        self.registry.iter().map(|(key, _)| key.clone()).collect()
    }

    // ── Resolution ──

    /// Resolve the unnamed value of type `T`.
    ///
    /// ```rust,ignore
    /// let db: Arc<Database> = container.resolve()?;
    /// ```
    pub fn resolve<T: Clone + 'static>(&mut self) -> Result<T> {
        let key = DependencyKey::of::<T>();
        let value = self.resolve_value(&key)?;
        self.downcast(&key, &value)
    }

    /// Resolve the value of type `T` registered under `name`.
    pub fn resolve_named<T: Clone + 'static>(&mut self, name: &str) -> Result<T> {
        let key = DependencyKey::named::<T>(name);
        let value = self.resolve_value(&key)?;
        self.downcast(&key, &value)
    }

    /// Resolve every value of group `group`, in registration order.
    pub fn resolve_group<T: Clone + 'static>(&mut self, group: &str) -> Result<Vec<T>> {
        let key = DependencyKey::grouped::<T>(group);
        self.verify_acyclic()?;

        let store = self.store();
        for provider in self.registry.get(&key) {
            provider.invoke(&store)?;
        }
        store
            .group_values(&key)
            .iter()
            .map(|value| self.downcast(&key, value))
            .collect()
    }

    /// Resolve the type-erased value of any singleton key.
    ///
    /// Interface keys registered through `As` hold the converted handle,
    /// pointing at the same value as the concrete key. Group keys are
    /// rejected; use [`resolve_group`](Self::resolve_group).
    #[instrument(skip(self, key), fields(key = %key), name = "resolve")]
    pub fn resolve_value(&mut self, key: &DependencyKey) -> Result<Value> {
        if key.is_group() {
            return Err(BinaaError::InvalidInput(InvalidInputError::new(format!(
                "{key} is a value group, resolve it with resolve_group"
            ))));
        }
        self.verify_acyclic()?;

        let store = self.store();
        if let Some(value) = store.value(key) {
            trace!("Cached value");
            return Ok(value);
        }

        let providers = self.registry.get(key);
        if providers.is_empty() {
            return Err(BinaaError::NotRegistered(NotRegisteredError {
                requested: key.clone(),
                required_by: None,
                suggestions: suggestions(&store, key),
            }));
        }
        for provider in providers {
            provider.invoke(&store)?;
        }
        store.value(key).ok_or_else(|| {
            BinaaError::NotRegistered(NotRegisteredError {
                requested: key.clone(),
                required_by: None,
                suggestions: Vec::new(),
            })
        })
    }

    // ── Internal ──

    fn store(&self) -> StoreView<'_> {
        StoreView {
            registry: &self.registry,
            values: &self.values,
        }
    }

    fn graph_view(&self) -> GraphView<'_> {
        GraphView {
            graph: &self.graph,
            registry: &self.registry,
        }
    }

    fn cycle_error(&self, cycle: &[usize]) -> CycleError {
        CycleError {
            path: cycle
                .iter()
                .filter_map(|&order| self.graph.lookup(order))
                .map(|node| CycleEntry {
                    order: node.order(),
                    location: node.location().clone(),
                })
                .collect(),
        }
    }

    fn downcast<T: Clone + 'static>(&self, key: &DependencyKey, value: &Value) -> Result<T> {
        value.downcast_ref::<T>().cloned().ok_or_else(|| {
            let location = self
                .registry
                .get(key)
                .last()
                .map(|node| node.location().clone())
                .unwrap_or_else(|| Location::new(key.type_name(), "<unknown>", 0, 0));
            BinaaError::ConstructionFailed {
                location,
                source: format!("Type mismatch: expected {}", type_name::<T>()).into(),
            }
        })
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("nodes", &self.nodes.len())
            .field("keys", &self.registry.len())
            .field("verified_acyclic", &self.verified_acyclic)
            .field("defer_acyclic_verification", &self.defer_acyclic_verification)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Views used by invocation and cycle checks
// ═══════════════════════════════════════════

struct StoreView<'c> {
    registry: &'c Registry,
    values: &'c ValueStore,
}

impl ContainerStore for StoreView<'_> {
    fn providers(&self, key: &DependencyKey) -> &[Arc<Node>] {
        self.registry.get(key)
    }

    fn registered_keys(&self) -> Vec<DependencyKey> {
        self.registry.registered_keys()
    }

    fn value(&self, key: &DependencyKey) -> Option<Value> {
        self.values.get(key)
    }

    fn set_value(&self, key: DependencyKey, value: Value) {
        self.values.insert(key, value);
    }

    fn group_values(&self, key: &DependencyKey) -> Vec<Value> {
        self.values.group(key)
    }

    fn submit_group_value(&self, key: DependencyKey, value: Value) {
        self.values.push_group(key, value);
    }
}

/// Edges run from a node to every provider of its parameter keys.
struct GraphView<'c> {
    graph: &'c GraphHolder,
    registry: &'c Registry,
}

impl Graph for GraphView<'_> {
    fn order(&self) -> usize {
        self.graph.len()
    }

    fn edges_from(&self, u: usize) -> Vec<usize> {
        let Some(node) = self.graph.lookup(u) else {
            return Vec::new();
        };
        node.param_list()
            .leaves()
            .iter()
            .flat_map(|leaf| self.registry.get(leaf.key()).iter().map(|p| p.order()))
            .collect()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder, ContainerConfig};
    pub use crate::constructor::{
        Arguments, Constructor, FnConstructor, Outputs, ParamObject, ResultObject, Typed,
    };
    pub use crate::error::{BinaaError, BoxError, Result};
    pub use crate::key::{DependencyKey, Interface, TypeDescriptor};
    pub use crate::location::Location;
    pub use crate::options::{
        InfoSink, ProvideInfo, ProvideOption, as_interface, fill_provide_info, group, location,
        name,
    };
    pub use crate::param::{Param, ParamField};
    pub use crate::provider::Provider;
    pub use crate::result::{ResultField, ResultItem};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::constructor::{Arguments, FnConstructor, Outputs, Signature};
    use crate::error::{BoxError, ConflictSource};
    use crate::key::Interface;
    use crate::node::NodeId;
    use crate::options::{InfoSink, as_interface, fill_provide_info, group, location, name};
    use crate::param::Param;
    use crate::result::{ResultField, ResultItem};

    #[derive(Clone, Debug, PartialEq)]
    struct TypeX(u32);
    #[derive(Clone, Debug, PartialEq)]
    struct TypeA;
    #[derive(Clone, Debug, PartialEq)]
    struct TypeB;
    struct Buffer;
    trait Reader: Send + Sync {
        fn read(&self) -> &'static str;
    }
    trait Writer: Send + Sync {}

    impl Reader for Buffer {
        fn read(&self) -> &'static str {
            "buffered"
        }
    }
    impl Writer for Buffer {}

    fn as_reader() -> Interface {
        Interface::new(|b: Arc<Buffer>| b as Arc<dyn Reader>)
    }

    fn new_buffer() -> FnConstructor {
        FnConstructor::new(|_| Ok(Outputs::new().with(Arc::new(Buffer))))
            .with_name("new_buffer")
            .result(ResultItem::of::<Arc<Buffer>>())
    }

    fn at(function: &str, line: u32) -> ProvideOption {
        location(Location::new(function, "app.rs", line, 1))
    }

    fn produces<T: Clone + Send + Sync + 'static>(value: T) -> FnConstructor {
        FnConstructor::new(move |_| Ok(Outputs::new().with(value.clone())))
            .result(ResultItem::of::<T>())
    }

    /// Providers and nodes by node id, for before/after comparison.
    fn state(c: &Container) -> (Vec<(String, Vec<NodeId>)>, Vec<NodeId>) {
        let mut providers: Vec<(String, Vec<NodeId>)> = c
            .registry
            .iter()
            .map(|(key, nodes)| (key.to_string(), nodes.iter().map(|n| n.id()).collect()))
            .collect();
        providers.sort_by(|a, b| a.0.cmp(&b.0));
        (providers, c.nodes().iter().map(|n| n.id()).collect())
    }

    #[test]
    fn provide_registers_one_key() {
        let mut c = Container::new();
        c.provide(produces(TypeX(1))).unwrap();

        assert_eq!(c.nodes().len(), 1);
        assert_eq!(c.providers(&DependencyKey::of::<TypeX>()).len(), 1);
        assert!(c.is_verified_acyclic());
    }

    #[test]
    fn concrete_scenario_named_then_conflict() {
        let mut c = Container::new();
        c.provide_with(produces(TypeX(1)), [at("f1", 10)]).unwrap();
        c.provide_with(produces(TypeX(2)), [at("f2", 20), name("a")]).unwrap();
        assert_eq!(c.providers(&DependencyKey::named::<TypeX>("a")).len(), 1);

        let before = state(&c);
        let err = c.provide_with(produces(TypeX(3)), [at("f3", 30)]).unwrap_err();
        assert!(err.is_conflict());
        let message = err.to_string();
        assert!(message.starts_with("cannot provide function f3 (app.rs:30)"), "{message}");
        assert!(message.contains("already provided by f1 (app.rs:10)"), "{message}");
        assert_eq!(state(&c), before);
    }

    #[test]
    fn conflict_symmetry() {
        for (first, second) in [("a", "b"), ("b", "a")] {
            let mut c = Container::new();
            c.provide_with(produces(TypeX(1)), [at(first, 1)]).unwrap();
            let err = c.provide_with(produces(TypeX(2)), [at(second, 2)]).unwrap_err();

            let BinaaError::KeyConflict(conflict) = err.reason() else {
                panic!("expected conflict, got {err}");
            };
            let ConflictSource::Registered { locations } = &conflict.conflict else {
                panic!("expected registered conflict");
            };
            assert_eq!(locations[0].function, first);
            assert_eq!(c.nodes().len(), 1);
            assert_eq!(c.nodes()[0].location().function, first);
        }
    }

    #[test]
    fn uniqueness_holds_across_registrations() {
        let mut c = Container::new();
        c.provide(produces(TypeX(1))).unwrap();
        let _ = c.provide(produces(TypeX(2)));
        c.provide_with(produces(TypeX(3)), [name("x")]).unwrap();
        let _ = c.provide_with(produces(TypeX(4)), [name("x")]);

        for key in c.keys() {
            if !key.is_group() {
                assert_eq!(c.providers(&key).len(), 1, "{key}");
            }
        }
    }

    #[test]
    fn group_accumulates_in_call_order() {
        let mut c = Container::new();
        let mut ids = Vec::new();
        for n in 0..3 {
            let sink = InfoSink::new();
            c.provide_with(produces(TypeX(n)), [group("xs"), fill_provide_info(&sink)])
                .unwrap();
            ids.push(sink.get().unwrap().id);
        }

        let key = DependencyKey::grouped::<TypeX>("xs");
        let registered: Vec<NodeId> = c.providers(&key).iter().map(|n| n.id()).collect();
        assert_eq!(registered, ids);
        assert_eq!(
            c.resolve_group::<TypeX>("xs").unwrap(),
            vec![TypeX(0), TypeX(1), TypeX(2)]
        );
    }

    fn a_needs_b() -> FnConstructor {
        FnConstructor::new(|_| Ok(Outputs::new().with(TypeA)))
            .with_name("a_needs_b")
            .param(Param::of::<TypeB>())
            .result(ResultItem::of::<TypeA>())
    }

    fn b_needs_a() -> FnConstructor {
        FnConstructor::new(|_| Ok(Outputs::new().with(TypeB)))
            .with_name("b_needs_a")
            .param(Param::of::<TypeA>())
            .result(ResultItem::of::<TypeB>())
    }

    #[test]
    fn cycle_rejected_and_rolled_back() {
        let mut c = Container::new();
        c.provide_with(a_needs_b(), [at("a_needs_b", 1)]).unwrap();
        let before = state(&c);

        let err = c.provide_with(b_needs_a(), [at("b_needs_a", 2)]).unwrap_err();
        assert!(err.is_cycle());
        let BinaaError::CycleDetected(cycle) = err.reason() else {
            panic!("expected cycle, got {err}");
        };
        assert_eq!(cycle.path.first().map(|e| e.order), cycle.path.last().map(|e| e.order));
        assert!(cycle.path.iter().any(|e| e.location.function == "b_needs_a"));

        assert_eq!(state(&c), before);
        assert!(c.providers(&DependencyKey::of::<TypeB>()).is_empty());
        assert_eq!(c.graph.len(), 1);
        assert!(c.is_verified_acyclic());
    }

    #[test]
    fn deferred_verification_accepts_then_fails() {
        let mut c = Container::builder().defer_acyclic_verification(true).build();
        c.provide(a_needs_b()).unwrap();
        c.provide(b_needs_a()).unwrap();

        assert_eq!(c.nodes().len(), 2);
        assert!(!c.is_verified_acyclic());
        assert!(c.verify_acyclic().unwrap_err().is_cycle());
        assert!(c.resolve::<TypeA>().unwrap_err().is_cycle());
    }

    #[test]
    fn deferred_verification_passes_for_acyclic_graph() {
        let config = ContainerConfig {
            defer_acyclic_verification: true,
        };
        let mut c = Container::builder().config(config).build();
        c.provide(produces(TypeB)).unwrap();
        c.provide(a_needs_b()).unwrap();
        assert!(!c.is_verified_acyclic());

        assert_eq!(c.resolve::<TypeA>().unwrap(), TypeA);
        assert!(c.is_verified_acyclic());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        use serde::de::value::{Error, MapDeserializer};

        let empty = MapDeserializer::<_, Error>::new(Vec::<(&str, bool)>::new().into_iter());
        assert_eq!(ContainerConfig::deserialize(empty).unwrap(), ContainerConfig::default());

        let deferred =
            MapDeserializer::<_, Error>::new(vec![("defer_acyclic_verification", true)].into_iter());
        assert!(ContainerConfig::deserialize(deferred).unwrap().defer_acyclic_verification);
    }

    #[test]
    fn interface_substitution_registers_three_keys() {
        let mut c = Container::new();
        c.provide_with(
            new_buffer(),
            [
                name("tmp"),
                as_interface([
                    as_reader(),
                    Interface::new(|b: Arc<Buffer>| b as Arc<dyn Writer>),
                ]),
            ],
        )
        .unwrap();

        assert_eq!(c.keys().len(), 3);
        assert_eq!(c.providers(&DependencyKey::named::<Arc<Buffer>>("tmp")).len(), 1);
        assert_eq!(c.providers(&DependencyKey::named::<Arc<dyn Reader>>("tmp")).len(), 1);
        assert_eq!(c.providers(&DependencyKey::named::<Arc<dyn Writer>>("tmp")).len(), 1);
    }

    #[test]
    fn interface_key_resolves_and_feeds_dependents() {
        let mut c = Container::new();
        c.provide_with(new_buffer(), [as_interface([as_reader()])]).unwrap();
        c.provide(
            FnConstructor::new(|args| {
                let reader: Arc<dyn Reader> = args.next()?;
                Ok(Outputs::new().with(TypeX(reader.read().len() as u32)))
            })
            .param(Param::of::<Arc<dyn Reader>>())
            .result(ResultItem::of::<TypeX>()),
        )
        .unwrap();

        assert_eq!(c.resolve::<TypeX>().unwrap(), TypeX(8));
        let reader: Arc<dyn Reader> = c.resolve().unwrap();
        let buffer: Arc<Buffer> = c.resolve().unwrap();
        assert_eq!(reader.read(), "buffered");
        assert!(std::ptr::addr_eq(Arc::as_ptr(&reader), Arc::as_ptr(&buffer)));
        assert_eq!(c.nodes()[0].id(), c.providers(&DependencyKey::of::<Arc<Buffer>>())[0].id());
    }

    #[test]
    fn as_rejects_concrete_targets() {
        let mut c = Container::new();
        let err = c
            .provide_with(
                produces(7u32),
                [as_interface([Interface::new(|n: u32| n.to_string())])],
            )
            .unwrap_err();
        assert!(matches!(err, BinaaError::InvalidInput(_)));
        assert!(err.to_string().contains("must be an interface"), "{err}");
        assert!(c.providers(&DependencyKey::of::<String>()).is_empty());
        assert!(c.nodes().is_empty());
    }

    #[test]
    fn as_from_another_type_is_rolled_back() {
        let mut c = Container::new();
        let err = c
            .provide_with(produces(TypeX(1)), [as_interface([as_reader()])])
            .unwrap_err();
        assert!(matches!(err, BinaaError::Provide(_)));
        assert!(err.is_invalid_input());
        assert!(c.keys().is_empty());
        assert_eq!(c.graph.len(), 0);
    }

    /// Rejects its own shape, like a constructor with an unsupported
    /// parameter type.
    struct Unsupported;

    impl Constructor for Unsupported {
        fn name(&self) -> &str {
            "unsupported"
        }

        fn describe(&self) -> Result<Signature> {
            Err(BinaaError::InvalidInput(InvalidInputError::new(
                "unsupported parameter type",
            )))
        }

        fn call(&self, _args: &mut Arguments) -> std::result::Result<Outputs, BoxError> {
            Ok(Outputs::new())
        }
    }

    #[test]
    fn describe_failure_is_wrapped_and_atomic() {
        let mut c = Container::new();
        c.provide(produces(TypeX(1))).unwrap();
        let before = state(&c);

        let err = c.provide_with(Unsupported, [at("unsupported", 3)]).unwrap_err();
        assert!(matches!(err, BinaaError::Provide(_)));
        let BinaaError::InvalidInput(reason) = err.reason() else {
            panic!("expected invalid input, got {err}");
        };
        assert_eq!(reason.message, "unsupported parameter type");
        assert!(err.to_string().contains("unsupported (app.rs:3)"), "{err}");

        assert_eq!(state(&c), before);
        assert_eq!(c.graph.len(), 1);
        assert!(c.is_verified_acyclic());
    }

    #[test]
    fn nested_results_register_leaf_keys() {
        let ctor = FnConstructor::new(|_| Ok(Outputs::new().with(TypeA).with(TypeB))).result(
            ResultItem::object(vec![ResultField::new(
                "Outer",
                ResultItem::object(vec![
                    ResultField::new("A", ResultItem::of::<TypeA>()),
                    ResultField::new("B", ResultItem::of::<TypeB>()),
                ]),
            )]),
        );
        let mut c = Container::new();
        c.provide(ctor).unwrap();
        assert_eq!(c.providers(&DependencyKey::of::<TypeA>()).len(), 1);
        assert_eq!(c.providers(&DependencyKey::of::<TypeB>()).len(), 1);
        assert_eq!(c.resolve::<TypeB>().unwrap(), TypeB);
    }

    #[test]
    fn zero_results_is_invalid_and_atomic() {
        let mut c = Container::new();
        let before = state(&c);
        let err = c
            .provide(FnConstructor::new(|_| Ok(Outputs::new())).with_name("nothing"))
            .unwrap_err();
        assert!(matches!(err, BinaaError::Provide(_)));
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("nothing must provide at least one non-error type"));
        assert_eq!(state(&c), before);
        assert_eq!(c.graph.len(), 0);
    }

    #[test]
    fn invalid_options_are_not_wrapped() {
        let mut c = Container::new();
        let err = c
            .provide_with(produces(TypeX(1)), [name("a"), group("g")])
            .unwrap_err();
        assert!(matches!(err, BinaaError::InvalidInput(_)));
        assert!(c.nodes().is_empty());
    }

    #[test]
    fn name_on_result_object_rejected() {
        let ctor = FnConstructor::new(|_| Ok(Outputs::new().with(TypeA))).result(
            ResultItem::object(vec![ResultField::new("A", ResultItem::of::<TypeA>())]),
        );
        let mut c = Container::new();
        let err = c.provide_with(ctor, [name("a")]).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("result objects"));
    }

    #[test]
    fn info_sink_filled_only_on_success() {
        let mut c = Container::new();
        let sink = InfoSink::new();
        let ctor = FnConstructor::new(|_| Ok(Outputs::new().with(TypeA)))
            .param(Param::optional::<TypeB>())
            .result(ResultItem::of::<TypeA>());
        c.provide_with(ctor, [fill_provide_info(&sink)]).unwrap();

        let info = sink.get().unwrap();
        assert_eq!(info.id, c.nodes()[0].id());
        assert_eq!(info.inputs.len(), 1);
        assert!(info.inputs[0].optional);
        assert_eq!(info.outputs.len(), 1);

        let failed = InfoSink::new();
        let _ = c.provide_with(produces(TypeA), [fill_provide_info(&failed)]);
        assert!(failed.get().is_none());
    }

    #[test]
    fn constructor_called_once_and_optional_absent() {
        let calls = Arc::new(AtomicU32::new(0));
        let ctor = FnConstructor::new({
            let calls = Arc::clone(&calls);
            move |args| {
                calls.fetch_add(1, Ordering::SeqCst);
                let b: Option<TypeB> = args.next_optional()?;
                assert!(b.is_none());
                Ok(Outputs::new().with(TypeX(7)))
            }
        })
        .param(Param::optional::<TypeB>())
        .result(ResultItem::of::<TypeX>());

        let mut c = Container::new();
        c.provide(ctor).unwrap();
        assert_eq!(c.resolve::<TypeX>().unwrap(), TypeX(7));
        assert_eq!(c.resolve::<TypeX>().unwrap(), TypeX(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(c.nodes()[0].is_called());
    }

    #[test]
    fn missing_dependency_reports_requester() {
        let mut c = Container::new();
        c.provide_with(a_needs_b(), [at("a_needs_b", 5)]).unwrap();

        match c.resolve::<TypeA>().unwrap_err() {
            BinaaError::NotRegistered(e) => {
                assert_eq!(e.requested, DependencyKey::of::<TypeB>());
                assert_eq!(e.required_by.map(|l| l.function), Some("a_needs_b".to_string()));
            }
            other => panic!("Expected NotRegistered, got: {other:?}"),
        }
        assert!(!c.nodes()[0].is_called());
    }

    #[test]
    fn resolve_named_and_unregistered() {
        let mut c = Container::new();
        c.provide_with(produces(TypeX(9)), [name("nine")]).unwrap();
        c.provide(produces(TypeA)).unwrap();
        assert_eq!(c.resolve_named::<TypeX>("nine").unwrap(), TypeX(9));

        let Err(BinaaError::NotRegistered(e)) = c.resolve::<TypeX>() else {
            panic!("expected NotRegistered");
        };
        assert!(e.suggestions[0].ends_with("TypeX[name=\"nine\"]"), "{:?}", e.suggestions);
    }

    #[test]
    fn resolve_value_rejects_group_keys() {
        let mut c = Container::new();
        c.provide_with(produces(TypeX(1)), [group("xs")]).unwrap();

        let err = c
            .resolve_value(&DependencyKey::grouped::<TypeX>("xs"))
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("resolve_group"), "{err}");
        assert_eq!(c.resolve_group::<TypeX>("xs").unwrap(), vec![TypeX(1)]);
    }

    #[test]
    fn failed_constructor_is_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let ctor = FnConstructor::new({
            let calls = Arc::clone(&calls);
            move |_| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err("not yet".into());
                }
                Ok(Outputs::new().with(TypeX(1)))
            }
        })
        .result(ResultItem::of::<TypeX>());

        let mut c = Container::new();
        c.provide(ctor).unwrap();
        assert!(matches!(
            c.resolve::<TypeX>(),
            Err(BinaaError::ConstructionFailed { .. })
        ));
        assert_eq!(c.resolve::<TypeX>().unwrap(), TypeX(1));
    }

    #[test]
    fn debug_display() {
        let mut c = Container::new();
        c.provide(produces(TypeX(1))).unwrap();
        let debug = format!("{c:?}");
        assert!(debug.contains("Container"));
        assert!(debug.contains("nodes: 1"));
    }
}

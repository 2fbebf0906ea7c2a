//! The contract a registered constructor satisfies.
//!
//! The graph engine only sees providers through this trait: identity,
//! position in the graph, where it came from, what it needs and what it
//! makes. How values are actually built stays behind [`Provider::invoke`].

use crate::error::Result;
use crate::location::Location;
use crate::node::NodeId;
use crate::param::ParamList;
use crate::result::ResultList;
use crate::store::ContainerStore;

/// A constructor participating in the dependency graph.
pub trait Provider: Send + Sync {
    /// Stable unique id, assigned once and never reused.
    fn id(&self) -> NodeId;

    /// Position assigned by the graph substrate. Used for cycle
    /// reporting and stable iteration.
    fn order(&self) -> usize;

    /// Where this constructor was registered.
    fn location(&self) -> &Location;

    /// Direct dependencies. Cycle detection derives edges from these.
    fn param_list(&self) -> &ParamList;

    /// Values produced by this constructor.
    fn result_list(&self) -> &ResultList;

    /// Builds this provider's values into `store`, invoking providers
    /// of missing dependencies first.
    ///
    /// Idempotent: once a call succeeded, later calls return `Ok(())`
    /// without calling the constructor again.
    fn invoke(&self, store: &dyn ContainerStore) -> Result<()>;
}

//! Dependency graph substrate.
//!
//! - [`Graph`]: minimal view of a directed graph over node orders.
//! - [`is_acyclic`]: DFS cycle check over any [`Graph`].
//! - [`GraphHolder`]: node arena with a snapshot/rollback undo log, so
//!   a failed registration can drop exactly the nodes it added.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, trace, warn};

use crate::node::Node;

/// A directed graph whose nodes are identified by their order
/// `0..order()`.
pub trait Graph {
    /// Number of nodes.
    fn order(&self) -> usize;

    /// Orders of the nodes that node `u` depends on.
    fn edges_from(&self, u: usize) -> Vec<usize>;
}

/// Checks the whole graph for cycles.
///
/// Returns the first cycle found as a path of orders whose first and
/// last entries are the same node.
///
/// # Algorithm
/// Depth-first search from every node, keeping a "visiting" set for the
/// current path and a "validated" set of nodes already proven acyclic.
#[instrument(skip(graph), name = "acyclic_check")]
pub fn is_acyclic(graph: &impl Graph) -> Result<(), Vec<usize>> {
    let mut checker = CycleChecker {
        graph,
        visiting: HashSet::new(),
        validated: HashSet::new(),
        path: Vec::new(),
    };

    debug!(node_count = graph.order(), "Starting acyclicity check");
    for u in 0..graph.order() {
        checker.visit(u)?;
    }
    debug!("Acyclicity check passed ✓");
    Ok(())
}

struct CycleChecker<'g, G> {
    graph: &'g G,
    /// Currently on the DFS path
    visiting: HashSet<usize>,
    /// Already proven acyclic
    validated: HashSet<usize>,
    /// Current DFS path (for error reporting)
    path: Vec<usize>,
}

impl<G: Graph> CycleChecker<'_, G> {
    fn visit(&mut self, u: usize) -> Result<(), Vec<usize>> {
        if self.validated.contains(&u) {
            return Ok(());
        }

        if self.visiting.contains(&u) {
            let cycle_start = self.path.iter().position(|&n| n == u).unwrap_or(0);
            let mut cycle = self.path[cycle_start..].to_vec();
            cycle.push(u);

            warn!(cycle = ?cycle, "Dependency cycle detected");
            return Err(cycle);
        }

        self.visiting.insert(u);
        self.path.push(u);

        for v in self.graph.edges_from(u) {
            self.visit(v)?;
        }

        self.path.pop();
        self.visiting.remove(&u);
        self.validated.insert(u);
        Ok(())
    }
}

/// Arena of every node known to the graph, committed or provisional.
///
/// A node's order is its index here. [`snapshot`](Self::snapshot)
/// remembers the arena length; [`rollback`](Self::rollback) truncates
/// back to it, undoing every node added since.
#[derive(Debug, Default)]
pub(crate) struct GraphHolder {
    nodes: Vec<Arc<Node>>,
    snapshot: Option<usize>,
}

impl GraphHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&mut self) {
        self.snapshot = Some(self.nodes.len());
    }

    /// Drops nodes added since the last snapshot. No-op without one.
    pub fn rollback(&mut self) {
        if let Some(len) = self.snapshot.take() {
            trace!(dropped = self.nodes.len() - len, "Rolling back graph");
            self.nodes.truncate(len);
        }
    }

    /// Forgets the snapshot, keeping every node.
    pub fn release(&mut self) {
        self.snapshot = None;
    }

    /// Order the next node will receive.
    pub fn next_order(&self) -> usize {
        self.nodes.len()
    }

    /// Adds a node and returns its order.
    pub fn new_node(&mut self, node: Arc<Node>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn lookup(&self, order: usize) -> Option<&Arc<Node>> {
        self.nodes.get(order)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Adjacency-list graph for tests.
    struct Adjacency(Vec<Vec<usize>>);

    impl Graph for Adjacency {
        fn order(&self) -> usize {
            self.0.len()
        }

        fn edges_from(&self, u: usize) -> Vec<usize> {
            self.0[u].clone()
        }
    }

    #[test]
    fn valid_simple_graph() {
        // 2 → 1 → 0
        let graph = Adjacency(vec![vec![], vec![0], vec![1]]);
        assert!(is_acyclic(&graph).is_ok());
    }

    #[test]
    fn detect_cycle() {
        // 0 → 1 → 2 → 0
        let graph = Adjacency(vec![vec![1], vec![2], vec![0]]);
        let cycle = is_acyclic(&graph).unwrap_err();
        assert_eq!(cycle, vec![0, 1, 2, 0]);
    }

    #[test]
    fn detect_self_dependency() {
        let graph = Adjacency(vec![vec![0]]);
        assert_eq!(is_acyclic(&graph).unwrap_err(), vec![0, 0]);
    }

    #[test]
    fn cycle_path_excludes_lead_in() {
        // 0 → 1 → 2 → 1
        let graph = Adjacency(vec![vec![1], vec![2], vec![1]]);
        assert_eq!(is_acyclic(&graph).unwrap_err(), vec![1, 2, 1]);
    }

    #[test]
    fn diamond_dependency_ok() {
        //     0
        //    / \
        //   1   2
        //    \ /
        //     3
        let graph = Adjacency(vec![vec![1, 2], vec![3], vec![3], vec![]]);
        assert!(is_acyclic(&graph).is_ok());
    }

    #[test]
    fn empty_graph_is_acyclic() {
        assert!(is_acyclic(&Adjacency(vec![])).is_ok());
    }

    #[test]
    fn rollback_without_snapshot_keeps_nodes() {
        let mut holder = GraphHolder::new();
        holder.rollback();
        assert_eq!(holder.len(), 0);
        assert_eq!(holder.next_order(), 0);
    }
}

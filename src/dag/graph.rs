// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::pool::Pool;
use crate::errors::{PoolrunError, Result};
use crate::types::PoolName;

/// Internal node structure: stores immediate predecessors and dependents.
#[derive(Debug, Clone)]
struct PoolNode {
    /// Position in the declared pipeline order.
    index: usize,
    /// Pools that must finish before this one can run.
    predecessors: Vec<PoolName>,
    /// Pools that list this one as a predecessor (in declared order).
    dependents: Vec<PoolName>,
}

/// Validated adjacency information for a pipeline's pools.
///
/// Construction fails on duplicate pool names, unknown or self-referencing
/// predecessors and cycles, so everything downstream can assume a DAG.
#[derive(Debug, Clone)]
pub struct PoolGraph {
    order: Vec<PoolName>,
    nodes: HashMap<PoolName, PoolNode>,
}

impl PoolGraph {
    pub fn new(pools: &[Pool]) -> Result<Self> {
        let mut order = Vec::with_capacity(pools.len());
        let mut nodes: HashMap<PoolName, PoolNode> = HashMap::new();

        for (index, pool) in pools.iter().enumerate() {
            if nodes.contains_key(&pool.name) {
                return Err(PoolrunError::ConfigError(format!(
                    "duplicate pool name '{}'",
                    pool.name
                )));
            }
            order.push(pool.name.clone());
            nodes.insert(
                pool.name.clone(),
                PoolNode {
                    index,
                    predecessors: pool.predecessors.clone(),
                    dependents: Vec::new(),
                },
            );
        }

        for pool in pools {
            for pred in &pool.predecessors {
                if pred == &pool.name {
                    return Err(PoolrunError::ConfigError(format!(
                        "pool '{}' cannot be its own predecessor",
                        pool.name
                    )));
                }
                match nodes.get_mut(pred) {
                    Some(node) => node.dependents.push(pool.name.clone()),
                    None => {
                        return Err(PoolrunError::PoolNotFound(format!(
                            "pool '{}' declares unknown predecessor '{}'",
                            pool.name, pred
                        )));
                    }
                }
            }
        }

        let graph = Self { order, nodes };
        graph.ensure_acyclic()?;
        Ok(graph)
    }

    fn ensure_acyclic(&self) -> Result<()> {
        // Edge direction: predecessor -> pool.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in &self.order {
            graph.add_node(name.as_str());
        }
        for name in &self.order {
            for pred in self.predecessors_of(name) {
                graph.add_edge(pred.as_str(), name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(PoolrunError::DagCycle(format!(
                "cycle detected in pool graph involving pool '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// Pool names in declared order.
    pub fn pools(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Position of the pool in declared order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.nodes.get(name).map(|n| n.index)
    }

    /// Immediate predecessors, in the order they were declared.
    pub fn predecessors_of(&self, name: &str) -> &[PoolName] {
        self.nodes
            .get(name)
            .map(|n| n.predecessors.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents, in declared pool order.
    pub fn dependents_of(&self, name: &str) -> &[PoolName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// All pools reachable from `name` through dependent edges.
    pub fn transitive_dependents_of(&self, name: &str) -> Vec<PoolName> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = self.dependents_of(name).iter().map(|s| s.as_str()).collect();
        let mut out = Vec::new();

        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next.to_string());
            stack.extend(self.dependents_of(next).iter().map(|s| s.as_str()));
        }

        out.sort_by_key(|n| self.index_of(n));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<Pool> {
        vec![
            Pool::new("prep"),
            Pool::new("map").after("prep"),
            Pool::new("call").after("map"),
            Pool::new("report").after("map"),
        ]
    }

    #[test]
    fn adjacency_follows_declared_order() {
        let g = PoolGraph::new(&chain()).unwrap();
        assert_eq!(g.pools().collect::<Vec<_>>(), vec!["prep", "map", "call", "report"]);
        assert_eq!(g.predecessors_of("call"), ["map".to_string()]);
        assert_eq!(
            g.dependents_of("map"),
            ["call".to_string(), "report".to_string()]
        );
        assert_eq!(
            g.transitive_dependents_of("prep"),
            vec!["map", "call", "report"]
        );
        assert!(g.dependents_of("unknown").is_empty());
    }

    #[test]
    fn unknown_predecessor_is_rejected() {
        let pools = vec![Pool::new("map").after("prep")];
        match PoolGraph::new(&pools) {
            Err(PoolrunError::PoolNotFound(msg)) => assert!(msg.contains("prep")),
            other => panic!("expected PoolNotFound, got {other:?}"),
        }
    }

    #[test]
    fn self_edge_is_rejected() {
        let pools = vec![Pool::new("map").after("map")];
        assert!(matches!(
            PoolGraph::new(&pools),
            Err(PoolrunError::ConfigError(_))
        ));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let pools = vec![Pool::new("map"), Pool::new("map")];
        assert!(matches!(
            PoolGraph::new(&pools),
            Err(PoolrunError::ConfigError(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn cycle_is_rejected() {
        let pools = vec![Pool::new("a").after("b"), Pool::new("b").after("a")];
        match PoolGraph::new(&pools) {
            Err(PoolrunError::DagCycle(msg)) => assert!(msg.contains("cycle detected")),
            other => panic!("expected DagCycle, got {other:?}"),
        }
    }
}

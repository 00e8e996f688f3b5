//! Topological ordering of a workflow.
//!
//! Ordering uses Kahn's algorithm with a FIFO queue. The queue is seeded
//! with zero in-degree nodes in node-list order and successors are visited
//! in edge-list order, so the same graph always yields the same order.
//!
//! When ordering fails, petgraph's Tarjan SCC pass names the node groups
//! that actually form cycles, which is more useful to a user than the full
//! set of blocked nodes.

use crate::edge::Connection;
use crate::error::CycleError;
use crate::node::{Node, NodeId};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, VecDeque};

/// Orders `nodes` so every edge's source precedes its target.
///
/// Edges whose endpoints are not in `nodes` are ignored.
///
/// # Errors
///
/// Returns [`CycleError`] if some nodes can never be scheduled.
pub fn execution_order(nodes: &[Node], edges: &[Connection]) -> Result<Vec<NodeId>, CycleError> {
    let index: HashMap<&NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (&node.id, i))
        .collect();

    let resolved: Vec<(usize, usize)> = edges
        .iter()
        .filter_map(|edge| {
            let source = index.get(&edge.source_item_id)?;
            let target = index.get(&edge.target_item_id)?;
            Some((*source, *target))
        })
        .collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree = vec![0usize; nodes.len()];
    for &(source, target) in &resolved {
        adjacency[source].push(target);
        in_degree[target] += 1;
    }

    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(current) = queue.pop_front() {
        order.push(current);
        for &next in &adjacency[current] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() != nodes.len() {
        let unresolved = (0..nodes.len())
            .filter(|&i| in_degree[i] > 0)
            .map(|i| nodes[i].id.clone())
            .collect();
        let cycles = find_cycles(nodes.len(), &resolved)
            .into_iter()
            .map(|members| members.into_iter().map(|i| nodes[i].id.clone()).collect())
            .collect();
        return Err(CycleError { unresolved, cycles });
    }

    Ok(order.into_iter().map(|i| nodes[i].id.clone()).collect())
}

/// Returns the node groups that form cycles, each sorted by node-list
/// position, groups sorted by their first member.
fn find_cycles(node_count: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(node_count, edges.len());
    let indices: Vec<NodeIndex> = (0..node_count).map(|i| graph.add_node(i)).collect();
    for &(source, target) in edges {
        graph.add_edge(indices[source], indices[target], ());
    }

    let mut cycles: Vec<Vec<usize>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|&v| graph.contains_edge(v, v))
        })
        .map(|component| {
            let mut members: Vec<usize> = component.into_iter().map(NodeIndex::index).collect();
            members.sort_unstable();
            members
        })
        .collect();

    cycles.sort_by_key(|members| members.first().copied());
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter()
            .map(|id| Node::new(*id, "1", "test", *id))
            .collect()
    }

    fn edge(source: &str, target: &str) -> Connection {
        Connection::new(source, "output-1", target, "input-1")
    }

    fn ids(order: &[NodeId]) -> Vec<&str> {
        order.iter().map(NodeId::as_str).collect()
    }

    #[test]
    fn chain_is_ordered() {
        let order = execution_order(&nodes(&["a", "b", "c"]), &[edge("a", "b"), edge("b", "c")])
            .expect("acyclic");
        assert_eq!(ids(&order), ["a", "b", "c"]);
    }

    #[test]
    fn chain_listed_backwards_is_still_ordered() {
        let order = execution_order(&nodes(&["c", "b", "a"]), &[edge("b", "c"), edge("a", "b")])
            .expect("acyclic");
        assert_eq!(ids(&order), ["a", "b", "c"]);
    }

    #[test]
    fn no_edges_keeps_input_order() {
        let order = execution_order(&nodes(&["x", "y", "z"]), &[]).expect("acyclic");
        assert_eq!(ids(&order), ["x", "y", "z"]);
    }

    #[test]
    fn empty_graph_orders_to_nothing() {
        assert!(execution_order(&[], &[]).expect("acyclic").is_empty());
    }

    #[test]
    fn ties_follow_node_then_edge_order() {
        // a fans out to c then b; d is independent.
        let order = execution_order(
            &nodes(&["a", "b", "c", "d"]),
            &[edge("a", "c"), edge("a", "b")],
        )
        .expect("acyclic");
        assert_eq!(ids(&order), ["a", "d", "c", "b"]);
    }

    #[test]
    fn dangling_edges_are_ignored() {
        let order = execution_order(&nodes(&["a", "b"]), &[edge("ghost", "b"), edge("a", "b")])
            .expect("acyclic");
        assert_eq!(ids(&order), ["a", "b"]);
    }

    #[test]
    fn cycle_is_reported_with_members() {
        let err = execution_order(
            &nodes(&["start", "a", "b", "c"]),
            &[edge("start", "a"), edge("a", "b"), edge("b", "c"), edge("c", "a")],
        )
        .unwrap_err();

        assert_eq!(ids(&err.unresolved), ["a", "b", "c"]);
        assert_eq!(err.cycles.len(), 1);
        assert_eq!(ids(&err.cycles[0]), ["a", "b", "c"]);
    }

    #[test]
    fn nodes_downstream_of_a_cycle_are_unresolved_but_not_cyclic() {
        let err = execution_order(
            &nodes(&["a", "b", "tail"]),
            &[edge("a", "b"), edge("b", "a"), edge("b", "tail")],
        )
        .unwrap_err();

        assert_eq!(ids(&err.unresolved), ["a", "b", "tail"]);
        assert_eq!(err.cycles.len(), 1);
        assert_eq!(ids(&err.cycles[0]), ["a", "b"]);
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let err = execution_order(&nodes(&["a"]), &[edge("a", "a")]).unwrap_err();
        assert_eq!(ids(&err.cycles[0]), ["a"]);
    }
}

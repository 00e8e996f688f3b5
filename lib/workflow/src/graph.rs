//! The workflow graph.
//!
//! A [`WorkflowGraph`] is an ordered list of nodes and an ordered list of
//! edges. The edge list is the single source of truth for connectivity:
//! every mutating operation recomputes each port's `connected_to` index from
//! it before returning, so the index can never drift from the edges.
//!
//! Order matters. Node order seeds execution ordering ties and edge order
//! decides successor visiting order, so both are kept exactly as built.

use crate::connect::{self, ConnectOutcome};
use crate::edge::Connection;
use crate::error::{ConnectionError, CycleError, GraphError};
use crate::node::{ModuleConfig, Node, NodeId, Position};
use crate::order;
use crate::port::{PortDirection, PortEndpoint, PortReference};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Nodes and edges of one workflow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowGraph {
    nodes: Vec<Node>,
    edges: Vec<Connection>,
}

impl WorkflowGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from stored parts.
    ///
    /// Edges with a missing endpoint node are dropped quietly. Edges that
    /// name an unknown port, mismatch types, duplicate an earlier edge or
    /// feed an already-fed input are dropped with a warning. Ports'
    /// `connected_to` lists are rebuilt from the surviving edges.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateNode` if two nodes share an id.
    pub fn assemble(nodes: Vec<Node>, edges: Vec<Connection>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in nodes {
            if graph.contains_node(&node.id) {
                return Err(GraphError::DuplicateNode { node_id: node.id });
            }
            graph.nodes.push(node);
        }

        for edge in edges {
            if !graph.contains_node(&edge.source_item_id) || !graph.contains_node(&edge.target_item_id)
            {
                debug!(edge = %edge, "dropping edge with missing endpoint");
                continue;
            }
            match connect::admit(&graph, &edge) {
                Ok(()) => graph.edges.push(edge),
                Err(e) => warn!(edge = %edge, error = %e, "dropping invalid edge"),
            }
        }

        graph.reindex();
        Ok(graph)
    }

    /// Nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[Connection] {
        &self.edges
    }

    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == node_id)
    }

    #[must_use]
    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.node(node_id).is_some()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a node.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateNode` if the id is taken.
    pub fn add_node(&mut self, mut node: Node) -> Result<(), GraphError> {
        if self.contains_node(&node.id) {
            return Err(GraphError::DuplicateNode { node_id: node.id });
        }
        for (_, port) in node.ports_mut() {
            port.set_connected_to(Vec::new());
        }
        debug!(node_id = %node.id, module_id = %node.module_id, "added node");
        self.nodes.push(node);
        Ok(())
    }

    /// Removes a node and every edge touching it.
    ///
    /// Returns the node and the removed edges.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node is absent.
    pub fn remove_node(&mut self, node_id: &NodeId) -> Result<(Node, Vec<Connection>), GraphError> {
        let position = self
            .nodes
            .iter()
            .position(|n| &n.id == node_id)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })?;

        let node = self.nodes.remove(position);
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| e.touches(node_id));
        self.edges = kept;
        self.reindex();

        debug!(node_id = %node_id, removed_edges = removed.len(), "removed node");
        Ok((node, removed))
    }

    /// Validates a connect gesture and applies it.
    ///
    /// Re-drawing an existing edge succeeds with
    /// [`ConnectOutcome::AlreadyConnected`] and leaves the graph unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first violated wiring rule; the graph is unchanged.
    pub fn connect(
        &mut self,
        from: &PortReference,
        to: &PortReference,
    ) -> Result<ConnectOutcome, ConnectionError> {
        match connect::can_connect(self, from, to) {
            Ok(edge) => {
                self.push_edge(edge.clone());
                Ok(ConnectOutcome::Connected(edge))
            }
            Err(ConnectionError::DuplicateEdge { edge }) => {
                Ok(ConnectOutcome::AlreadyConnected(edge))
            }
            Err(e) => Err(e),
        }
    }

    /// Adds an already-normalized edge, using the graph's own port types.
    ///
    /// # Errors
    ///
    /// Returns the first violated wiring rule; the graph is unchanged.
    pub fn add_connection(&mut self, edge: Connection) -> Result<ConnectOutcome, ConnectionError> {
        match connect::admit(self, &edge) {
            Ok(()) => {
                self.push_edge(edge.clone());
                Ok(ConnectOutcome::Connected(edge))
            }
            Err(ConnectionError::DuplicateEdge { edge }) => {
                Ok(ConnectOutcome::AlreadyConnected(edge))
            }
            Err(e) => Err(e),
        }
    }

    fn push_edge(&mut self, edge: Connection) {
        debug!(edge = %edge, "added connection");
        self.edges.push(edge);
        self.reindex();
    }

    /// Removes exactly the given edge.
    ///
    /// # Errors
    ///
    /// Returns `EdgeNotFound` if the 4-tuple is not present.
    pub fn remove_edge(&mut self, edge: &Connection) -> Result<(), GraphError> {
        let position = self
            .edges
            .iter()
            .position(|e| e == edge)
            .ok_or_else(|| GraphError::EdgeNotFound { edge: edge.clone() })?;

        self.edges.remove(position);
        self.reindex();
        debug!(edge = %edge, "removed connection");
        Ok(())
    }

    /// Moves a node on the canvas.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node is absent.
    pub fn move_node(&mut self, node_id: &NodeId, position: Position) -> Result<(), GraphError> {
        self.node_mut(node_id)?.position = position;
        Ok(())
    }

    /// Replaces a node's option values.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node is absent.
    pub fn update_node_config(
        &mut self,
        node_id: &NodeId,
        config: ModuleConfig,
    ) -> Result<(), GraphError> {
        self.node_mut(node_id)?.config = config;
        debug!(node_id = %node_id, "updated node config");
        Ok(())
    }

    /// Renames a node.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node is absent.
    pub fn rename_node(&mut self, node_id: &NodeId, name: impl Into<String>) -> Result<(), GraphError> {
        self.node_mut(node_id)?.name = name.into();
        Ok(())
    }

    /// Writes run outputs onto nodes. Nodes without an output are cleared.
    pub fn set_execution_results(&mut self, outputs: &HashMap<NodeId, JsonValue>) {
        for node in &mut self.nodes {
            node.execution_result = outputs.get(&node.id).cloned();
        }
    }

    /// Orders the graph for execution.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError`] if the graph has a cycle.
    pub fn execution_order(&self) -> Result<Vec<NodeId>, CycleError> {
        order::execution_order(&self.nodes, &self.edges)
    }

    fn node_mut(&mut self, node_id: &NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .iter_mut()
            .find(|n| &n.id == node_id)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })
    }

    /// Recomputes every port's `connected_to` from the edge list.
    fn reindex(&mut self) {
        let mut index: HashMap<(NodeId, PortDirection, String), Vec<PortEndpoint>> = HashMap::new();
        for edge in &self.edges {
            index
                .entry((
                    edge.source_item_id.clone(),
                    PortDirection::Output,
                    edge.source_port_id.clone(),
                ))
                .or_default()
                .push(edge.target());
            index
                .entry((
                    edge.target_item_id.clone(),
                    PortDirection::Input,
                    edge.target_port_id.clone(),
                ))
                .or_default()
                .push(edge.source());
        }

        for node in &mut self.nodes {
            let node_id = node.id.clone();
            for (direction, port) in node.ports_mut() {
                let endpoints = index
                    .remove(&(node_id.clone(), direction, port.id.clone()))
                    .unwrap_or_default();
                port.set_connected_to(endpoints);
            }
        }
    }
}

//! A single level of the layered proximity graph.
//!
//! A layer owns its nodes, links every new node to its exact nearest
//! neighbors by a full scan, repairs the neighborhood on removal, and answers
//! greedy local searches.

use super::node::Node;
use crate::distance::Distance;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, trace};

/// One level of the graph. Level 0 is the base layer and holds every node.
#[derive(Debug, Clone)]
pub struct Layer {
    level: usize,
    max_edges: usize,
    distance: Distance,
    /// Insertion-ordered, keyed by node id.
    nodes: IndexMap<String, Node>,
}

impl Layer {
    /// Creates an empty layer.
    #[must_use]
    pub fn new(level: usize, max_edges: usize, distance: Distance) -> Self {
        Self {
            level,
            max_edges,
            distance,
            nodes: IndexMap::new(),
        }
    }

    /// Level number, 0 being the base layer.
    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Edge cap shared by every node of the layer.
    #[must_use]
    pub fn max_edges(&self) -> usize {
        self.max_edges
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the layer holds no node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if a node with this id is stored.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Stores a node and links it to its `max_edges` nearest nodes.
    ///
    /// A node already stored under the same id is removed first.
    pub fn add_node(&mut self, id: &str, vector: Vec<f32>) {
        if self.contains(id) {
            self.remove_node(id);
        }

        self.insert_unlinked(id, vector);
        self.connect_nearest_neighbors(id);

        debug!(
            id,
            level = self.level,
            degree = self.nodes.get(id).map_or(0, Node::degree),
            layer_size = self.nodes.len(),
            "Node added"
        );
    }

    /// Ranks every other node by score to `vector` and keeps the best
    /// `max_edges`. Ties keep layer order.
    fn rank_candidates(&self, id: &str, vector: &[f32]) -> Vec<(usize, f32)> {
        let order = self.distance.order();
        let mut ranked: Vec<(usize, f32)> = self
            .nodes
            .values()
            .enumerate()
            .filter(|(_, node)| node.id() != id)
            .map(|(index, node)| (index, self.distance.score(vector, node.vector())))
            .collect();

        ranked.sort_by(|a, b| order.compare(a.1, b.1));
        ranked.truncate(self.max_edges);
        ranked
    }

    /// Links `id` both ways to its exact nearest nodes in this layer.
    fn connect_nearest_neighbors(&mut self, id: &str) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let candidates: Vec<(String, f32)> = self
            .rank_candidates(id, node.vector())
            .into_iter()
            .filter_map(|(index, distance)| {
                self.nodes
                    .get_index(index)
                    .map(|(other, _)| (other.clone(), distance))
            })
            .collect();

        let order = self.distance.order();
        for (other, distance) in candidates {
            if let Some(node) = self.nodes.get_mut(id) {
                node.add_neighbor(&other, distance, order);
            }
            if let Some(node) = self.nodes.get_mut(&other) {
                node.add_neighbor(id, distance, order);
            }
        }
    }

    /// Removes a node and repairs the neighborhood it leaves behind.
    ///
    /// Every edge pointing at the node is dropped, then the connection policy
    /// runs again for each node that had an edge to or from it. Returns
    /// `false` for an unknown id, which is not an error.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(removed) = self.nodes.shift_remove(id) else {
            return false;
        };

        let mut affected: Vec<String> = removed.neighbor_ids().map(str::to_string).collect();
        for node in self.nodes.values_mut() {
            if node.has_neighbor(id) {
                node.remove_neighbor(id);
                if !affected.iter().any(|a| a == node.id()) {
                    affected.push(node.id().to_string());
                }
            }
        }

        for other in &affected {
            self.connect_nearest_neighbors(other);
        }

        debug!(
            id,
            level = self.level,
            repaired = affected.len(),
            layer_size = self.nodes.len(),
            "Node removed"
        );
        true
    }

    /// Detaches a node: every neighbor drops its edge back to it, then the
    /// node's own list is emptied. The node itself stays stored.
    pub fn clear_neighbors(&mut self, id: &str) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        for neighbor in node.take_neighbors() {
            if let Some(other) = self.nodes.get_mut(&neighbor.id) {
                other.remove_neighbor(id);
            }
        }
    }

    /// Greedy local search for `query`.
    ///
    /// Starts from `start_id` when it is stored here, otherwise from the
    /// first stored node, and moves to the best strictly closer unvisited
    /// neighbor until none improves. On level 0 with `n_closest > 1` the
    /// result is the head of the final node's own neighbor list; otherwise
    /// it is the final node alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyStructure`] if the layer holds no node.
    pub fn search(
        &self,
        start_id: Option<&str>,
        query: &[f32],
        n_closest: usize,
    ) -> Result<Vec<String>> {
        let start = start_id
            .and_then(|id| self.nodes.get(id))
            .or_else(|| self.nodes.first().map(|(_, node)| node))
            .ok_or_else(|| {
                Error::EmptyStructure(format!("layer {} has no nodes to search", self.level))
            })?;

        let order = self.distance.order();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = start;
        let mut hops = 0usize;

        loop {
            let mut best = current;
            let mut best_distance = self.distance.score(query, current.vector());
            let mut improved = false;

            for neighbor in current.neighbors() {
                if visited.contains(neighbor.id.as_str()) {
                    continue;
                }
                let Some(candidate) = self.nodes.get(&neighbor.id) else {
                    continue;
                };
                let candidate_distance = self.distance.score(query, candidate.vector());
                if order.is_better(candidate_distance, best_distance) {
                    best = candidate;
                    best_distance = candidate_distance;
                    improved = true;
                }
            }

            current = best;
            visited.insert(current.id());
            if !improved {
                break;
            }
            hops += 1;
        }

        trace!(
            level = self.level,
            start = start.id(),
            reached = current.id(),
            hops,
            "Layer search converged"
        );

        if self.level == 0 && n_closest > 1 {
            return Ok(current
                .neighbor_ids()
                .take(n_closest)
                .map(str::to_string)
                .collect());
        }
        Ok(vec![current.id().to_string()])
    }

    /// Stores a node without linking it.
    pub(crate) fn insert_unlinked(&mut self, id: &str, vector: Vec<f32>) {
        self.nodes.insert(
            id.to_string(),
            Node::new(id, vector, self.max_edges, self.level),
        );
    }

    /// Adds the one-way edge `from -> to`, scoring it from the stored vectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either id is not stored here.
    pub(crate) fn link_one_way(&mut self, from: &str, to: &str) -> Result<()> {
        let target = self.nodes.get(to).ok_or_else(|| {
            Error::InvalidInput(format!(
                "edge {from} -> {to} points outside layer {}",
                self.level
            ))
        })?;
        let source = self.nodes.get(from).ok_or_else(|| {
            Error::InvalidInput(format!("node {from} is not stored in layer {}", self.level))
        })?;
        let distance = self.distance.score(source.vector(), target.vector());
        let order = self.distance.order();

        if let Some(node) = self.nodes.get_mut(from) {
            node.add_neighbor(to, distance, order);
        }
        Ok(())
    }
}

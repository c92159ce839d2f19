//! Graph vertex holding a vector and its ranked neighbor edges.

use crate::distance::ScoreOrder;

/// An edge from one node to another node of the same layer.
///
/// The target is referenced by id and resolved through the owning layer, so
/// an edge never keeps a removed node alive.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// Id of the neighboring node.
    pub id: String,
    /// Score between the two nodes' vectors.
    pub distance: f32,
}

/// A vector-bearing vertex of a [`super::Layer`].
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    vector: Vec<f32>,
    layer: usize,
    max_edges: usize,
    /// Best-first, at most `max_edges` long.
    neighbors: Vec<Neighbor>,
}

impl Node {
    /// Creates a node with no edges.
    #[must_use]
    pub fn new(id: impl Into<String>, vector: Vec<f32>, max_edges: usize, layer: usize) -> Self {
        Self {
            id: id.into(),
            vector,
            layer,
            max_edges,
            neighbors: Vec::with_capacity(max_edges + 1),
        }
    }

    /// Caller-supplied identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stored vector.
    #[must_use]
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// Level of the layer this node lives in.
    #[must_use]
    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Maximum number of edges kept.
    #[must_use]
    pub fn max_edges(&self) -> usize {
        self.max_edges
    }

    /// Edges, best first.
    #[must_use]
    pub fn neighbors(&self) -> &[Neighbor] {
        &self.neighbors
    }

    /// Ids of the edges, best first.
    pub fn neighbor_ids(&self) -> impl Iterator<Item = &str> {
        self.neighbors.iter().map(|n| n.id.as_str())
    }

    /// Number of edges.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    /// Returns true if this node has an edge to `id`.
    #[must_use]
    pub fn has_neighbor(&self, id: &str) -> bool {
        self.neighbors.iter().any(|n| n.id == id)
    }

    /// Adds an edge to `id`, keeping the list ranked and capped.
    ///
    /// Self edges are ignored and an existing edge to the same id is
    /// replaced. Among equal scores the newer edge ranks last. When the list
    /// grows past `max_edges` the worst edge is evicted, which may be the new
    /// one. Only this node is touched: the caller links the other side.
    pub fn add_neighbor(&mut self, id: &str, distance: f32, order: ScoreOrder) {
        if id == self.id {
            return;
        }
        self.remove_neighbor(id);

        let position = self
            .neighbors
            .partition_point(|n| order.compare(n.distance, distance).is_le());
        self.neighbors.insert(
            position,
            Neighbor {
                id: id.to_string(),
                distance,
            },
        );

        if self.neighbors.len() > self.max_edges {
            self.neighbors.pop();
        }
    }

    /// Removes every edge to `id`. Absent ids are ignored.
    pub fn remove_neighbor(&mut self, id: &str) {
        self.neighbors.retain(|n| n.id != id);
    }

    /// Empties the edge list and returns what it held.
    ///
    /// Back-references on the other side are left to the layer, see
    /// [`super::Layer::clear_neighbors`].
    pub fn take_neighbors(&mut self) -> Vec<Neighbor> {
        std::mem::take(&mut self.neighbors)
    }
}

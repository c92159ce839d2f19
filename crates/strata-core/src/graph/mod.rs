//! Proximity graph building blocks.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Layer (one per level)                  │
//! │  nodes: IndexMap<String, Node>          │
//! │  max_edges, level, distance             │
//! ├─────────────────────────────────────────┤
//! │  Node                                   │
//! │  id, vector, neighbors: Vec<Neighbor>   │
//! │  (best-first, capped at max_edges)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Edges reference their target by id, resolved through the owning layer.

mod layer;
mod node;

pub use layer::Layer;
pub use node::{Neighbor, Node};

#[cfg(test)]
mod layer_tests;

//! Structural snapshots of an index and their encodings.
//!
//! A snapshot records, per layer, every node's id, vector and neighbor ids,
//! plus the index configuration and the distance strategy's name. Edge
//! scores are not stored: restoring recomputes them with the strategy, so a
//! restore is exact only for a deterministic, unchanged strategy.
//!
//! # Encodings
//!
//! | Method | Format |
//! |---|---|
//! | [`IndexSnapshot::to_json`] | `serde_json`, human readable |
//! | [`IndexSnapshot::to_bytes`] | `bincode`, compact |
//! | [`LayeredIndex::save`] / [`LayeredIndex::load`] | `bincode` in one file |

use crate::distance::Distance;
use crate::error::{Error, Result};
use crate::graph::{Layer, Node};
use crate::index::{validate_components, LayeredIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// One node of a [`LayerSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node id.
    pub id: String,
    /// Stored vector.
    pub vector: Vec<f32>,
    /// Neighbor ids, best first.
    pub neighbors: Vec<String>,
}

impl From<&Node> for NodeSnapshot {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id().to_string(),
            vector: node.vector().to_vec(),
            neighbors: node.neighbor_ids().map(str::to_string).collect(),
        }
    }
}

/// One layer of an [`IndexSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    /// Level number.
    pub level: usize,
    /// Nodes in insertion order.
    pub nodes: Vec<NodeSnapshot>,
}

impl From<&Layer> for LayerSnapshot {
    fn from(layer: &Layer) -> Self {
        Self {
            level: layer.level(),
            nodes: layer.nodes().map(NodeSnapshot::from).collect(),
        }
    }
}

/// Structural dump of a [`LayeredIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Number of layers.
    pub max_layers: usize,
    /// Edge cap per node.
    pub max_edges: usize,
    /// Distance strategy name.
    pub distance: String,
    /// Established vector dimension, if any vector was ever inserted.
    #[serde(default)]
    pub dimension: Option<usize>,
    /// Layers, base first.
    pub layers: Vec<LayerSnapshot>,
}

impl IndexSnapshot {
    /// Encodes the snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the input is not a snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encodes the snapshot with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes a bincode snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the input is not a snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Total number of node entries across layers.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.nodes.len()).sum()
    }
}

impl LayeredIndex {
    /// Captures the index structure.
    #[must_use]
    pub fn serialize(&self) -> IndexSnapshot {
        IndexSnapshot {
            max_layers: self.max_layers,
            max_edges: self.max_edges,
            distance: self.distance.name().to_string(),
            dimension: self.dimension,
            layers: self.layers.iter().map(LayerSnapshot::from).collect(),
        }
    }

    /// Rebuilds an index whose strategy is a built-in metric named in the
    /// snapshot.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if the strategy name is unknown.
    /// - [`Error::InvalidInput`] if the snapshot is inconsistent.
    pub fn restore(snapshot: IndexSnapshot) -> Result<Self> {
        let distance = Distance::from_name(&snapshot.distance)?;
        Self::restore_with(snapshot, distance)
    }

    /// Rebuilds an index with an explicit strategy, e.g. a custom one.
    ///
    /// Edge scores are recomputed with `distance`.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if `distance` is not the strategy the
    ///   snapshot names, or the counts are invalid.
    /// - [`Error::InvalidInput`] if the snapshot is inconsistent: wrong layer
    ///   count or order, duplicate ids, invalid vectors, mixed dimensions, an
    ///   upper-layer node missing below, or an edge leaving its layer.
    pub fn restore_with(snapshot: IndexSnapshot, distance: Distance) -> Result<Self> {
        if distance.name() != snapshot.distance {
            return Err(Error::Configuration(format!(
                "snapshot uses distance strategy '{}', got '{}'",
                snapshot.distance,
                distance.name()
            )));
        }

        let mut index = Self::new(snapshot.max_layers, snapshot.max_edges, distance)?;
        if snapshot.layers.len() != snapshot.max_layers {
            return Err(Error::InvalidInput(format!(
                "snapshot declares {} layers but holds {}",
                snapshot.max_layers,
                snapshot.layers.len()
            )));
        }

        let mut dimension = snapshot.dimension;
        for (level, layer_snapshot) in snapshot.layers.iter().enumerate() {
            if layer_snapshot.level != level {
                return Err(Error::InvalidInput(format!(
                    "layer at position {level} is labelled level {}",
                    layer_snapshot.level
                )));
            }

            let mut seen = HashSet::new();
            for node in &layer_snapshot.nodes {
                if !seen.insert(node.id.as_str()) {
                    return Err(Error::InvalidInput(format!(
                        "node {} appears twice in layer {level}",
                        node.id
                    )));
                }
                validate_components(&node.vector)?;
                index.distance.check_vector(&node.vector)?;
                match dimension {
                    Some(expected) if expected != node.vector.len() => {
                        return Err(Error::DimensionMismatch {
                            expected,
                            actual: node.vector.len(),
                        });
                    }
                    _ => dimension = Some(node.vector.len()),
                }
                if level > 0 && !index.layers[level - 1].contains(&node.id) {
                    return Err(Error::InvalidInput(format!(
                        "node {} is in layer {level} but not in layer {}",
                        node.id,
                        level - 1
                    )));
                }
                index.layers[level].insert_unlinked(&node.id, node.vector.clone());
            }

            for node in &layer_snapshot.nodes {
                for neighbor in &node.neighbors {
                    index.layers[level].link_one_way(&node.id, neighbor)?;
                }
            }
        }
        index.dimension = dimension;

        info!(
            distance = index.distance.name(),
            layers = index.max_layers,
            size = index.len(),
            "Index restored from snapshot"
        );
        Ok(index)
    }

    /// Writes a bincode snapshot to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Serialization`] on failure.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &self.serialize())?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a bincode snapshot written by [`Self::save`] and restores it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`], [`Error::Serialization`], or any error of
    /// [`Self::restore`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let snapshot: IndexSnapshot = bincode::deserialize_from(BufReader::new(file))?;
        Self::restore(snapshot)
    }
}

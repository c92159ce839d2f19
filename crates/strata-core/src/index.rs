//! Multi-layer index: level sampling, insertion, removal and query descent.
//!
//! # Architecture
//!
//! ```text
//! level max_layers-1  ●               sparse, entry for descent
//!         ...         ●───●
//! level 1             ●───●───●
//! level 0             ●───●───●───●───●   every node
//! ```
//!
//! A node sampled at level `L` is stored in every layer `0..=L`, so each
//! layer is a superset of the one above it. Queries walk greedily from the
//! top layer down, carrying the best id of each layer as the entry point of
//! the next.

use crate::config::IndexConfig;
use crate::distance::Distance;
use crate::error::{Error, Result};
use crate::graph::Layer;
use tracing::{debug, warn};

/// Seed used when none is supplied.
const DEFAULT_SEED: u64 = 0x5DEE_CE66_D1A4_B5B5;

/// In-memory approximate nearest-neighbor index over a stack of layers.
///
/// Mutations take `&mut self` and queries take `&self`; wrap the index in a
/// lock to share it between threads.
#[derive(Debug, Clone)]
pub struct LayeredIndex {
    pub(crate) layers: Vec<Layer>,
    pub(crate) max_layers: usize,
    pub(crate) max_edges: usize,
    pub(crate) distance: Distance,
    /// Fixed by the first successful insertion.
    pub(crate) dimension: Option<usize>,
    /// xorshift64 state for level sampling.
    rng_state: u64,
}

impl LayeredIndex {
    /// Creates an empty index with `max_layers` layers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `max_layers` or `max_edges` is 0.
    pub fn new(max_layers: usize, max_edges: usize, distance: impl Into<Distance>) -> Result<Self> {
        if max_layers == 0 {
            return Err(Error::Configuration(
                "max_layers must be at least 1".to_string(),
            ));
        }
        if max_edges == 0 {
            return Err(Error::Configuration(
                "max_edges must be at least 1".to_string(),
            ));
        }

        let distance = distance.into();
        let layers = (0..max_layers)
            .map(|level| Layer::new(level, max_edges, distance.clone()))
            .collect();

        Ok(Self {
            layers,
            max_layers,
            max_edges,
            distance,
            dimension: None,
            rng_state: DEFAULT_SEED,
        })
    }

    /// Creates an empty index using a built-in strategy looked up by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unknown name or a zero count.
    pub fn with_metric_name(max_layers: usize, max_edges: usize, name: &str) -> Result<Self> {
        Self::new(max_layers, max_edges, Distance::from_name(name)?)
    }

    /// Creates an empty index from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the configuration is invalid.
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        let index = Self::with_metric_name(config.max_layers, config.max_edges, &config.distance)?;
        Ok(match config.seed {
            Some(seed) => index.with_seed(seed),
            None => index,
        })
    }

    /// Reseeds level sampling, making insertions reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        // xorshift never leaves the all-zero state
        self.rng_state = if seed == 0 { DEFAULT_SEED } else { seed };
        self
    }

    /// Number of layers.
    #[must_use]
    pub fn max_layers(&self) -> usize {
        self.max_layers
    }

    /// Edge cap per node.
    #[must_use]
    pub fn max_edges(&self) -> usize {
        self.max_edges
    }

    /// Configured distance strategy.
    #[must_use]
    pub fn distance(&self) -> &Distance {
        &self.distance
    }

    /// Vector length fixed by the first insertion, if any.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of stored entries (the size of the base layer).
    #[must_use]
    pub fn len(&self) -> usize {
        self.base().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base().is_empty()
    }

    /// Returns true if an entry with this id is stored.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.base().contains(id)
    }

    /// Layer at `level`, if it exists.
    #[must_use]
    pub fn layer(&self, level: usize) -> Option<&Layer> {
        self.layers.get(level)
    }

    /// All layers, base first.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Node count of every layer, base first.
    #[must_use]
    pub fn layer_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(Layer::len).collect()
    }

    fn base(&self) -> &Layer {
        &self.layers[0]
    }

    /// Inserts `vector` under `id`.
    ///
    /// Components must be finite and within `[0, 1]`, and the length must
    /// match the dimension fixed by the first insertion. Re-adding a stored
    /// id replaces the previous entry. Nothing is modified when this fails.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for a non-finite or out-of-range component.
    /// - [`Error::DimensionMismatch`] for a vector of the wrong length.
    /// - [`Error::DegenerateInput`] if the strategy cannot score the vector.
    pub fn add(&mut self, id: &str, vector: &[f32]) -> Result<()> {
        validate_components(vector)?;
        self.check_dimension(vector)?;
        self.distance.check_vector(vector)?;

        if self.contains(id) {
            self.remove(id);
        }

        let level = self.random_level();
        for layer in &mut self.layers[..=level] {
            layer.add_node(id, vector.to_vec());
        }
        self.dimension.get_or_insert(vector.len());

        debug!(id, level, size = self.len(), "Entry inserted");
        Ok(())
    }

    /// Inserts every pair in order.
    ///
    /// There is no rollback: on the first failure the error is returned and
    /// the pairs before it stay inserted.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Self::add`].
    pub fn add_bulk<I, S, V>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: AsRef<[f32]>,
    {
        for (position, (id, vector)) in items.into_iter().enumerate() {
            if let Err(err) = self.add(id.as_ref(), vector.as_ref()) {
                warn!(position, id = id.as_ref(), error = %err, "Bulk insertion stopped");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Removes `id` from every layer. Unknown ids are ignored.
    pub fn remove(&mut self, id: &str) {
        let removed_from = self
            .layers
            .iter_mut()
            .map(|layer| layer.remove_node(id))
            .filter(|removed| *removed)
            .count();

        if removed_from > 0 {
            debug!(id, layers = removed_from, size = self.len(), "Entry removed");
        }
    }

    /// Returns up to `n_closest` ids near `vector`.
    ///
    /// The search descends greedily from the top layer, skipping layers that
    /// are still empty, and carries the best id of each layer down as the
    /// next entry point. On the base layer a request for more than one id is
    /// answered from the neighbor list of the node the walk ends on, so the
    /// result may hold fewer than `n_closest` ids.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyStructure`] if the index holds no entry.
    /// - [`Error::InvalidInput`] / [`Error::DimensionMismatch`] for a query
    ///   with non-finite components or the wrong length.
    /// - [`Error::DegenerateInput`] if the strategy cannot score the query.
    pub fn query(&self, vector: &[f32], n_closest: usize) -> Result<Vec<String>> {
        if self.is_empty() {
            return Err(Error::EmptyStructure(
                "index holds no vectors to query".to_string(),
            ));
        }
        if let Some(bad) = vector.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "query component {bad} is not a finite number"
            )));
        }
        self.check_dimension(vector)?;
        self.distance.check_vector(vector)?;

        if n_closest == 0 {
            return Ok(Vec::new());
        }

        let mut entry: Option<String> = None;
        for layer in self.layers[1..].iter().rev() {
            if layer.is_empty() {
                continue;
            }
            entry = layer.search(entry.as_deref(), vector, 1)?.into_iter().next();
        }

        self.base().search(entry.as_deref(), vector, n_closest)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != vector.len() => Err(Error::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Samples an insertion level by fair coin flips, capped at the top
    /// layer.
    fn random_level(&mut self) -> usize {
        let mut level = 0;
        while level + 1 < self.max_layers && self.coin_flip() {
            level += 1;
        }
        level
    }

    fn coin_flip(&mut self) -> bool {
        let mut state = self.rng_state;
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        self.rng_state = state;
        state >> 63 == 1
    }
}

/// Checks that every component is a finite number in `[0, 1]`.
pub(crate) fn validate_components(vector: &[f32]) -> Result<()> {
    if vector.is_empty() {
        return Err(Error::InvalidInput("vector is empty".to_string()));
    }
    match vector
        .iter()
        .position(|v| !v.is_finite() || !(0.0..=1.0).contains(v))
    {
        Some(position) => Err(Error::InvalidInput(format!(
            "component {position} is {}, every component must be a finite number in [0, 1]",
            vector[position]
        ))),
        None => Ok(()),
    }
}

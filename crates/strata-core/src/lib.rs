//! # `Strata` Core
//!
//! In-memory approximate nearest-neighbor index over fixed-length vectors,
//! organized as a small multi-layer proximity graph in the style of
//! hierarchical navigable small-world graphs.
//!
//! ## Features
//!
//! - **Exact linking**: each inserted node is linked to its true nearest
//!   neighbors in every layer it joins (full scan, capped at `max_edges`)
//! - **Greedy descent**: queries hill-climb from the top layer to the base
//! - **Pluggable distance**: Euclidean, cosine, or a named custom function
//! - **Removal with repair**: neighborhoods are re-linked after a removal
//! - **Snapshots**: structural dump/restore as JSON or bincode
//!
//! ## Quick Start
//!
//! ```rust
//! use strata_core::{DistanceMetric, LayeredIndex};
//!
//! let mut index = LayeredIndex::new(3, 2, DistanceMetric::Euclidean)?;
//! index.add("a", &[0.1, 0.1])?;
//! index.add("b", &[0.2, 0.2])?;
//! index.add("c", &[0.9, 0.9])?;
//!
//! let nearest = index.query(&[0.85, 0.85], 1)?;
//! assert_eq!(nearest, vec!["c"]);
//!
//! let restored = LayeredIndex::restore(index.serialize())?;
//! assert_eq!(restored.query(&[0.85, 0.85], 1)?, nearest);
//! # Ok::<(), strata_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod distance;
pub mod error;
pub mod graph;
pub mod index;
pub mod snapshot;

pub use config::{ConfigError, IndexConfig, LoggingConfig, StrataConfig};
pub use distance::{CustomDistance, Distance, DistanceFn, DistanceMetric, ScoreOrder};
pub use error::{Error, Result};
pub use graph::{Layer, Neighbor, Node};
pub use index::LayeredIndex;
pub use snapshot::{IndexSnapshot, LayerSnapshot, NodeSnapshot};

//! Distance strategies used to rank vectors against each other.
//!
//! A strategy is a pure function over two equal-length vectors returning a
//! scalar, plus the direction in which that scalar ranks candidates:
//!
//! - **Euclidean**: L2 distance, lower is closer.
//! - **Cosine**: cosine similarity in `[-1, 1]`, higher is closer.
//!
//! Callers may also plug in their own function through [`CustomDistance`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Signature of a caller-supplied distance function.
pub type DistanceFn = fn(&[f32], &[f32]) -> f32;

/// Direction in which a strategy's scores rank candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOrder {
    /// Lower scores are closer (distances).
    Ascending,
    /// Higher scores are closer (similarities).
    Descending,
}

impl ScoreOrder {
    /// Orders two scores best-first.
    ///
    /// Uses `f32::total_cmp`, so NaN never corrupts a sort.
    #[must_use]
    #[inline]
    pub fn compare(self, a: f32, b: f32) -> Ordering {
        match self {
            Self::Ascending => a.total_cmp(&b),
            Self::Descending => b.total_cmp(&a),
        }
    }

    /// Returns true if `candidate` is strictly closer than `current`.
    #[must_use]
    #[inline]
    pub fn is_better(self, candidate: f32, current: f32) -> bool {
        self.compare(candidate, current) == Ordering::Less
    }

    /// The score that ranks behind every finite score.
    #[must_use]
    pub const fn worst(self) -> f32 {
        match self {
            Self::Ascending => f32::INFINITY,
            Self::Descending => f32::NEG_INFINITY,
        }
    }
}

/// Built-in distance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Euclidean distance (L2 norm).
    /// Lower is closer.
    #[default]
    Euclidean,

    /// Cosine similarity.
    /// Higher is closer; undefined for zero-magnitude vectors.
    Cosine,
}

impl DistanceMetric {
    /// Every built-in metric, in declaration order.
    pub const ALL: [Self; 2] = [Self::Euclidean, Self::Cosine];

    /// Stable name used in configuration files and snapshots.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Cosine => "cosine",
        }
    }

    /// Resolves a metric from its name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unrecognized name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|metric| metric.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "unknown distance strategy '{name}', expected one of: euclidean, cosine"
                ))
            })
    }

    /// Calculates the score between two vectors.
    ///
    /// # Errors
    ///
    /// Cosine fails with [`Error::InvalidInput`] on a length mismatch and
    /// with [`Error::DegenerateInput`] when either vector has zero magnitude.
    /// Euclidean never fails; it relies on the caller for equal lengths.
    #[inline]
    pub fn calculate(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        match self {
            Self::Euclidean => Ok(euclidean_distance(a, b)),
            Self::Cosine => cosine_similarity(a, b),
        }
    }

    /// Returns whether higher values indicate more similarity.
    #[must_use]
    pub const fn higher_is_better(&self) -> bool {
        match self {
            Self::Cosine => true,
            Self::Euclidean => false,
        }
    }

    /// Ranking direction of this metric's scores.
    #[must_use]
    pub const fn order(&self) -> ScoreOrder {
        if self.higher_is_better() {
            ScoreOrder::Descending
        } else {
            ScoreOrder::Ascending
        }
    }

    /// Sorts `(id, score)` results best-first according to the metric.
    ///
    /// The sort is stable: equal scores keep their input order.
    pub fn sort_results<T>(&self, results: &mut [(T, f32)]) {
        let order = self.order();
        results.sort_by(|a, b| order.compare(a.1, b.1));
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Euclidean distance between two vectors.
///
/// Lengths are not checked: the sum stops at the shorter vector, so callers
/// must enforce equal lengths upstream.
#[must_use]
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Cosine similarity between two vectors, in `[-1, 1]`.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if the vectors differ in length.
/// - [`Error::DegenerateInput`] if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::InvalidInput(format!(
            "cosine similarity needs equal lengths, got {} and {}",
            a.len(),
            b.len()
        )));
    }

    let (norm_a, norm_b) = (magnitude(a), magnitude(b));
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(Error::DegenerateInput(
            "cosine similarity is undefined for a zero-magnitude vector".to_string(),
        ));
    }

    // two divisions so tiny norms cannot underflow as a product; larger
    // first keeps the score symmetric in its arguments
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let (small, large) = (norm_a.min(norm_b), norm_a.max(norm_b));
    Ok((dot / large / small).clamp(-1.0, 1.0))
}

/// L2 norm, accumulated in `f32`.
#[inline]
fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// A caller-supplied distance function with a stable name.
///
/// The name is what a snapshot records; restoring such a snapshot requires
/// handing the same strategy back to [`crate::LayeredIndex::restore_with`].
#[derive(Clone)]
pub struct CustomDistance {
    name: String,
    func: DistanceFn,
    order: ScoreOrder,
}

impl CustomDistance {
    /// Creates a custom strategy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `name` is empty or collides with a
    /// built-in metric name.
    pub fn new(name: impl Into<String>, func: DistanceFn, order: ScoreOrder) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Configuration(
                "custom distance strategy needs a non-empty name".to_string(),
            ));
        }
        if DistanceMetric::from_name(&name).is_ok() {
            return Err(Error::Configuration(format!(
                "custom distance strategy name '{name}' shadows a built-in metric"
            )));
        }
        Ok(Self { name, func, order })
    }

    /// Name recorded in snapshots.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ranking direction of this strategy's scores.
    #[must_use]
    pub fn order(&self) -> ScoreOrder {
        self.order
    }
}

impl fmt::Debug for CustomDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomDistance")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// The strategy an index is configured with.
#[derive(Debug, Clone)]
pub enum Distance {
    /// One of the built-in metrics.
    Builtin(DistanceMetric),
    /// A caller-supplied function.
    Custom(CustomDistance),
}

impl Default for Distance {
    fn default() -> Self {
        Self::Builtin(DistanceMetric::Euclidean)
    }
}

impl From<DistanceMetric> for Distance {
    fn from(metric: DistanceMetric) -> Self {
        Self::Builtin(metric)
    }
}

impl From<CustomDistance> for Distance {
    fn from(custom: CustomDistance) -> Self {
        Self::Custom(custom)
    }
}

impl Distance {
    /// Resolves a built-in strategy by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unrecognized name.
    pub fn from_name(name: &str) -> Result<Self> {
        DistanceMetric::from_name(name).map(Self::Builtin)
    }

    /// Stable name of the strategy.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(metric) => metric.name(),
            Self::Custom(custom) => custom.name(),
        }
    }

    /// Ranking direction of the strategy's scores.
    #[must_use]
    pub fn order(&self) -> ScoreOrder {
        match self {
            Self::Builtin(metric) => metric.order(),
            Self::Custom(custom) => custom.order,
        }
    }

    /// Computes the score between two vectors.
    ///
    /// # Errors
    ///
    /// Propagates the built-in metric's failures; custom functions never fail.
    #[inline]
    pub fn compute(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        match self {
            Self::Builtin(metric) => metric.calculate(a, b),
            Self::Custom(custom) => Ok((custom.func)(a, b)),
        }
    }

    /// Checks that a vector can be scored against any other stored vector.
    ///
    /// # Errors
    ///
    /// Cosine rejects zero-magnitude vectors with [`Error::DegenerateInput`],
    /// including vectors whose squared norm underflows to zero in `f32`.
    pub fn check_vector(&self, vector: &[f32]) -> Result<()> {
        match self {
            Self::Builtin(DistanceMetric::Cosine) if magnitude(vector) == 0.0 => {
                Err(Error::DegenerateInput(
                    "cosine strategy cannot store a zero-magnitude vector".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Scores two vectors that already passed [`Self::check_vector`] and share
    /// a length. A failure on that path ranks as the worst possible score.
    #[inline]
    pub(crate) fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        self.compute(a, b).unwrap_or_else(|_| self.order().worst())
    }
}

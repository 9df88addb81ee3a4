//! Vector index abstraction and the exact brute-force implementation.

mod flat;

pub use flat::{FlatL2Index, squared_l2};

use crate::error::CatalogResult;
use crate::models::Neighbor;

/// Append-only store of fixed-dimension vectors with nearest-neighbour search.
///
/// Positions are assigned in insertion order starting at 0 and never change.
/// Implementations must return neighbours sorted by ascending distance, with
/// ties ordered by ascending position.
pub trait VectorIndex: Send + Sync + 'static {
    /// Create an empty index for vectors of `dimension` components.
    fn with_dimension(dimension: usize) -> Self
    where
        Self: Sized;

    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a vector, returning its position.
    fn append(&mut self, vector: Vec<f32>) -> CatalogResult<usize>;

    /// The `k` nearest stored vectors to `query`.
    fn search(&self, query: &[f32], k: usize) -> CatalogResult<Vec<Neighbor>>;

    /// Stored vector at `position`, if any.
    fn vector(&self, position: usize) -> Option<&[f32]>;
}

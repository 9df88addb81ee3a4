use super::VectorIndex;
use crate::error::{CatalogError, CatalogResult};
use crate::models::Neighbor;

/// Squared Euclidean distance. Callers guarantee equal lengths.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Exact k-NN over a flat, row-major buffer. Every search scans all vectors.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    fn check_dimension(&self, actual: usize) -> CatalogResult<()> {
        if actual != self.dimension {
            return Err(CatalogError::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }
}

impl VectorIndex for FlatL2Index {
    fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    fn append(&mut self, vector: Vec<f32>) -> CatalogResult<usize> {
        self.check_dimension(vector.len())?;
        let position = self.len();
        self.data.extend_from_slice(&vector);
        Ok(position)
    }

    fn search(&self, query: &[f32], k: usize) -> CatalogResult<Vec<Neighbor>> {
        if self.is_empty() {
            return Err(CatalogError::EmptyStore);
        }
        self.check_dimension(query.len())?;

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| Neighbor {
                position,
                distance: squared_l2(stored, query),
            })
            .collect();

        // Stable sort keeps ascending position for equal distances.
        // total_cmp keeps the order total when a distance is NaN.
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);

        Ok(neighbors)
    }

    fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start.checked_add(self.dimension)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(vectors: &[[f32; 2]]) -> FlatL2Index {
        let mut index = FlatL2Index::with_dimension(2);
        for v in vectors {
            index.append(v.to_vec()).unwrap();
        }
        index
    }

    #[test]
    fn test_append_assigns_sequential_positions() {
        let mut index = FlatL2Index::with_dimension(3);
        assert_eq!(index.append(vec![0.0, 0.0, 0.0]).unwrap(), 0);
        assert_eq!(index.append(vec![1.0, 1.0, 1.0]).unwrap(), 1);
        assert_eq!(index.len(), 2);
        assert_eq!(index.vector(1), Some(&[1.0, 1.0, 1.0][..]));
        assert_eq!(index.vector(2), None);
    }

    #[test]
    fn test_append_rejects_wrong_dimension() {
        let mut index = FlatL2Index::with_dimension(3);
        let err = index.append(vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(index.is_empty());
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = index_with(&[[5.0, 5.0], [0.0, 1.0], [0.0, 0.0]]);

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![2, 1, 0]);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[1].distance, 1.0);
        assert_eq!(hits[2].distance, 50.0);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_search_breaks_ties_by_position() {
        let index = index_with(&[[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, 0.0]]);

        let hits = index.search(&[0.0, 0.0], 4).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![3, 0, 1, 2]);
    }

    #[test]
    fn test_search_k_larger_than_len_returns_all() {
        let index = index_with(&[[1.0, 1.0], [2.0, 2.0]]);
        assert_eq!(index.search(&[0.0, 0.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn test_search_k_zero_returns_nothing() {
        let index = index_with(&[[1.0, 1.0]]);
        assert!(index.search(&[0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_empty_index() {
        let index = FlatL2Index::with_dimension(2);
        assert!(matches!(
            index.search(&[0.0, 0.0], 1),
            Err(CatalogError::EmptyStore)
        ));
    }

    #[test]
    fn test_search_rejects_wrong_query_dimension() {
        let index = index_with(&[[1.0, 1.0]]);
        assert!(matches!(
            index.search(&[0.0, 0.0, 0.0], 1),
            Err(CatalogError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_search_tolerates_nan_distances() {
        let mut index = FlatL2Index::with_dimension(1);
        for i in 0..40 {
            let value = if i % 3 == 0 { f32::NAN } else { i as f32 };
            index.append(vec![value]).unwrap();
        }

        let hits = index.search(&[0.0], 40).unwrap();
        assert_eq!(hits.len(), 40);

        let real: Vec<usize> = hits
            .iter()
            .filter(|n| !n.distance.is_nan())
            .map(|n| n.position)
            .collect();
        let expected: Vec<usize> = (0..40).filter(|i| i % 3 != 0).collect();
        assert_eq!(real, expected);

        let nan_positions: Vec<usize> = hits
            .iter()
            .enumerate()
            .filter(|(_, n)| n.distance.is_nan())
            .map(|(i, _)| i)
            .collect();
        assert!(nan_positions.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[1.0, 2.0], &[4.0, 6.0]), 25.0);
        assert_eq!(squared_l2(&[], &[]), 0.0);
    }
}

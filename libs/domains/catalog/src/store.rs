use tokio::sync::RwLock;
use tracing::debug;

use crate::catalog::CatalogStore;
use crate::error::{CatalogError, CatalogResult};
use crate::index::{FlatL2Index, VectorIndex};
use crate::models::{CatalogRecord, RetrievedRecord};
use crate::snapshot::{CatalogSnapshot, SnapshotEntry};

/// Dimension and finiteness check shared by writes and queries.
fn check_vector(vector: &[f32], dimension: usize) -> CatalogResult<()> {
    if vector.len() != dimension {
        return Err(CatalogError::DimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        });
    }
    match vector.iter().position(|x| !x.is_finite()) {
        Some(component) => Err(CatalogError::NonFiniteVector { component }),
        None => Ok(()),
    }
}

struct Stores<I> {
    index: I,
    catalog: CatalogStore,
}

/// The vector index and catalog store, kept in positional lockstep.
///
/// Both halves live behind a single lock: `commit` appends to each under the
/// write guard and `retrieve` reads under the read guard, so the i-th vector
/// always describes the i-th record and no reader sees one without the other.
pub struct RetrievalStore<I: VectorIndex = FlatL2Index> {
    dimension: usize,
    inner: RwLock<Stores<I>>,
}

impl<I: VectorIndex> RetrievalStore<I> {
    /// Empty store for vectors of `dimension` components.
    pub fn create(dimension: usize) -> Self {
        Self {
            dimension,
            inner: RwLock::new(Stores {
                index: I::with_dimension(dimension),
                catalog: CatalogStore::new(),
            }),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.catalog.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Append a (vector, record) pair as one unit, returning its position.
    ///
    /// The vector (length, no NaN or infinite components) is checked before
    /// either side is touched, so a rejected commit leaves both stores unchanged.
    pub async fn commit(&self, vector: Vec<f32>, record: CatalogRecord) -> CatalogResult<usize> {
        check_vector(&vector, self.dimension)?;

        let mut stores = self.inner.write().await;
        let position = stores.index.append(vector)?;
        let catalog_position = stores.catalog.append(record);
        debug_assert_eq!(position, catalog_position);

        Ok(position)
    }

    /// The `k` records nearest to `query`, closest first.
    pub async fn retrieve(&self, query: &[f32], k: usize) -> CatalogResult<Vec<RetrievedRecord>> {
        let stores = self.inner.read().await;
        if stores.catalog.is_empty() {
            return Err(CatalogError::EmptyStore);
        }
        check_vector(query, self.dimension)?;
        let neighbors = stores.index.search(query, k)?;

        let records = neighbors
            .into_iter()
            .enumerate()
            .map(|(i, neighbor)| {
                let record = stores.catalog.get(neighbor.position)?;
                Ok(RetrievedRecord {
                    rank: i + 1,
                    position: neighbor.position,
                    distance: neighbor.distance,
                    record: record.clone(),
                })
            })
            .collect::<CatalogResult<Vec<_>>>()?;

        debug!(
            hits = ?records.iter().map(|r| (r.position, r.distance)).collect::<Vec<_>>(),
            "Retrieved nearest records"
        );

        Ok(records)
    }

    /// Copy of every (vector, record) pair, in position order.
    pub async fn snapshot(&self) -> CatalogResult<CatalogSnapshot> {
        let stores = self.inner.read().await;

        let entries = stores
            .catalog
            .iter()
            .enumerate()
            .map(|(position, record)| {
                let vector = stores.index.vector(position).ok_or(
                    CatalogError::IndexOutOfRange {
                        position,
                        len: stores.index.len(),
                    },
                )?;
                Ok(SnapshotEntry {
                    vector: vector.to_vec(),
                    record: record.clone(),
                })
            })
            .collect::<CatalogResult<Vec<_>>>()?;

        Ok(CatalogSnapshot::new(self.dimension, entries))
    }

    /// Rebuild a store from a snapshot, re-checking every vector.
    pub fn restore(snapshot: CatalogSnapshot) -> CatalogResult<Self> {
        snapshot.validate()?;

        let mut stores = Stores {
            index: I::with_dimension(snapshot.dimension),
            catalog: CatalogStore::new(),
        };
        for entry in snapshot.entries {
            check_vector(&entry.vector, snapshot.dimension)?;
            stores.index.append(entry.vector)?;
            stores.catalog.append(entry.record);
        }

        Ok(Self {
            dimension: snapshot.dimension,
            inner: RwLock::new(stores),
        })
    }
}

use crate::error::{CatalogError, CatalogResult};
use crate::models::CatalogRecord;

/// Append-only list of catalog records, indexed by position.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    records: Vec<CatalogRecord>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, returning its position.
    pub fn append(&mut self, record: CatalogRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn get(&self, position: usize) -> CatalogResult<&CatalogRecord> {
        self.records
            .get(position)
            .ok_or(CatalogError::IndexOutOfRange {
                position,
                len: self.records.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_get() {
        let mut store = CatalogStore::new();
        assert!(store.is_empty());

        assert_eq!(store.append(CatalogRecord::new("Orders", "order history")), 0);
        assert_eq!(store.append(CatalogRecord::new("Users", "user accounts")), 1);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().database, "Users");
    }

    #[test]
    fn test_get_out_of_range() {
        let mut store = CatalogStore::new();
        store.append(CatalogRecord::new("Orders", "order history"));

        match store.get(5) {
            Err(CatalogError::IndexOutOfRange { position, len }) => {
                assert_eq!(position, 5);
                assert_eq!(len, 1);
            }
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
    }
}

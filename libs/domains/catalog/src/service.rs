use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::CatalogConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{CatalogError, CatalogResult};
use crate::generation::GenerationProvider;
use crate::index::{FlatL2Index, VectorIndex};
use crate::models::{CatalogRecord, CatalogRow, CatalogStats, IngestReport, QueryAnswer};
use crate::prompt::{build_prompt, render_context};
use crate::snapshot::CatalogSnapshot;
use crate::store::RetrievalStore;

/// Retrieval-augmented catalog service
///
/// Owns the write path (ingestion) and read path (query) over a shared
/// [`RetrievalStore`]. Remote calls are made without holding the store lock
/// and are each bounded by a timeout.
pub struct CatalogService<I: VectorIndex = FlatL2Index> {
    store: Arc<RetrievalStore<I>>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    config: CatalogConfig,
    /// Held across snapshot + save so writers reach the disk in store order.
    persist_lock: Mutex<()>,
}

impl<I: VectorIndex> CatalogService<I> {
    pub fn new(
        store: Arc<RetrievalStore<I>>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            config,
            persist_lock: Mutex::new(()),
        }
    }

    /// Build a service over the configured snapshot, or an empty store if there is none.
    pub async fn open(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        config: CatalogConfig,
    ) -> CatalogResult<Self> {
        let snapshot = match &config.snapshot_path {
            Some(path) => CatalogSnapshot::load(path).await?,
            None => None,
        };

        let store = match snapshot {
            Some(snapshot) if snapshot.dimension != config.dimension => {
                return Err(CatalogError::Snapshot(format!(
                    "snapshot holds {}-dimensional vectors but the store is configured for {}",
                    snapshot.dimension, config.dimension
                )));
            }
            Some(snapshot) => RetrievalStore::restore(snapshot)?,
            None => RetrievalStore::create(config.dimension),
        };

        Ok(Self::new(Arc::new(store), embedder, generator, config))
    }

    pub fn store(&self) -> &Arc<RetrievalStore<I>> {
        &self.store
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Ingest an ordered batch of rows.
    ///
    /// Every row is validated before anything is embedded, so a malformed
    /// batch stores nothing. After validation rows are embedded and committed
    /// one at a time; if row `i` fails, rows before it stay committed and the
    /// error reports both `i` and the committed count.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn ingest(&self, rows: Vec<CatalogRow>) -> CatalogResult<IngestReport> {
        let records = rows
            .iter()
            .enumerate()
            .map(|(row, input)| CatalogRecord::from_row(row, input))
            .collect::<CatalogResult<Vec<_>>>()?;

        let mut committed = 0;
        for (row, record) in records.into_iter().enumerate() {
            if let Err(source) = self.embed_and_commit(record).await {
                warn!(row, committed, error = %source, "Ingestion aborted");
                if let Err(e) = self.persist().await {
                    warn!(error = %e, "Failed to persist partially ingested batch");
                }
                return Err(CatalogError::IngestionAborted {
                    row,
                    committed,
                    source: Box::new(source),
                });
            }
            committed += 1;
        }

        self.persist().await?;

        let total_records = self.store.len().await;
        info!(ingested = committed, total_records, "Ingestion completed");

        Ok(IngestReport {
            ingested: committed,
            total_records,
        })
    }

    async fn embed_and_commit(&self, record: CatalogRecord) -> CatalogResult<usize> {
        let embedding = self.embed(&record.description).await?;
        self.store.commit(embedding, record).await
    }

    /// Answer a free-text question from the nearest catalog records.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn query(&self, query: &str, role: Option<&str>) -> CatalogResult<QueryAnswer> {
        if self.store.is_empty().await {
            return Err(CatalogError::EmptyCatalog);
        }

        let query_vector = self.embed(query).await?;
        let records = self.store.retrieve(&query_vector, self.config.top_k).await?;
        debug!(retrieved = records.len(), "Retrieved context records");

        let context = render_context(&records);
        let prompt = build_prompt(query, role, &context);

        let answer = with_timeout(
            "generation",
            self.config.generation_timeout,
            self.generator.generate(&prompt),
        )
        .await?;

        Ok(QueryAnswer { answer, records })
    }

    pub async fn stats(&self) -> CatalogStats {
        CatalogStats {
            records: self.store.len().await,
            dimension: self.store.dimension(),
            top_k: self.config.top_k,
        }
    }

    /// Write the store to the configured snapshot path, if any.
    ///
    /// Concurrent callers are serialized and each one snapshots after taking
    /// the lock, so the file on disk never moves back to an older state.
    pub async fn persist(&self) -> CatalogResult<()> {
        let Some(path) = &self.config.snapshot_path else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().await;
        self.store.snapshot().await?.save(path).await
    }

    async fn embed(&self, text: &str) -> CatalogResult<Vec<f32>> {
        let result = with_timeout(
            "embedding",
            self.config.embedding_timeout,
            self.embedder.embed(text),
        )
        .await?;
        Ok(result.values)
    }
}

/// Bound a remote call, turning expiry into `CatalogError::Timeout`.
async fn with_timeout<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = CatalogResult<T>>,
) -> CatalogResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| CatalogError::Timeout {
            operation,
            timeout_ms: limit.as_millis() as u64,
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingProvider;
    use crate::generation::MockGenerationProvider;
    use crate::models::{EmbeddingModel, EmbeddingResult};
    use async_trait::async_trait;

    const DIM: usize = 4;

    /// Deterministic bag-of-letters embedding.
    fn embed_text(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        for (i, b) in text.bytes().enumerate() {
            v[i % DIM] += (b % 7) as f32;
        }
        v
    }

    fn embedder() -> MockEmbeddingProvider {
        let mut mock = MockEmbeddingProvider::new();
        mock.expect_embed()
            .returning(|text| Ok(EmbeddingResult::new(embed_text(text))));
        mock
    }

    fn config() -> CatalogConfig {
        CatalogConfig::default().with_dimension(DIM)
    }

    fn service(
        embedder: impl EmbeddingProvider + 'static,
        generator: impl GenerationProvider + 'static,
    ) -> CatalogService {
        CatalogService::new(
            Arc::new(RetrievalStore::create(DIM)),
            Arc::new(embedder),
            Arc::new(generator),
            config(),
        )
    }

    fn row(database: &str, description: &str) -> CatalogRow {
        CatalogRow::new()
            .with("Database", database)
            .with("Description", description)
    }

    #[tokio::test]
    async fn test_ingest_commits_every_row() {
        let service = service(embedder(), MockGenerationProvider::new());

        let report = service
            .ingest(vec![
                row("Orders", "customer order history"),
                row("Users", "user accounts"),
            ])
            .await
            .unwrap();

        assert_eq!(report.ingested, 2);
        assert_eq!(report.total_records, 2);

        let snapshot = service.store().snapshot().await.unwrap();
        for entry in &snapshot.entries {
            assert_eq!(entry.vector, embed_text(&entry.record.description));
        }
    }

    #[tokio::test]
    async fn test_ingest_missing_description_stores_nothing() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().never();
        let service = service(embedder, MockGenerationProvider::new());

        let err = service
            .ingest(vec![
                row("Orders", "customer order history"),
                CatalogRow::new().with("Database", "Users"),
            ])
            .await
            .unwrap_err();

        match err {
            CatalogError::MissingRequiredColumn { row, column } => {
                assert_eq!(row, 1);
                assert_eq!(column, "description");
            }
            other => panic!("expected MissingRequiredColumn, got {:?}", other),
        }
        assert_eq!(service.store().len().await, 0);
    }

    #[tokio::test]
    async fn test_ingest_failure_keeps_earlier_rows() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().returning(|text| {
            if text == "third" {
                Err(CatalogError::EmbeddingUnavailable("rate limited".to_string()))
            } else {
                Ok(EmbeddingResult::new(embed_text(text)))
            }
        });
        let service = service(embedder, MockGenerationProvider::new());

        let err = service
            .ingest(vec![
                row("A", "first"),
                row("B", "second"),
                row("C", "third"),
                row("D", "fourth"),
            ])
            .await
            .unwrap_err();

        match err {
            CatalogError::IngestionAborted {
                row,
                committed,
                source,
            } => {
                assert_eq!(row, 2);
                assert_eq!(committed, 2);
                assert!(matches!(*source, CatalogError::EmbeddingUnavailable(_)));
            }
            other => panic!("expected IngestionAborted, got {:?}", other),
        }

        let snapshot = service.store().snapshot().await.unwrap();
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.entries[1].record.database, "B");
    }

    #[tokio::test]
    async fn test_ingest_rejects_wrong_dimension_embedding() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed()
            .returning(|_| Ok(EmbeddingResult::new(vec![1.0; DIM + 1])));
        let service = service(embedder, MockGenerationProvider::new());

        let err = service
            .ingest(vec![row("Orders", "customer order history")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::IngestionAborted { row: 0, committed: 0, ref source }
                if matches!(**source, CatalogError::DimensionMismatch { .. })
        ));
        assert_eq!(service.store().len().await, 0);
    }

    #[tokio::test]
    async fn test_query_empty_catalog_never_calls_providers() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().never();
        let mut generator = MockGenerationProvider::new();
        generator.expect_generate().never();
        let service = service(embedder, generator);

        let err = service.query("where are orders?", None).await.unwrap_err();
        assert!(matches!(err, CatalogError::EmptyCatalog));
    }

    #[tokio::test]
    async fn test_query_returns_matching_record_and_answer() {
        let mut generator = MockGenerationProvider::new();
        generator.expect_generate().times(1).returning(|prompt| {
            assert!(prompt.contains("Database: Orders"));
            assert!(prompt.contains("Role asking the query: analyst"));
            assert!(prompt.ends_with("Query: where are customer orders stored"));
            Ok("As a analyst, customer orders live in the Orders database.".to_string())
        });
        let service = service(embedder(), generator);

        service
            .ingest(vec![row("Orders", "customer order history")])
            .await
            .unwrap();

        let answer = service
            .query("where are customer orders stored", Some("analyst"))
            .await
            .unwrap();

        assert_eq!(answer.records.len(), 1);
        assert_eq!(answer.records[0].record.database, "Orders");
        assert_eq!(answer.records[0].rank, 1);
        assert!(answer.answer.contains("Orders"));
    }

    #[tokio::test]
    async fn test_query_is_deterministic_and_bounded_by_top_k() {
        let mut generator = MockGenerationProvider::new();
        generator
            .expect_generate()
            .times(2)
            .returning(|_| Ok("answer".to_string()));
        let service = service(embedder(), generator);

        let rows = (0..8)
            .map(|i| row(&format!("db{}", i), &format!("table of things number {}", i)))
            .collect();
        service.ingest(rows).await.unwrap();

        let first = service.query("things number 3", None).await.unwrap();
        let second = service.query("things number 3", None).await.unwrap();

        assert_eq!(first.records.len(), 5);
        assert_eq!(first.records, second.records);
        assert!(
            first
                .records
                .windows(2)
                .all(|w| w[0].distance <= w[1].distance)
        );
    }

    #[tokio::test]
    async fn test_query_propagates_generation_failure() {
        let mut generator = MockGenerationProvider::new();
        generator
            .expect_generate()
            .returning(|_| Err(CatalogError::GenerationUnavailable("503".to_string())));
        let service = service(embedder(), generator);
        service
            .ingest(vec![row("Orders", "customer order history")])
            .await
            .unwrap();

        let err = service.query("orders", None).await.unwrap_err();
        assert!(matches!(err, CatalogError::GenerationUnavailable(_)));
    }

    struct StalledEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StalledEmbedder {
        fn model(&self) -> EmbeddingModel {
            EmbeddingModel::Custom(DIM as u32)
        }

        async fn embed(&self, _text: &str) -> CatalogResult<EmbeddingResult> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(EmbeddingResult::new(vec![0.0; DIM]))
        }
    }

    #[tokio::test]
    async fn test_stalled_embedding_times_out() {
        let service = CatalogService::<FlatL2Index>::new(
            Arc::new(RetrievalStore::create(DIM)),
            Arc::new(StalledEmbedder),
            Arc::new(MockGenerationProvider::new()),
            config().with_timeouts(Duration::from_millis(20), Duration::from_millis(20)),
        );

        let err = service
            .ingest(vec![row("Orders", "customer order history")])
            .await
            .unwrap_err();

        match err {
            CatalogError::IngestionAborted { source, .. } => match *source {
                CatalogError::Timeout {
                    operation,
                    timeout_ms,
                } => {
                    assert_eq!(operation, "embedding");
                    assert_eq!(timeout_ms, 20);
                }
                other => panic!("expected Timeout, got {:?}", other),
            },
            other => panic!("expected IngestionAborted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stats() {
        let service = service(embedder(), MockGenerationProvider::new());
        service
            .ingest(vec![row("Orders", "customer order history")])
            .await
            .unwrap();

        let stats = service.stats().await;
        assert_eq!(stats.records, 1);
        assert_eq!(stats.dimension, DIM);
        assert_eq!(stats.top_k, 5);
    }

    #[tokio::test]
    async fn test_open_restores_snapshot() {
        let path = std::env::temp_dir()
            .join(format!("catalog-service-{}", std::process::id()))
            .join("store.json");
        let config = config().with_snapshot_path(&path);

        let service = CatalogService::<FlatL2Index>::open(
            Arc::new(embedder()),
            Arc::new(MockGenerationProvider::new()),
            config.clone(),
        )
        .await
        .unwrap();
        service
            .ingest(vec![row("Orders", "customer order history")])
            .await
            .unwrap();

        let reopened = CatalogService::<FlatL2Index>::open(
            Arc::new(embedder()),
            Arc::new(MockGenerationProvider::new()),
            config.clone(),
        )
        .await
        .unwrap();
        assert_eq!(reopened.stats().await.records, 1);

        let mismatched = CatalogService::<FlatL2Index>::open(
            Arc::new(embedder()),
            Arc::new(MockGenerationProvider::new()),
            config.with_dimension(DIM * 2),
        )
        .await;
        assert!(matches!(mismatched, Err(CatalogError::Snapshot(_))));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}

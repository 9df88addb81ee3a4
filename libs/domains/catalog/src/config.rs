use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse, env_required};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::EmbeddingModel;

pub const DEFAULT_DIMENSION: usize = 3072;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Retrieval pipeline settings
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub dimension: usize,
    pub top_k: usize,
    pub embedding_timeout: Duration,
    pub generation_timeout: Duration,
    /// Where the store is persisted; `None` keeps it in memory only
    pub snapshot_path: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_timeouts(mut self, embedding: Duration, generation: Duration) -> Self {
        self.embedding_timeout = embedding;
        self.generation_timeout = generation;
        self
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.dimension == 0 {
            return Err(ConfigError::Invalid(
                "EMBEDDING_DIMENSION must be greater than 0".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid(
                "RETRIEVAL_TOP_K must be greater than 0".to_string(),
            ));
        }
        Ok(self)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            top_k: DEFAULT_TOP_K,
            embedding_timeout: Duration::from_secs(DEFAULT_EMBEDDING_TIMEOUT_SECS),
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            snapshot_path: None,
        }
    }
}

impl FromEnv for CatalogConfig {
    /// - EMBEDDING_DIMENSION: defaults to 3072
    /// - RETRIEVAL_TOP_K: defaults to 5
    /// - EMBEDDING_TIMEOUT_SECS / GENERATION_TIMEOUT_SECS: default 30 / 60
    /// - CATALOG_SNAPSHOT_PATH: optional
    fn from_env() -> Result<Self, ConfigError> {
        Self {
            dimension: env_parse("EMBEDDING_DIMENSION", DEFAULT_DIMENSION)?,
            top_k: env_parse("RETRIEVAL_TOP_K", DEFAULT_TOP_K)?,
            embedding_timeout: Duration::from_secs(env_parse(
                "EMBEDDING_TIMEOUT_SECS",
                DEFAULT_EMBEDDING_TIMEOUT_SECS,
            )?),
            generation_timeout: Duration::from_secs(env_parse(
                "GENERATION_TIMEOUT_SECS",
                DEFAULT_GENERATION_TIMEOUT_SECS,
            )?),
            snapshot_path: env_optional("CATALOG_SNAPSHOT_PATH").map(PathBuf::from),
        }
        .validate()
    }
}

/// OpenAI connection and model settings, shared by the embedding and chat providers
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: EmbeddingModel,
    pub chat_model: String,
    pub temperature: f32,
}

impl OpenAIConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            embedding_model: EmbeddingModel::default(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_embedding_model(mut self, model: EmbeddingModel) -> Self {
        self.embedding_model = model;
        self
    }
}

impl FromEnv for OpenAIConfig {
    /// - OPENAI_API_KEY: required
    /// - OPENAI_BASE_URL: defaults to https://api.openai.com/v1
    /// - OPENAI_EMBEDDING_MODEL: defaults to text-embedding-3-large
    /// - OPENAI_CHAT_MODEL: defaults to gpt-4
    /// - OPENAI_TEMPERATURE: defaults to 0.2
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_required("OPENAI_API_KEY")?;
        let embedding_model = env_or_default(
            "OPENAI_EMBEDDING_MODEL",
            EmbeddingModel::default().model_name(),
        )
        .parse::<EmbeddingModel>()
        .map_err(|e| ConfigError::ParseError {
            key: "OPENAI_EMBEDDING_MODEL".to_string(),
            details: e.to_string(),
        })?;

        let mut config = Self::new(api_key)
            .with_base_url(env_or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL))
            .with_embedding_model(embedding_model);
        config.chat_model = env_or_default("OPENAI_CHAT_MODEL", DEFAULT_CHAT_MODEL);
        config.temperature = env_parse("OPENAI_TEMPERATURE", DEFAULT_TEMPERATURE)?;

        Ok(config)
    }
}

/// Fail startup when the store dimension cannot hold the model's vectors.
pub fn ensure_dimension_matches(
    catalog: &CatalogConfig,
    openai: &OpenAIConfig,
) -> Result<(), ConfigError> {
    let model_dimension = openai.embedding_model.dimension() as usize;
    if model_dimension != catalog.dimension {
        return Err(ConfigError::Invalid(format!(
            "embedding model {} produces {} dimensions but EMBEDDING_DIMENSION is {}",
            openai.embedding_model.model_name(),
            model_dimension,
            catalog.dimension
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG_VARS: [&str; 5] = [
        "EMBEDDING_DIMENSION",
        "RETRIEVAL_TOP_K",
        "EMBEDDING_TIMEOUT_SECS",
        "GENERATION_TIMEOUT_SECS",
        "CATALOG_SNAPSHOT_PATH",
    ];

    #[test]
    fn test_catalog_config_defaults() {
        temp_env::with_vars_unset(CATALOG_VARS, || {
            let config = CatalogConfig::from_env().unwrap();
            assert_eq!(config.dimension, 3072);
            assert_eq!(config.top_k, 5);
            assert_eq!(config.embedding_timeout, Duration::from_secs(30));
            assert_eq!(config.generation_timeout, Duration::from_secs(60));
            assert!(config.snapshot_path.is_none());
        });
    }

    #[test]
    fn test_catalog_config_custom_values() {
        temp_env::with_vars(
            [
                ("EMBEDDING_DIMENSION", Some("1536")),
                ("RETRIEVAL_TOP_K", Some("3")),
                ("EMBEDDING_TIMEOUT_SECS", Some("5")),
                ("GENERATION_TIMEOUT_SECS", None),
                ("CATALOG_SNAPSHOT_PATH", Some("/var/lib/catalog/store.json")),
            ],
            || {
                let config = CatalogConfig::from_env().unwrap();
                assert_eq!(config.dimension, 1536);
                assert_eq!(config.top_k, 3);
                assert_eq!(config.embedding_timeout, Duration::from_secs(5));
                assert_eq!(
                    config.snapshot_path,
                    Some(PathBuf::from("/var/lib/catalog/store.json"))
                );
            },
        );
    }

    #[test]
    fn test_catalog_config_rejects_zero_top_k() {
        temp_env::with_var("RETRIEVAL_TOP_K", Some("0"), || {
            let err = CatalogConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("RETRIEVAL_TOP_K"));
        });
    }

    #[test]
    fn test_openai_config_requires_api_key() {
        temp_env::with_var_unset("OPENAI_API_KEY", || {
            let err = OpenAIConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("OPENAI_API_KEY"));
        });
    }

    #[test]
    fn test_openai_config_defaults() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-test")),
                ("OPENAI_BASE_URL", None),
                ("OPENAI_EMBEDDING_MODEL", None),
                ("OPENAI_CHAT_MODEL", None),
                ("OPENAI_TEMPERATURE", None),
            ],
            || {
                let config = OpenAIConfig::from_env().unwrap();
                assert_eq!(config.base_url, "https://api.openai.com/v1");
                assert_eq!(config.embedding_model, EmbeddingModel::TextEmbedding3Large);
                assert_eq!(config.chat_model, "gpt-4");
                assert_eq!(config.temperature, 0.2);
            },
        );
    }

    #[test]
    fn test_openai_config_rejects_unknown_model() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-test")),
                ("OPENAI_EMBEDDING_MODEL", Some("word2vec")),
            ],
            || {
                let err = OpenAIConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("OPENAI_EMBEDDING_MODEL"));
            },
        );
    }

    #[test]
    fn test_dimension_check() {
        let openai = OpenAIConfig::new("sk".to_string());
        assert!(ensure_dimension_matches(&CatalogConfig::default(), &openai).is_ok());

        let small = CatalogConfig::default().with_dimension(1536);
        assert!(ensure_dimension_matches(&small, &openai).is_err());

        let shortened = openai.with_embedding_model(EmbeddingModel::Custom(1536));
        assert!(ensure_dimension_matches(&small, &shortened).is_ok());
    }
}

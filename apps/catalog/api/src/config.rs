//! Configuration for Catalog API

use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use domain_catalog::{CatalogConfig, OpenAIConfig, ensure_dimension_matches};

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub catalog: CatalogConfig,
    pub openai: OpenAIConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let catalog = CatalogConfig::from_env()?;
        let openai = OpenAIConfig::from_env()?;
        ensure_dimension_matches(&catalog, &openai)?;

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            catalog,
            openai,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-test")),
                ("OPENAI_EMBEDDING_MODEL", None),
                ("EMBEDDING_DIMENSION", None),
                ("PORT", Some("9000")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.app.name, "catalog_api");
                assert_eq!(config.server.port, 9000);
                assert_eq!(config.catalog.dimension, 3072);
            },
        );
    }

    #[test]
    fn test_config_rejects_dimension_mismatch() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-test")),
                ("OPENAI_EMBEDDING_MODEL", Some("text-embedding-3-small")),
                ("EMBEDDING_DIMENSION", None),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("EMBEDDING_DIMENSION"));
            },
        );
    }

    #[test]
    fn test_config_requires_api_key() {
        temp_env::with_var_unset("OPENAI_API_KEY", || {
            assert!(Config::from_env().is_err());
        });
    }
}

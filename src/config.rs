// Configuration
//
// TOML-backed settings with defaults that work for local development.
// API keys come from the environment, never from the config file.

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoloConfig {
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    pub search: SearchConfig,
    /// SQLite contact directory path
    pub directory_db: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub dimensions: usize,
    pub max_batch_size: usize,
    /// Environment variable holding the provider API key
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database path for the sqlite backend
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// In-memory ANN index; fast, rebuilt per process
    Hnsw,
    /// SQLite-backed store; persists across runs
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub daily_limit: u32,
    pub cache_ttl_hours: i64,
    pub api_key_env: String,
}

impl Default for RoloConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            search: SearchConfig::default(),
            directory_db: ".rolo/contacts.db".to_string(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/embeddings".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            max_batch_size: 100,
            api_key_env: "ROLO_EMBEDDING_API_KEY".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: ".rolo/vectors.db".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.peoplesearch.example/v1/search".to_string(),
            daily_limit: 10,
            cache_ttl_hours: 24,
            api_key_env: "ROLO_SEARCH_API_KEY".to_string(),
        }
    }
}

impl RoloConfig {
    /// Load config from a TOML file, or fall back to defaults when the
    /// file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| crate::errors::RoloError::Config(e.to_string()))?;
        Ok(config)
    }
}

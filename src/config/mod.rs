//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `TAXO_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_ADJUDICATION_MODEL, DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY,
    DEFAULT_EMBEDDING_FALLBACKS, DEFAULT_EMBEDDING_MODEL, DEFAULT_MAX_ITEMS,
};

/// Process configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `TAXO_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Raw indentation-coded hierarchy source. Default: `./data/hierarchy.txt`.
    pub hierarchy_path: PathBuf,

    /// Parsed taxonomy snapshot. Default: `./data/taxonomy.json`.
    pub taxonomy_cache_path: PathBuf,

    /// Precomputed leaf-embeddings artifact. Default: `./data/leaf-embeddings.json`.
    pub embeddings_path: PathBuf,

    /// OpenAI-compatible embeddings base URL.
    pub embedding_url: String,

    /// Bearer key for the embeddings endpoint.
    pub embedding_api_key: Option<String>,

    /// Primary embedding model.
    pub embedding_model: String,

    /// Ordered fallback embedding models.
    pub embedding_fallbacks: Vec<String>,

    /// Generative model used for adjudication.
    pub adjudication_model: String,

    /// Items per adjudication call. Default: `25`.
    pub batch_size: usize,

    /// Worker cap for outbound fan-out. Default: `4`.
    pub concurrency: usize,

    /// Max titles per classification call. Default: `500`.
    pub max_items: usize,

    /// Run with deterministic offline providers.
    pub mock_provider: bool,
}

/// Default embeddings base URL used when `TAXO_EMBEDDING_URL` is not set.
pub const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1";

impl Default for Config {
    fn default() -> Self {
        Self {
            hierarchy_path: PathBuf::from("./data/hierarchy.txt"),
            taxonomy_cache_path: PathBuf::from("./data/taxonomy.json"),
            embeddings_path: PathBuf::from("./data/leaf-embeddings.json"),
            embedding_url: DEFAULT_EMBEDDING_URL.to_string(),
            embedding_api_key: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_fallbacks: DEFAULT_EMBEDDING_FALLBACKS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            adjudication_model: DEFAULT_ADJUDICATION_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            max_items: DEFAULT_MAX_ITEMS,
            mock_provider: false,
        }
    }
}

impl Config {
    const ENV_HIERARCHY_PATH: &'static str = "TAXO_HIERARCHY_PATH";
    const ENV_TAXONOMY_CACHE_PATH: &'static str = "TAXO_TAXONOMY_CACHE_PATH";
    const ENV_EMBEDDINGS_PATH: &'static str = "TAXO_EMBEDDINGS_PATH";
    const ENV_EMBEDDING_URL: &'static str = "TAXO_EMBEDDING_URL";
    const ENV_EMBEDDING_API_KEY: &'static str = "TAXO_EMBEDDING_API_KEY";
    const ENV_EMBEDDING_MODEL: &'static str = "TAXO_EMBEDDING_MODEL";
    const ENV_EMBEDDING_FALLBACKS: &'static str = "TAXO_EMBEDDING_FALLBACKS";
    const ENV_ADJUDICATION_MODEL: &'static str = "TAXO_ADJUDICATION_MODEL";
    const ENV_BATCH_SIZE: &'static str = "TAXO_BATCH_SIZE";
    const ENV_CONCURRENCY: &'static str = "TAXO_CONCURRENCY";
    const ENV_MAX_ITEMS: &'static str = "TAXO_MAX_ITEMS";
    const ENV_MOCK_PROVIDER: &'static str = "TAXO_MOCK_PROVIDER";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let hierarchy_path =
            Self::parse_path_from_env(Self::ENV_HIERARCHY_PATH, defaults.hierarchy_path);
        let taxonomy_cache_path =
            Self::parse_path_from_env(Self::ENV_TAXONOMY_CACHE_PATH, defaults.taxonomy_cache_path);
        let embeddings_path =
            Self::parse_path_from_env(Self::ENV_EMBEDDINGS_PATH, defaults.embeddings_path);
        let embedding_url =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_URL, defaults.embedding_url);
        let embedding_api_key = Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_API_KEY);
        let embedding_model =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_MODEL, defaults.embedding_model);
        let embedding_fallbacks = match env::var(Self::ENV_EMBEDDING_FALLBACKS) {
            Ok(value) => Self::parse_model_list(&value),
            Err(_) => defaults.embedding_fallbacks,
        };
        let adjudication_model =
            Self::parse_string_from_env(Self::ENV_ADJUDICATION_MODEL, defaults.adjudication_model);
        let batch_size = Self::parse_positive_from_env(Self::ENV_BATCH_SIZE, defaults.batch_size)?;
        let concurrency =
            Self::parse_positive_from_env(Self::ENV_CONCURRENCY, defaults.concurrency)?;
        let max_items = Self::parse_positive_from_env(Self::ENV_MAX_ITEMS, defaults.max_items)?;
        let mock_provider = env::var_os(Self::ENV_MOCK_PROVIDER).is_some_and(|v| !v.is_empty());

        Ok(Self {
            hierarchy_path,
            taxonomy_cache_path,
            embeddings_path,
            embedding_url,
            embedding_api_key,
            embedding_model,
            embedding_fallbacks,
            adjudication_model,
            batch_size,
            concurrency,
            max_items,
            mock_provider,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    ///
    /// The hierarchy source may be missing when a cached snapshot exists; the
    /// taxonomy repository reports that case itself.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.hierarchy_path, &self.taxonomy_cache_path, &self.embeddings_path] {
            if path.exists() && !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                name: Self::ENV_EMBEDDING_MODEL,
            });
        }

        if self.adjudication_model.trim().is_empty() {
            return Err(ConfigError::EmptyValue {
                name: Self::ENV_ADJUDICATION_MODEL,
            });
        }

        Ok(())
    }

    /// Primary model followed by fallbacks, without duplicates.
    pub fn embedding_model_chain(&self) -> Vec<String> {
        let mut chain = vec![self.embedding_model.clone()];
        for model in &self.embedding_fallbacks {
            if !chain.contains(model) {
                chain.push(model.clone());
            }
        }
        chain
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_positive_from_env(
        var_name: &'static str,
        default: usize,
    ) -> Result<usize, ConfigError> {
        match env::var(var_name) {
            Ok(value) => {
                let parsed: usize =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::IntegerParseError {
                            name: var_name,
                            value: value.clone(),
                            source: e,
                        })?;

                if parsed == 0 {
                    return Err(ConfigError::MustBePositive {
                        name: var_name,
                        value,
                    });
                }

                Ok(parsed)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_model_list(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect()
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::{TaxonomyError, TaxonomyResult};
use super::model::Taxonomy;
use super::parser::{extract_hierarchy_text, parse_hierarchy};

/// What was found at the snapshot path.
#[derive(Debug)]
pub enum CacheState {
    /// No snapshot file.
    Missing,
    /// A file exists but cannot be used.
    Malformed { reason: String },
    /// A usable snapshot.
    WellFormed(Box<Taxonomy>),
}

impl CacheState {
    /// Classifies raw snapshot bytes (or their absence). Pure; does no I/O.
    pub fn inspect(bytes: Option<&[u8]>) -> Self {
        let Some(bytes) = bytes else {
            return CacheState::Missing;
        };

        let mut taxonomy: Taxonomy = match serde_json::from_slice(bytes) {
            Ok(t) => t,
            Err(e) => {
                return CacheState::Malformed {
                    reason: e.to_string(),
                };
            }
        };

        if taxonomy.hash().is_empty() {
            return CacheState::Malformed {
                reason: "missing taxonomyHash".to_string(),
            };
        }

        taxonomy.reindex();
        match taxonomy.validate() {
            Ok(()) => CacheState::WellFormed(Box::new(taxonomy)),
            Err(e) => CacheState::Malformed {
                reason: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which tier the repository loads from.
pub enum LoadStrategy {
    UseCache,
    ParseSource,
}

impl LoadStrategy {
    pub fn decide(state: &CacheState) -> Self {
        match state {
            CacheState::WellFormed(_) => LoadStrategy::UseCache,
            CacheState::Missing | CacheState::Malformed { .. } => LoadStrategy::ParseSource,
        }
    }
}

/// Owns the process-wide taxonomy snapshot.
///
/// Constructed once at startup and handed (as `Arc<Taxonomy>`) to the lexical index,
/// embedding store and candidate generator. Tests build one from a fixture with
/// [`TaxonomyRepository::from_taxonomy`].
#[derive(Debug, Clone)]
pub struct TaxonomyRepository {
    taxonomy: Arc<Taxonomy>,
}

impl TaxonomyRepository {
    pub fn from_taxonomy(taxonomy: Taxonomy) -> Self {
        Self {
            taxonomy: Arc::new(taxonomy),
        }
    }

    /// Cache first, then source; a freshly parsed source is persisted to `cache_path`.
    pub fn load(source_path: &Path, cache_path: &Path) -> TaxonomyResult<Self> {
        let bytes = Self::load_from_cache(cache_path);
        let state = CacheState::inspect(bytes.as_deref());

        match (LoadStrategy::decide(&state), state) {
            (LoadStrategy::UseCache, CacheState::WellFormed(taxonomy)) => {
                info!(
                    path = %cache_path.display(),
                    leaves = taxonomy.len(),
                    hash = %taxonomy.hash(),
                    "Taxonomy loaded from snapshot"
                );
                Ok(Self::from_taxonomy(*taxonomy))
            }
            (_, state) => {
                if let CacheState::Malformed { reason } = &state {
                    warn!(path = %cache_path.display(), %reason, "Ignoring malformed taxonomy snapshot");
                }
                Self::rebuild(source_path, cache_path)
            }
        }
    }

    /// Parses the source unconditionally and overwrites the snapshot.
    pub fn rebuild(source_path: &Path, cache_path: &Path) -> TaxonomyResult<Self> {
        let taxonomy = Self::load_from_source(source_path)?;
        if let Err(e) = Self::persist(&taxonomy, cache_path) {
            warn!(path = %cache_path.display(), error = %e, "Failed to persist taxonomy snapshot");
        }
        Ok(Self::from_taxonomy(taxonomy))
    }

    fn load_from_cache(cache_path: &Path) -> Option<Vec<u8>> {
        match std::fs::read(cache_path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(path = %cache_path.display(), error = %e, "No taxonomy snapshot");
                None
            }
        }
    }

    pub fn load_from_source(source_path: &Path) -> TaxonomyResult<Taxonomy> {
        if !source_path.exists() {
            return Err(TaxonomyError::SourceNotFound {
                path: source_path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(source_path).map_err(|e| TaxonomyError::Io {
            path: source_path.to_path_buf(),
            source: e,
        })?;

        let taxonomy = parse_hierarchy(extract_hierarchy_text(&content))?;
        if taxonomy.is_empty() {
            return Err(TaxonomyError::NoLeaves {
                path: source_path.to_path_buf(),
            });
        }

        info!(
            path = %source_path.display(),
            sectors = taxonomy.sectors().len(),
            rayons = taxonomy.rayons().len(),
            familles = taxonomy.familles().len(),
            leaves = taxonomy.len(),
            hash = %taxonomy.hash(),
            "Taxonomy parsed from source"
        );
        Ok(taxonomy)
    }

    pub fn persist(taxonomy: &Taxonomy, cache_path: &Path) -> TaxonomyResult<()> {
        let io_err = |e| TaxonomyError::Io {
            path: cache_path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(taxonomy)?;
        let tmp: PathBuf = cache_path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, cache_path).map_err(io_err)?;
        Ok(())
    }

    pub fn taxonomy(&self) -> Arc<Taxonomy> {
        Arc::clone(&self.taxonomy)
    }

    pub fn hash(&self) -> &str {
        self.taxonomy.hash()
    }
}

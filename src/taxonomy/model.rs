use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::{TaxonomyError, TaxonomyResult};
use crate::hashing::hash_taxonomy_structure;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Top level of the hierarchy.
pub struct Sector {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rayon {
    pub code: String,
    pub name: String,
    pub sector_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Famille {
    pub code: String,
    pub name: String,
    pub rayon_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SousFamille {
    pub code: String,
    pub name: String,
    pub famille_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Code + name of one node on a leaf's ancestor chain.
pub struct NodeLabel {
    pub code: String,
    pub name: String,
}

impl NodeLabel {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A sous-famille together with its full ancestor path; the unit of classification.
pub struct Leaf {
    pub leaf_id: String,
    pub sector: NodeLabel,
    pub rayon: NodeLabel,
    pub famille: NodeLabel,
    pub sous_famille: NodeLabel,
    pub full_path: String,
    /// `sector-rayon-famille-sousFamille` codes; unique across the taxonomy.
    pub leaf_key: String,
}

impl Leaf {
    pub fn compose_key(sector: &str, rayon: &str, famille: &str, sous_famille: &str) -> String {
        format!("{sector}-{rayon}-{famille}-{sous_famille}")
    }

    /// Label fields in the order the lexical index weighs them.
    pub fn label_names(&self) -> [&str; 4] {
        [
            &self.sous_famille.name,
            &self.famille.name,
            &self.rayon.name,
            &self.sector.name,
        ]
    }
}

/// Immutable, versioned snapshot of the four-level hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    sectors: Vec<Sector>,
    rayons: Vec<Rayon>,
    familles: Vec<Famille>,
    sous_familles: Vec<SousFamille>,
    leaves: Vec<Leaf>,
    taxonomy_hash: String,
    #[serde(skip)]
    by_key: HashMap<String, usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuralView<'a> {
    sectors: &'a [Sector],
    rayons: &'a [Rayon],
    familles: &'a [Famille],
    sous_familles: &'a [SousFamille],
    leaf_keys: Vec<&'a str>,
}

impl Taxonomy {
    /// Assembles a snapshot and computes its content hash.
    pub fn from_parts(
        sectors: Vec<Sector>,
        rayons: Vec<Rayon>,
        familles: Vec<Famille>,
        sous_familles: Vec<SousFamille>,
        leaves: Vec<Leaf>,
    ) -> TaxonomyResult<Self> {
        let mut taxonomy = Self {
            sectors,
            rayons,
            familles,
            sous_familles,
            leaves,
            taxonomy_hash: String::new(),
            by_key: HashMap::new(),
        };
        taxonomy.taxonomy_hash = taxonomy.compute_hash()?;
        taxonomy.reindex();
        Ok(taxonomy)
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn rayons(&self) -> &[Rayon] {
        &self.rayons
    }

    pub fn familles(&self) -> &[Famille] {
        &self.familles
    }

    pub fn sous_familles(&self) -> &[SousFamille] {
        &self.sous_familles
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn hash(&self) -> &str {
        &self.taxonomy_hash
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// O(1) leaf lookup by `leaf_key`.
    pub fn leaf(&self, leaf_key: &str) -> Option<&Leaf> {
        self.by_key.get(leaf_key).map(|&i| &self.leaves[i])
    }

    /// Rebuilds the key index; required after deserializing a snapshot.
    pub(crate) fn reindex(&mut self) {
        self.by_key = self
            .leaves
            .iter()
            .enumerate()
            .map(|(i, leaf)| (leaf.leaf_key.clone(), i))
            .collect();
    }

    pub(crate) fn compute_hash(&self) -> TaxonomyResult<String> {
        let view = StructuralView {
            sectors: &self.sectors,
            rayons: &self.rayons,
            familles: &self.familles,
            sous_familles: &self.sous_familles,
            leaf_keys: self.leaves.iter().map(|l| l.leaf_key.as_str()).collect(),
        };
        let canonical = serde_json::to_vec(&view)?;
        Ok(hash_taxonomy_structure(&canonical))
    }

    /// Checks ancestor resolution, key uniqueness and the stored hash.
    pub fn validate(&self) -> TaxonomyResult<()> {
        let sectors: HashSet<&str> = self.sectors.iter().map(|s| s.code.as_str()).collect();
        let rayons: HashSet<(&str, &str)> = self
            .rayons
            .iter()
            .map(|r| (r.code.as_str(), r.sector_code.as_str()))
            .collect();
        let familles: HashSet<(&str, &str)> = self
            .familles
            .iter()
            .map(|f| (f.code.as_str(), f.rayon_code.as_str()))
            .collect();
        let sous_familles: HashSet<(&str, &str)> = self
            .sous_familles
            .iter()
            .map(|sf| (sf.code.as_str(), sf.famille_code.as_str()))
            .collect();

        let mut seen = HashSet::with_capacity(self.leaves.len());
        for leaf in &self.leaves {
            if !seen.insert(leaf.leaf_key.as_str()) {
                return Err(TaxonomyError::InvariantViolation {
                    reason: format!("duplicate leaf key {}", leaf.leaf_key),
                });
            }

            let resolves = sectors.contains(leaf.sector.code.as_str())
                && rayons.contains(&(leaf.rayon.code.as_str(), leaf.sector.code.as_str()))
                && familles.contains(&(leaf.famille.code.as_str(), leaf.rayon.code.as_str()))
                && sous_familles
                    .contains(&(leaf.sous_famille.code.as_str(), leaf.famille.code.as_str()));
            if !resolves {
                return Err(TaxonomyError::InvariantViolation {
                    reason: format!("leaf {} has an unresolved ancestor", leaf.leaf_key),
                });
            }

            let expected = Leaf::compose_key(
                &leaf.sector.code,
                &leaf.rayon.code,
                &leaf.famille.code,
                &leaf.sous_famille.code,
            );
            if expected != leaf.leaf_key {
                return Err(TaxonomyError::InvariantViolation {
                    reason: format!("leaf key {} does not match its codes", leaf.leaf_key),
                });
            }
        }

        if self.taxonomy_hash.is_empty() || self.compute_hash()? != self.taxonomy_hash {
            return Err(TaxonomyError::InvariantViolation {
                reason: "taxonomy hash does not match content".to_string(),
            });
        }

        Ok(())
    }
}

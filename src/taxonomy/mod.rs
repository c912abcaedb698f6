//! Taxonomy store: the four-level sector → rayon → famille → sous-famille hierarchy.
//!
//! - [`parser`] turns the indentation-coded source into a [`Taxonomy`].
//! - [`repository`] owns the loaded snapshot and the cache-then-source load strategy.

pub mod error;
pub mod model;
pub mod parser;
pub mod repository;


pub use error::{TaxonomyError, TaxonomyResult};
pub use model::{Famille, Leaf, NodeLabel, Rayon, Sector, SousFamille, Taxonomy};
pub use parser::{extract_hierarchy_text, parse_hierarchy};
pub use repository::{CacheState, LoadStrategy, TaxonomyRepository};

/// Small grocery/household hierarchy used by tests and the offline demo.
#[cfg(any(test, feature = "mock"))]
pub const FIXTURE_HIERARCHY: &str = r"201 HYPERMARCHE
 01 EPICERIE
  010 BOISSONS
   101 BOISSONS GAZEUSES
    101 SODAS COLA
    102 EAUX GAZEUSES
   102 JUS
    201 JUS D'ORANGE
  011 PETIT DEJEUNER
   110 CAFE THE
    301 CAFE MOULU
    302 THE EN SACHETS
 02 PRODUITS FRAIS
  020 CREMERIE
   201 YAOURTS
    401 YAOURTS NATURE
    402 YAOURTS BIO
   202 BEURRE
    501 BEURRE DOUX
 03 DROGUERIE
  030 ENTRETIEN
   301 LINGE
    601 LESSIVE LIQUIDE
    602 ADOUCISSANT
";

/// Parses [`FIXTURE_HIERARCHY`].
#[cfg(any(test, feature = "mock"))]
pub fn fixture_taxonomy() -> Taxonomy {
    parse_hierarchy(FIXTURE_HIERARCHY).expect("fixture hierarchy parses")
}

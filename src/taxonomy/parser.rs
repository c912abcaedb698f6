//! Indentation-coded hierarchy parser.
//!
//! Lines look like `<code> <name>`; the amount of leading whitespace selects the level:
//! 0 = document root (ignored, resets everything), 1 = sector, 2 = rayon, 3 = famille,
//! 4 and deeper = sous-famille. Lines that don't match, or whose parent level is not
//! currently open, are skipped.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::error::TaxonomyResult;
use super::model::{Famille, Leaf, NodeLabel, Rayon, Sector, SousFamille, Taxonomy};
use crate::constants::PATH_SEPARATOR;

const HIERARCHY_MARKER: &str = "CLASSIFICATION_HIERARCHY";

static LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2,3})\s+(.+)$").expect("invalid LINE_RE"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedLine<'a> {
    pub indent: usize,
    pub code: &'a str,
    pub name: &'a str,
}

pub(crate) fn parse_line(line: &str) -> Option<ParsedLine<'_>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let indent = line.chars().take_while(|c| c.is_whitespace()).count();
    let caps = LINE_RE.captures(trimmed)?;
    let code = caps.get(1)?.as_str();
    let name = caps.get(2)?.as_str().trim();
    Some(ParsedLine { indent, code, name })
}

/// Returns the hierarchy block of a document.
///
/// When the document carries a `CLASSIFICATION_HIERARCHY` marker, only the lines after it
/// are kept, up to a `---` rule, a `## ` heading or a closing backtick. Otherwise the whole
/// document is the hierarchy.
pub fn extract_hierarchy_text(content: &str) -> &str {
    let Some(marker) = content.find(HIERARCHY_MARKER) else {
        return content;
    };

    let after_marker = &content[marker..];
    let body_start = after_marker.find('\n').map(|i| i + 1).unwrap_or(after_marker.len());
    let body = &after_marker[body_start..];

    let mut end = body.len();
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed == "---" || trimmed.starts_with("## ") || trimmed.starts_with('`') {
            end = offset;
            break;
        }
        offset += line.len();
    }
    &body[..end]
}

fn pad(code: &str, width: usize) -> String {
    format!("{code:0>width$}")
}

/// Parses an indentation-coded hierarchy into a taxonomy snapshot.
pub fn parse_hierarchy(text: &str) -> TaxonomyResult<Taxonomy> {
    let mut sectors: Vec<Sector> = Vec::new();
    let mut rayons: Vec<Rayon> = Vec::new();
    let mut familles: Vec<Famille> = Vec::new();
    let mut sous_familles: Vec<SousFamille> = Vec::new();
    let mut leaves: Vec<Leaf> = Vec::new();
    let mut leaf_keys: HashSet<String> = HashSet::new();

    let mut current_sector: Option<Sector> = None;
    let mut current_rayon: Option<Rayon> = None;
    let mut current_famille: Option<Famille> = None;
    let mut skipped = 0usize;

    for raw in text.lines() {
        let Some(ParsedLine { indent, code, name }) = parse_line(raw) else {
            continue;
        };

        match indent {
            0 => {
                current_sector = None;
                current_rayon = None;
                current_famille = None;
            }
            1 => {
                let sector = Sector {
                    code: pad(code, 2),
                    name: name.to_string(),
                };
                if !sectors.iter().any(|s| s.code == sector.code) {
                    sectors.push(sector.clone());
                }
                current_sector = Some(sector);
                current_rayon = None;
                current_famille = None;
            }
            2 => {
                let Some(sector) = &current_sector else {
                    skipped += 1;
                    continue;
                };
                let rayon = Rayon {
                    code: pad(code, 3),
                    name: name.to_string(),
                    sector_code: sector.code.clone(),
                };
                rayons.push(rayon.clone());
                current_rayon = Some(rayon);
                current_famille = None;
            }
            3 => {
                let Some(rayon) = &current_rayon else {
                    skipped += 1;
                    continue;
                };
                let famille = Famille {
                    code: pad(code, 3),
                    name: name.to_string(),
                    rayon_code: rayon.code.clone(),
                };
                familles.push(famille.clone());
                current_famille = Some(famille);
            }
            _ => {
                let (Some(sector), Some(rayon), Some(famille)) =
                    (&current_sector, &current_rayon, &current_famille)
                else {
                    skipped += 1;
                    continue;
                };

                let sous_famille = SousFamille {
                    code: pad(code, 3),
                    name: name.to_string(),
                    famille_code: famille.code.clone(),
                };
                let leaf_key =
                    Leaf::compose_key(&sector.code, &rayon.code, &famille.code, &sous_famille.code);
                if !leaf_keys.insert(leaf_key.clone()) {
                    debug!(leaf_key = %leaf_key, "Skipping duplicate sous-famille");
                    skipped += 1;
                    continue;
                }

                let full_path = [
                    sector.name.as_str(),
                    rayon.name.as_str(),
                    famille.name.as_str(),
                    sous_famille.name.as_str(),
                ]
                .join(PATH_SEPARATOR);

                leaves.push(Leaf {
                    leaf_id: sous_famille.code.clone(),
                    sector: NodeLabel::new(&sector.code, &sector.name),
                    rayon: NodeLabel::new(&rayon.code, &rayon.name),
                    famille: NodeLabel::new(&famille.code, &famille.name),
                    sous_famille: NodeLabel::new(&sous_famille.code, &sous_famille.name),
                    full_path,
                    leaf_key,
                });
                sous_familles.push(sous_famille);
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "Skipped malformed hierarchy lines");
    }

    Taxonomy::from_parts(sectors, rayons, familles, sous_familles, leaves)
}

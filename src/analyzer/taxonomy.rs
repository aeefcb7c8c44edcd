//! Cascading taxonomy resolution (Thematique → … → Action).
//!
//! Reference rows come from spreadsheets maintained by hand, so headers are
//! canonicalized through [`canonical_level`] and values through
//! [`crate::normalize::canon_value`] before any comparison.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{TaxonomyEntry, TaxonomyLevel, TaxonomyLevels, TaxonomyPath};
use crate::normalize::{canon_value, header_slug, norm_key};

/// Header slug → canonical level.
const CANON_MAP: &[(&str, TaxonomyLevel)] = &[
    ("thematique", TaxonomyLevel::Thematique),
    ("famille", TaxonomyLevel::Famille),
    ("sous famille", TaxonomyLevel::SousFamille),
    ("sous_famille", TaxonomyLevel::SousFamille),
    ("categorie", TaxonomyLevel::Categorie),
    ("sous categorie", TaxonomyLevel::SousCategorie),
    ("sous_categorie", TaxonomyLevel::SousCategorie),
    ("actions", TaxonomyLevel::Action),
    ("action", TaxonomyLevel::Action),
];

/// Canonical level for a spreadsheet header, whatever its accents, case or spacing.
pub fn canonical_level(header: &str) -> Option<TaxonomyLevel> {
    let slug = header_slug(header);
    CANON_MAP
        .iter()
        .find(|(key, _)| *key == slug)
        .map(|(_, level)| *level)
}

/// Builds a canonical entry from `(header, value)` pairs. Unknown headers are
/// ignored, missing levels stay empty.
pub fn entry_from_record<'a, I>(fields: I) -> TaxonomyEntry
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut entry = TaxonomyEntry::default();
    for (header, value) in fields {
        if let Some(level) = canonical_level(header) {
            *entry.level_mut(level) = canon_value(value);
        }
    }
    entry
}

/// NFKC + trim on every level.
pub fn normalize_entry(entry: &TaxonomyEntry) -> TaxonomyEntry {
    let mut out = TaxonomyEntry::default();
    for level in TaxonomyLevel::ALL {
        *out.level_mut(level) = canon_value(entry.level(level));
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyChildren {
    pub level: TaxonomyLevel,
    pub values: Vec<String>,
}

fn matches_prefix(entry: &TaxonomyEntry, keys: &[String]) -> bool {
    keys.iter()
        .zip(TaxonomyLevel::ALL)
        .all(|(key, level)| norm_key(entry.level(level)) == *key)
}

/// Valid values one level below the specified prefix of `path`.
///
/// Zero specified levels yields the Thematique values, five yields the
/// Action values. No matching entry yields an empty list.
pub fn resolve_children(entries: &[TaxonomyEntry], path: &TaxonomyPath) -> TaxonomyChildren {
    let keys: Vec<String> = path.specified().into_iter().map(norm_key).collect();
    let level = TaxonomyLevel::ALL[keys.len()];

    let values: BTreeSet<String> = entries
        .iter()
        .filter(|entry| matches_prefix(entry, &keys))
        .map(|entry| canon_value(entry.level(level)))
        .filter(|v| !v.is_empty())
        .collect();

    TaxonomyChildren {
        level,
        values: values.into_iter().collect(),
    }
}

/// True when the six levels form a path present in `entries`.
pub fn contains_path(entries: &[TaxonomyEntry], levels: &TaxonomyLevels) -> bool {
    let keys: Vec<String> = levels.as_array().iter().map(|v| norm_key(v)).collect();
    entries.iter().any(|entry| matches_prefix(entry, &keys))
}

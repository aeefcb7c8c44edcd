use std::collections::HashMap;

use crate::analyzer::taxonomy::canonical_level;
use crate::error::AppError;
use crate::model::TaxonomyLevel;
use crate::normalize::header_slug;

/// Colonnes obligatoires d'un export de tickets.
pub const LEGACY_REQUIRED: &[&str] = &["id", "date_creation"];

/// Autres colonnes reconnues, dans l'ordre d'insertion.
pub const LEGACY_COLUMNS: &[&str] = &[
    "agent",
    "nom_prenom",
    "id_client",
    "num_cmd",
    "canal",
    "thematique",
    "famille",
    "sous_famille",
    "categorie",
    "sous_categorie",
    "action",
    "traitement",
    "si_exceptionnel",
    "code_promo",
    "prix_pdts",
    "mnt_commande",
    "mnt_rembour",
    "mnt_gestco",
    "total_code_promo",
    "retour_magasin",
    "commentaires",
    "date_cloture",
    "cloture_by",
    "statut",
    "magasin",
    "num_magasin",
    "ville",
    "bu",
    "region",
    "dr",
    "dm",
];

/// Colonnes monétaires (affinité NUMERIC).
pub const AMOUNT_COLUMNS: &[&str] = &[
    "prix_pdts",
    "mnt_commande",
    "mnt_rembour",
    "mnt_gestco",
    "total_code_promo",
];

/// Colonnes nullables : vide → NULL.
pub const NULLABLE_COLUMNS: &[&str] = &["date_cloture", "cloture_by"];

/// Maps column names to their index in a CSV record.
/// Names are keyed by their slug, so `"Date_Creation "` finds `date_creation`.
pub struct ColumnMap {
    indices: HashMap<String, usize>,
    headers: Vec<String>,
}

impl ColumnMap {
    pub fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut indices = HashMap::new();
        let mut header_list = Vec::new();
        for (i, field) in headers.iter().enumerate() {
            let name = field.trim_start_matches('\u{FEFF}').trim().to_string();
            indices.entry(header_slug(&name)).or_insert(i);
            header_list.push(name);
        }
        ColumnMap {
            indices,
            headers: header_list,
        }
    }

    pub fn get<'a>(&self, record: &'a csv::StringRecord, col: &str) -> Option<&'a str> {
        self.indices.get(col).and_then(|&i| record.get(i))
    }

    pub fn has(&self, col: &str) -> bool {
        self.indices.contains_key(col)
    }

    pub fn all_headers(&self) -> &[String] {
        &self.headers
    }

    /// Index of the first column of each taxonomy level.
    pub fn taxonomy_indices(&self) -> Vec<(TaxonomyLevel, usize)> {
        let mut found: Vec<(TaxonomyLevel, usize)> = Vec::new();
        for (i, header) in self.headers.iter().enumerate() {
            if let Some(level) = canonical_level(header) {
                if !found.iter().any(|(l, _)| *l == level) {
                    found.push((level, i));
                }
            }
        }
        found
    }
}

#[derive(Debug)]
pub struct ColumnValidation {
    pub present: Vec<String>,
    pub missing_optional: Vec<String>,
}

/// Validate that all required ticket columns are present.
pub fn validate_ticket_columns(col_map: &ColumnMap) -> Result<ColumnValidation, AppError> {
    let missing_required: Vec<String> = LEGACY_REQUIRED
        .iter()
        .filter(|&&c| !col_map.has(c))
        .map(|c| c.to_string())
        .collect();

    if !missing_required.is_empty() {
        return Err(AppError::MissingColumns(missing_required));
    }

    let missing_optional = LEGACY_COLUMNS
        .iter()
        .filter(|&&c| !col_map.has(c))
        .map(|c| c.to_string())
        .collect();

    Ok(ColumnValidation {
        present: col_map.all_headers().to_vec(),
        missing_optional,
    })
}

/// `;` when the header line has at least as many `;` as `,`, otherwise `,`.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons > 0 && semicolons >= commas {
        b';'
    } else {
        b','
    }
}

use std::collections::HashMap;

use crate::analyzer::taxonomy::{entry_from_record, resolve_children, TaxonomyChildren};
use crate::db::reference;
use crate::error::AppError;
use crate::model::{TaxonomyEntry, TaxonomyPath};
use crate::state::{AppState, DbAccess};

/// Values of the next level under `path` (cascading form).
pub fn resolve_taxonomy_children(
    state: &AppState,
    path: TaxonomyPath,
) -> Result<TaxonomyChildren, AppError> {
    let entries = state.db(reference::load_taxonomy)?;
    Ok(resolve_children(&entries, &path))
}

/// Adds one taxonomy row given as `header → value`, whatever the header spelling.
pub fn add_taxonomy_entry(
    state: &AppState,
    record: HashMap<String, String>,
) -> Result<TaxonomyEntry, AppError> {
    let entry = entry_from_record(record.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if entry.thematique.is_empty() {
        return Err(AppError::Validation(vec!["Thematique".into()]));
    }
    state.db_mut(|conn| reference::add_taxonomy_entries(conn, std::slice::from_ref(&entry)))?;
    log::info!("Taxonomie : entrée ajoutée sous {}", entry.thematique);
    Ok(entry)
}

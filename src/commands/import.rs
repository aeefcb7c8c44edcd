use std::time::Instant;

use crate::db::{insert, reference};
use crate::error::AppError;
use crate::parser::types::{CsvImportResult, ParseWarning};
use crate::state::{AppState, DbAccess};

/// Loads a taxonomy spreadsheet export. With `replace`, the existing table is
/// swapped for the file content; otherwise rows are appended.
pub fn import_taxonomy_csv(
    state: &AppState,
    path: &str,
    replace: bool,
) -> Result<CsvImportResult, AppError> {
    let start = Instant::now();
    let parsed = crate::parser::parse_taxonomy_csv(path)?;

    let imported = state.db_mut(|conn| {
        if replace {
            reference::replace_taxonomy(conn, &parsed.entries)
        } else {
            reference::add_taxonomy_entries(conn, &parsed.entries)
        }
    })?;

    log::info!(
        "Taxonomie importée depuis {} : {} lignes, {} ignorées",
        path,
        imported,
        parsed.skipped_rows
    );

    Ok(CsvImportResult {
        imported,
        duplicates: 0,
        skipped_rows: parsed.skipped_rows,
        warnings: parsed.warnings,
        detected_columns: parsed.detected_columns,
        missing_optional_columns: parsed.missing_levels,
        parse_duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Loads a legacy ticket export. Ids already present are kept and reported;
/// the next allocation starts above the highest imported id.
pub fn import_tickets_csv(state: &AppState, path: &str) -> Result<CsvImportResult, AppError> {
    let parsed = crate::parser::parse_tickets_csv(path, |rows, accepted| {
        log::debug!("Import tickets : {} lignes lues, {} retenues", rows, accepted);
    })?;

    let outcome = state.db_mut(|conn| insert::bulk_insert_tickets(conn, &parsed.tickets))?;

    let mut warnings = parsed.warnings;
    warnings.extend(outcome.duplicate_ids.iter().map(|id| ParseWarning {
        line: 0,
        message: format!("Ticket {} déjà présent, ligne ignorée", id),
    }));

    log::info!(
        "Tickets importés depuis {} : {} insérés, {} doublons, {} lignes ignorées",
        path,
        outcome.inserted,
        outcome.duplicate_ids.len(),
        parsed.skipped_rows
    );

    Ok(CsvImportResult {
        imported: outcome.inserted,
        duplicates: outcome.duplicate_ids.len(),
        skipped_rows: parsed.skipped_rows,
        warnings,
        detected_columns: parsed.detected_columns,
        missing_optional_columns: parsed.missing_optional_columns,
        parse_duration_ms: parsed.parse_duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tickets::allocate_next_id;
    use crate::commands::taxonomy::resolve_taxonomy_children;
    use crate::db::setup::init_db_in_memory;
    use crate::model::TaxonomyPath;
    use std::io::Write;

    fn write_tmp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_import_tickets_then_allocate() {
        let state = AppState::from_connection(init_db_in_memory().unwrap());
        let file = write_tmp(
            "id;date_creation;agent;statut\n\
             120;01/02/2024 10:00;sara;Ouvert\n\
             121.0;2024-02-02 11:00:00;karim;Clôturé\n",
        );
        let path = file.path().to_str().unwrap();
        let res = import_tickets_csv(&state, path).unwrap();
        assert_eq!(res.imported, 2);
        assert_eq!(res.duplicates, 0);
        assert_eq!(allocate_next_id(&state).unwrap(), "122");

        let again = import_tickets_csv(&state, path).unwrap();
        assert_eq!(again.imported, 0);
        assert_eq!(again.duplicates, 2);
        assert_eq!(again.warnings.len(), 2);
    }

    #[test]
    fn test_import_taxonomy_replace() {
        let state = AppState::from_connection(init_db_in_memory().unwrap());
        let first = write_tmp("Thematique;Famille\nLivraison;Retard\nProduit;Défaut\n");
        let second = write_tmp("thématique,famille\nCompte,Accès\n");

        import_taxonomy_csv(&state, first.path().to_str().unwrap(), false).unwrap();
        let res = import_taxonomy_csv(&state, second.path().to_str().unwrap(), true).unwrap();
        assert_eq!(res.imported, 1);

        let root = resolve_taxonomy_children(&state, TaxonomyPath::default()).unwrap();
        assert_eq!(root.values, vec!["Compte"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let state = AppState::from_connection(init_db_in_memory().unwrap());
        assert!(matches!(
            import_tickets_csv(&state, "/nonexistent/tickets.csv"),
            Err(AppError::Io(_))
        ));
    }
}

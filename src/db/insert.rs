use rusqlite::{params_from_iter, types::Value, Connection};

use crate::parser::columns::LEGACY_COLUMNS;
use crate::parser::types::LegacyTicket;

/// Outcome of a bulk insert: rows written and ids already present.
#[derive(Debug, Default)]
pub struct BulkInsert {
    pub inserted: usize,
    pub duplicate_ids: Vec<String>,
}

/// Inserts imported tickets in one transaction. Ids already stored are left
/// untouched and reported.
pub fn bulk_insert_tickets(
    conn: &mut Connection,
    tickets: &[LegacyTicket],
) -> Result<BulkInsert, rusqlite::Error> {
    let columns = LEGACY_COLUMNS.join(", ");
    let placeholders: Vec<String> = (1..=LEGACY_COLUMNS.len() + 2)
        .map(|i| format!("?{}", i))
        .collect();
    let sql = format!(
        "INSERT OR IGNORE INTO tickets (id, date_creation, {}) VALUES ({})",
        columns,
        placeholders.join(", ")
    );

    let mut out = BulkInsert::default();
    let tx = conn.transaction()?;

    {
        let mut stmt = tx.prepare_cached(&sql)?;
        for t in tickets {
            let params = [Value::Text(t.id.clone()), Value::Text(t.date_creation.clone())]
                .into_iter()
                .chain(t.values.iter().cloned());
            if stmt.execute(params_from_iter(params))? == 0 {
                out.duplicate_ids.push(t.id.clone());
            } else {
                out.inserted += 1;
            }
        }
    }

    tx.commit()?;
    Ok(out)
}

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::AppError;

pub const TICKETS_COUNTER: &str = "tickets";

/// Longest numeric id the bootstrap reads. Longer ids would push the
/// counter past `i64`.
const MAX_BOOTSTRAP_DIGITS: i64 = 18;

/// Next ticket id, as a decimal string.
///
/// Runs in one IMMEDIATE transaction: the counter is first raised to the
/// highest numeric id already stored (imports and manual inserts never get
/// their id reused), then incremented. The write lock serializes concurrent
/// callers across connections and processes.
pub fn allocate_next_id(conn: &Connection) -> Result<String, AppError> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(AppError::from_storage)?;

    tx.execute_batch("CREATE UNIQUE INDEX IF NOT EXISTS idx_tickets_id ON tickets(id)")?;

    let max_id: i64 = tx.query_row(
        "SELECT COALESCE(MAX(CAST(id AS INTEGER)), 0)
         FROM tickets
         WHERE id GLOB '[0-9]*' AND id NOT GLOB '*[^0-9]*' AND length(id) <= ?1",
        [MAX_BOOTSTRAP_DIGITS],
        |row| row.get(0),
    )?;

    tx.execute(
        "INSERT INTO counters (name, seq) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET seq = MAX(seq, excluded.seq)",
        rusqlite::params![TICKETS_COUNTER, max_id],
    )?;

    let seq: i64 = tx.query_row(
        "UPDATE counters SET seq = seq + 1 WHERE name = ?1 RETURNING seq",
        rusqlite::params![TICKETS_COUNTER],
        |row| row.get(0),
    )?;

    tx.commit().map_err(AppError::from_storage)?;
    Ok(seq.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup::{init_db, init_db_in_memory};
    use std::collections::HashSet;

    #[test]
    fn test_first_allocation_on_empty_store() {
        let conn = init_db_in_memory().unwrap();
        assert_eq!(allocate_next_id(&conn).unwrap(), "1");
        assert_eq!(allocate_next_id(&conn).unwrap(), "2");
    }

    #[test]
    fn test_bootstrap_from_existing_ids() {
        let conn = init_db_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO tickets (id) VALUES ('3');
             INSERT INTO tickets (id) VALUES ('41');
             INSERT INTO tickets (id) VALUES ('ABC-99');",
        )
        .unwrap();
        assert_eq!(allocate_next_id(&conn).unwrap(), "42");
    }

    #[test]
    fn test_oversized_numeric_id_ignored_by_bootstrap() {
        let conn = init_db_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO tickets (id) VALUES ('12');
             INSERT INTO tickets (id) VALUES ('99999999999999999999');
             INSERT INTO tickets (id) VALUES ('9223372036854775807');",
        )
        .unwrap();
        assert_eq!(allocate_next_id(&conn).unwrap(), "13");
        assert_eq!(allocate_next_id(&conn).unwrap(), "14");
    }

    #[test]
    fn test_manual_insert_after_allocation_is_skipped() {
        let conn = init_db_in_memory().unwrap();
        assert_eq!(allocate_next_id(&conn).unwrap(), "1");
        conn.execute("INSERT INTO tickets (id) VALUES ('500')", [])
            .unwrap();
        assert_eq!(allocate_next_id(&conn).unwrap(), "501");
    }

    #[test]
    fn test_counter_never_regresses() {
        let conn = init_db_in_memory().unwrap();
        conn.execute("INSERT INTO counters (name, seq) VALUES ('tickets', 100)", [])
            .unwrap();
        conn.execute("INSERT INTO tickets (id) VALUES ('7')", [])
            .unwrap();
        assert_eq!(allocate_next_id(&conn).unwrap(), "101");
    }

    #[test]
    fn test_concurrent_allocations_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seq.db");
        let path = path.to_str().unwrap().to_string();
        drop(init_db(&path).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let conn = init_db(&path).unwrap();
                    (0..25)
                        .map(|_| allocate_next_id(&conn).unwrap().parse::<i64>().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            let ids = handle.join().unwrap();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            all.extend(ids);
        }
        let unique: HashSet<i64> = all.iter().copied().collect();
        assert_eq!(unique.len(), 100);
        assert_eq!(all.iter().max(), Some(&100));
    }
}

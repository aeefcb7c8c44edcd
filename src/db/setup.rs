use rusqlite::Connection;

use super::functions::register_functions;
use super::migrations::run_migrations;

pub fn init_db(path: &str) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -64000;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    register_functions(&conn)?;
    run_migrations(&conn)?;

    Ok(conn)
}

/// Fresh migrated in-memory database, used by tests and tooling.
pub fn init_db_in_memory() -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA temp_store = MEMORY;")?;
    register_functions(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

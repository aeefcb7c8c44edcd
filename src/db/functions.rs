use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::normalize;
use crate::parser::deserializers::amount_from_ref;

/// Registers `norm_key(x)`, `upper_trim(x)` and `montant(x)` on the connection.
pub fn register_functions(conn: &Connection) -> Result<(), rusqlite::Error> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("norm_key", 1, flags, |ctx| {
        let key = match ctx.get_raw(0) {
            ValueRef::Null => String::new(),
            ValueRef::Text(bytes) => normalize::norm_key(&String::from_utf8_lossy(bytes)),
            ValueRef::Integer(i) => i.to_string(),
            ValueRef::Real(f) => f.to_string(),
            ValueRef::Blob(_) => String::new(),
        };
        Ok(key)
    })?;

    // SQLite's UPPER only folds ASCII
    conn.create_scalar_function("upper_trim", 1, flags, |ctx| {
        let value = match ctx.get_raw(0) {
            ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).trim().to_uppercase(),
            ValueRef::Integer(i) => i.to_string(),
            ValueRef::Real(f) => f.to_string(),
            ValueRef::Null | ValueRef::Blob(_) => String::new(),
        };
        Ok(value)
    })?;

    conn.create_scalar_function("montant", 1, flags, |ctx| Ok(amount_from_ref(ctx.get_raw(0))))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();
        conn
    }

    #[test]
    fn test_norm_key_sql() {
        let conn = conn();
        let key: String = conn
            .query_row("SELECT norm_key('  Casa Ménara ')", [], |r| r.get(0))
            .unwrap();
        assert_eq!(key, "casa ménara");
        let null_key: String = conn
            .query_row("SELECT norm_key(NULL)", [], |r| r.get(0))
            .unwrap();
        assert_eq!(null_key, "");
    }

    #[test]
    fn test_upper_trim_sql() {
        let conn = conn();
        let v: String = conn
            .query_row("SELECT upper_trim('  hélène ')", [], |r| r.get(0))
            .unwrap();
        assert_eq!(v, "HÉLÈNE");
    }

    #[test]
    fn test_montant_sql() {
        let conn = conn();
        let values: Vec<f64> = ["'12,50'", "7", "3.25", "NULL", "'abc'"]
            .iter()
            .map(|v| {
                conn.query_row(&format!("SELECT montant({v})"), [], |r| r.get(0))
                    .unwrap()
            })
            .collect();
        assert_eq!(values, vec![12.5, 7.0, 3.25, 0.0, 0.0]);
    }
}

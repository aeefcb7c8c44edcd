use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::config::AppConfig;
use crate::error::{is_unique_violation, AppError};
use crate::model::{Agent, Magasin, NewAgent, TaxonomyEntry};
use crate::normalize::{canon_value, norm_key};

// ─── Lecture ──────────────────────────────────────────────────────────────────

/// Distinct non-blank channels, sorted. Falls back to the configured defaults
/// when the reference table is empty.
pub fn list_canaux(conn: &Connection, config: &AppConfig) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT TRIM(canal) FROM canaux WHERE TRIM(canal) != '' ORDER BY 1",
    )?;
    let canaux = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    if canaux.is_empty() {
        return Ok(config.canaux_par_defaut.clone());
    }
    Ok(canaux)
}

fn magasin_from_row(row: &rusqlite::Row) -> Result<Magasin, rusqlite::Error> {
    Ok(Magasin {
        magasin: row.get(0)?,
        code_magasin: row.get(1)?,
        ville: row.get(2)?,
        bu: row.get(3)?,
        region: row.get(4)?,
        dr: row.get(5)?,
        dm: row.get(6)?,
    })
}

pub fn list_magasins(conn: &Connection) -> Result<Vec<Magasin>, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(
        "SELECT magasin, code_magasin, ville, bu, region, dr, dm
         FROM magasins
         WHERE TRIM(magasin) != ''
         ORDER BY magasin",
    )?;
    let rows = stmt
        .query_map([], magasin_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Store whose normalized name equals the normalized `name`.
pub fn find_magasin(conn: &Connection, name: &str) -> Result<Option<Magasin>, rusqlite::Error> {
    if name.trim().is_empty() {
        return Ok(None);
    }
    conn.query_row(
        "SELECT magasin, code_magasin, ville, bu, region, dr, dm
         FROM magasins
         WHERE norm_key(magasin) = ?1
         ORDER BY rowid
         LIMIT 1",
        rusqlite::params![norm_key(name)],
        magasin_from_row,
    )
    .optional()
}

pub fn load_taxonomy(conn: &Connection) -> Result<Vec<TaxonomyEntry>, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(
        "SELECT thematique, famille, sous_famille, categorie, sous_categorie, action
         FROM thematiques",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TaxonomyEntry {
                thematique: row.get(0)?,
                famille: row.get(1)?,
                sous_famille: row.get(2)?,
                categorie: row.get(3)?,
                sous_categorie: row.get(4)?,
                action: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_agent(conn: &Connection, username: &str) -> Result<Option<Agent>, rusqlite::Error> {
    conn.query_row(
        "SELECT username, full_name, email FROM agents WHERE username = ?1",
        rusqlite::params![username.trim()],
        |row| {
            Ok(Agent {
                username: row.get(0)?,
                full_name: row.get(1)?,
                email: row.get(2)?,
            })
        },
    )
    .optional()
}

// ─── Écriture (console d'administration) ──────────────────────────────────────

pub fn add_canal(conn: &Connection, canal: &str) -> Result<(), AppError> {
    let canal = canon_value(canal);
    if canal.is_empty() {
        return Err(AppError::Validation(vec!["Canal".into()]));
    }
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM canaux WHERE norm_key(canal) = ?1)",
        rusqlite::params![norm_key(&canal)],
        |row| row.get(0),
    )?;
    if exists {
        return Err(AppError::Conflict(format!("Le canal {}", canal)));
    }
    conn.execute("INSERT INTO canaux (canal) VALUES (?1)", rusqlite::params![canal])?;
    Ok(())
}

pub fn add_magasin(conn: &Connection, magasin: &Magasin) -> Result<(), AppError> {
    let name = canon_value(&magasin.magasin);
    if name.is_empty() {
        return Err(AppError::Validation(vec!["Magasin".into()]));
    }
    if find_magasin(conn, &name)?.is_some() {
        return Err(AppError::Conflict(format!("Le magasin {}", name)));
    }
    conn.execute(
        "INSERT INTO magasins (magasin, code_magasin, ville, bu, region, dr, dm)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            name,
            magasin.code_magasin.trim(),
            magasin.ville.trim(),
            magasin.bu.trim(),
            magasin.region.trim(),
            magasin.dr.trim(),
            magasin.dm.trim(),
        ],
    )?;
    Ok(())
}

fn insert_entries(conn: &Connection, entries: &[TaxonomyEntry]) -> Result<usize, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO thematiques (thematique, famille, sous_famille, categorie, sous_categorie, action)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for e in entries {
        stmt.execute(rusqlite::params![
            e.thematique,
            e.famille,
            e.sous_famille,
            e.categorie,
            e.sous_categorie,
            e.action,
        ])?;
    }
    Ok(entries.len())
}

/// Appends taxonomy rows. Entries are expected canonical
/// (see [`crate::analyzer::taxonomy::normalize_entry`]).
pub fn add_taxonomy_entries(
    conn: &mut Connection,
    entries: &[TaxonomyEntry],
) -> Result<usize, rusqlite::Error> {
    let tx = conn.transaction()?;
    let n = insert_entries(&tx, entries)?;
    tx.commit()?;
    Ok(n)
}

/// Replaces the whole taxonomy table in one transaction.
pub fn replace_taxonomy(
    conn: &mut Connection,
    entries: &[TaxonomyEntry],
) -> Result<usize, rusqlite::Error> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM thematiques", [])?;
    let n = insert_entries(&tx, entries)?;
    tx.commit()?;
    Ok(n)
}

// ─── Agents ───────────────────────────────────────────────────────────────────

/// Hex SHA-256 of `username:password`.
pub fn hash_password(username: &str, password: &str) -> String {
    let digest = Sha256::digest(format!("{}:{}", username, password).as_bytes());
    hex::encode(digest)
}

pub fn add_agent(conn: &Connection, agent: &NewAgent) -> Result<Agent, AppError> {
    let username = agent.username.trim().to_string();
    let mut missing = Vec::new();
    if username.is_empty() {
        missing.push("Nom d'utilisateur".to_string());
    }
    if agent.password.is_empty() {
        missing.push("Mot de passe".to_string());
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(missing));
    }

    let email = match agent.email.trim() {
        "" => "-".to_string(),
        e => e.to_string(),
    };
    let res = conn.execute(
        "INSERT INTO agents (username, password_hash, full_name, email) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            username,
            hash_password(&username, &agent.password),
            agent.full_name.trim(),
            email,
        ],
    );
    match res {
        Ok(_) => Ok(Agent {
            username,
            full_name: agent.full_name.trim().to_string(),
            email,
        }),
        Err(e) if is_unique_violation(&e) => {
            Err(AppError::Conflict(format!("L'agent {}", username)))
        }
        Err(e) => Err(e.into()),
    }
}

/// The agent when `password` matches the stored hash.
pub fn verify_agent(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<Option<Agent>, rusqlite::Error> {
    let username = username.trim();
    let stored: Option<String> = conn
        .query_row(
            "SELECT password_hash FROM agents WHERE username = ?1",
            rusqlite::params![username],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        Some(hash) if hash == hash_password(username, password) => find_agent(conn, username),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup::init_db_in_memory;

    fn magasin(name: &str, bu: &str) -> Magasin {
        Magasin {
            magasin: name.into(),
            code_magasin: "M01".into(),
            ville: "Casablanca".into(),
            bu: bu.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_canaux_fallback_then_reference() {
        let conn = init_db_in_memory().unwrap();
        let config = AppConfig::default();
        assert_eq!(
            list_canaux(&conn, &config).unwrap(),
            vec!["Téléphone", "Email", "Chat", "InApp"]
        );
        add_canal(&conn, " WhatsApp ").unwrap();
        add_canal(&conn, "Boutique").unwrap();
        assert_eq!(list_canaux(&conn, &config).unwrap(), vec!["Boutique", "WhatsApp"]);
        assert!(matches!(
            add_canal(&conn, "whatsapp"),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_find_magasin_normalized() {
        let conn = init_db_in_memory().unwrap();
        add_magasin(&conn, &magasin("Casa Anfa", "Nord")).unwrap();
        let found = find_magasin(&conn, "  CASA ANFA ").unwrap().unwrap();
        assert_eq!(found.bu, "Nord");
        assert!(find_magasin(&conn, "Rabat").unwrap().is_none());
        assert!(find_magasin(&conn, "").unwrap().is_none());
        assert!(matches!(
            add_magasin(&conn, &magasin("casa anfa", "Sud")),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_replace_taxonomy() {
        let mut conn = init_db_in_memory().unwrap();
        let entry = TaxonomyEntry {
            thematique: "Livraison".into(),
            ..Default::default()
        };
        add_taxonomy_entries(&mut conn, &[entry.clone(), entry.clone()]).unwrap();
        assert_eq!(load_taxonomy(&conn).unwrap().len(), 2);
        replace_taxonomy(&mut conn, &[entry]).unwrap();
        assert_eq!(load_taxonomy(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_agent_lifecycle() {
        let conn = init_db_in_memory().unwrap();
        let new = NewAgent {
            username: "sara".into(),
            password: "s3cret".into(),
            full_name: "Sara El Idrissi".into(),
            email: String::new(),
        };
        let agent = add_agent(&conn, &new).unwrap();
        assert_eq!(agent.email, "-");
        assert!(matches!(add_agent(&conn, &new), Err(AppError::Conflict(_))));

        assert_eq!(verify_agent(&conn, "sara", "s3cret").unwrap(), Some(agent));
        assert_eq!(verify_agent(&conn, "sara", "wrong").unwrap(), None);
        assert_eq!(verify_agent(&conn, "nobody", "s3cret").unwrap(), None);

        let stored: String = conn
            .query_row("SELECT password_hash FROM agents", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stored.len(), 64);
        assert_ne!(stored, "s3cret");
    }
}

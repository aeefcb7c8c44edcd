use std::collections::HashSet;

use rusqlite::Connection;
use serde::Serialize;

use crate::normalize::norm_key;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub agents: Vec<String>,
    pub canaux: Vec<String>,
    pub thematiques: Vec<String>,
    pub actions: Vec<String>,
    pub magasins: Vec<String>,
    /// Union of ticket and store BUs, one entry per `norm_key`.
    pub bus: Vec<String>,
    pub date_min: Option<String>,
    pub date_max: Option<String>,
    pub promo_min: Option<f64>,
    pub promo_max: Option<f64>,
}

fn distinct_column(conn: &Connection, column: &str) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT DISTINCT TRIM({column}) AS v FROM tickets WHERE TRIM({column}) != '' ORDER BY v"
    ))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Values offered by the analytics filter controls.
pub fn filter_options(conn: &Connection) -> Result<FilterOptions, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(
        "SELECT TRIM(bu) AS v FROM tickets WHERE TRIM(bu) != ''
         UNION
         SELECT TRIM(bu) FROM magasins WHERE TRIM(bu) != ''
         ORDER BY v",
    )?;
    let mut seen = HashSet::new();
    let bus = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|bu| seen.insert(norm_key(bu)))
        .collect();

    let (date_min, date_max) = conn.query_row(
        "SELECT MIN(date_creation), MAX(date_creation) FROM tickets WHERE TRIM(date_creation) != ''",
        [],
        |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?)),
    )?;

    let (promo_min, promo_max) = conn.query_row(
        "SELECT MIN(montant(total_code_promo)), MAX(montant(total_code_promo)) FROM tickets",
        [],
        |row| Ok((row.get::<_, Option<f64>>(0)?, row.get::<_, Option<f64>>(1)?)),
    )?;

    Ok(FilterOptions {
        agents: distinct_column(conn, "agent")?,
        canaux: distinct_column(conn, "canal")?,
        thematiques: distinct_column(conn, "thematique")?,
        actions: distinct_column(conn, "action")?,
        magasins: distinct_column(conn, "magasin")?,
        bus,
        date_min,
        date_max,
        promo_min,
        promo_max,
    })
}

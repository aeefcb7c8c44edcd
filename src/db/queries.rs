use std::collections::BTreeSet;

use rusqlite::{params_from_iter, types::Value, Connection};

use crate::commands::tickets::{LabelCount, TicketFilters, TicketList, TicketStats};
use crate::model::{Statut, TicketSummary};
use crate::normalize::norm_key;
use crate::parser::deserializers::parse_date_flexible;

// ─── Helpers privés ───────────────────────────────────────────────────────────

/// Ajoute dynamiquement des conditions WHERE selon les filtres fournis.
/// `params` est alimenté au fur et à mesure ; le ?N correspondant est calculé
/// d'après `params.len()` après push (SQLite params sont 1-indexés).
fn apply_filters(sql: &mut String, params: &mut Vec<Value>, filters: &TicketFilters) {
    let equals = [
        ("agent", &filters.agent),
        ("statut", &filters.statut),
        ("thematique", &filters.thematique),
        ("magasin", &filters.magasin),
    ];
    for (column, value) in equals {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            params.push(Value::Text(v.to_string()));
            sql.push_str(&format!(" AND {} = ?{}", column, params.len()));
        }
    }
    if let Some(d) = filters.dmin.as_deref().and_then(parse_date_flexible) {
        params.push(Value::Text(format!("{} 00:00:00", d.format("%Y-%m-%d"))));
        sql.push_str(&format!(" AND date_creation >= ?{}", params.len()));
    }
    if let Some(d) = filters.dmax.as_deref().and_then(parse_date_flexible) {
        params.push(Value::Text(format!("{} 23:59:59", d.format("%Y-%m-%d"))));
        sql.push_str(&format!(" AND date_creation <= ?{}", params.len()));
    }
    if let Some(q) = filters.q.as_deref().map(norm_key).filter(|q| !q.is_empty()) {
        params.push(Value::Text(q));
        let n = params.len();
        sql.push_str(&format!(
            " AND (instr(norm_key(nom_prenom), ?{n}) > 0
               OR instr(norm_key(num_cmd), ?{n}) > 0
               OR instr(norm_key(id_client), ?{n}) > 0
               OR instr(norm_key(magasin), ?{n}) > 0
               OR instr(norm_key(commentaires), ?{n}) > 0
               OR instr(norm_key(id), ?{n}) > 0)"
        ));
    }
}

fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ─── Fonctions de requête publiques ───────────────────────────────────────────

/// Tickets matching `filters`, newest first, with the distinct filter values
/// of the result set.
pub fn list_tickets(conn: &Connection, filters: &TicketFilters) -> Result<TicketList, rusqlite::Error> {
    let mut sql = String::from(
        "SELECT id, date_creation, agent, nom_prenom, magasin, thematique, statut,
                num_cmd, id_client, montant(mnt_commande), montant(total_code_promo)
         FROM tickets
         WHERE 1=1",
    );
    let mut params: Vec<Value> = Vec::new();
    apply_filters(&mut sql, &mut params, filters);
    sql.push_str(" ORDER BY date_creation DESC, rowid DESC");

    let mut stmt = conn.prepare(&sql)?;
    let tickets: Vec<TicketSummary> = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            Ok(TicketSummary {
                id: row.get(0)?,
                date_creation: row.get(1)?,
                agent: row.get(2)?,
                nom_prenom: row.get(3)?,
                magasin: row.get(4)?,
                thematique: row.get(5)?,
                statut: row.get(6)?,
                num_cmd: row.get(7)?,
                id_client: row.get(8)?,
                mnt_commande: row.get(9)?,
                total_code_promo: row.get(10)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TicketList {
        agents: distinct_sorted(tickets.iter().map(|t| t.agent.as_str())),
        statuts: distinct_sorted(tickets.iter().map(|t| t.statut.as_str())),
        thematiques: distinct_sorted(tickets.iter().map(|t| t.thematique.as_str())),
        magasins: distinct_sorted(tickets.iter().map(|t| t.magasin.as_str())),
        tickets,
    })
}

/// Totals for the ticket overview. Unknown statuses count as open.
pub fn ticket_stats(conn: &Connection) -> Result<TicketStats, rusqlite::Error> {
    let (total, ouverts) = conn.query_row(
        &format!(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN {} THEN 0 ELSE 1 END), 0) FROM tickets",
            Statut::closed_condition("statut")
        ),
        [],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
    )?;

    let mut stmt = conn.prepare_cached(
        "SELECT statut, COUNT(*) AS cnt FROM tickets GROUP BY statut ORDER BY cnt DESC, statut",
    )?;
    let par_statut = stmt
        .query_map([], |row| {
            Ok(LabelCount {
                label: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare_cached(
        "SELECT TRIM(thematique) AS t, COUNT(*) AS cnt
         FROM tickets
         WHERE TRIM(thematique) != ''
         GROUP BY t
         ORDER BY cnt DESC, t
         LIMIT 10",
    )?;
    let top_thematiques = stmt
        .query_map([], |row| {
            Ok(LabelCount {
                label: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TicketStats {
        total,
        ouverts,
        clotures: total - ouverts,
        par_statut,
        top_thematiques,
    })
}

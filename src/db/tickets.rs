use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension};

use crate::analyzer::lifecycle::{apply_transition, Closure};
use crate::analyzer::validation::{check_taxonomy, validate_form};
use crate::config::AppConfig;
use crate::error::{is_unique_violation, AppError};
use crate::model::{Statut, StoreLink, TaxonomyLevels, Ticket, TicketFields, TicketForm};
use crate::normalize::non_blank;
use crate::parser::deserializers::{format_iso, id_candidates};

use super::reference::{find_magasin, load_taxonomy};
use super::sequence::allocate_next_id;

/// Column list matching [`ticket_from_row`]. Amounts go through `montant()` so
/// legacy text values read as numbers.
const TICKET_COLUMNS: &str = "id, date_creation, agent, nom_prenom, id_client, num_cmd, canal,
    thematique, famille, sous_famille, categorie, sous_categorie, action,
    traitement, si_exceptionnel, code_promo,
    montant(prix_pdts), montant(mnt_commande), montant(mnt_rembour), montant(mnt_gestco),
    montant(total_code_promo),
    retour_magasin, commentaires, date_cloture, cloture_by, statut,
    magasin, num_magasin, ville, bu, region, dr, dm";

/// Matches a ticket by its raw trimmed id or its canonical numeric form.
const ID_MATCH: &str = "(id = ?1 OR id = ?2)";

fn ticket_from_row(row: &rusqlite::Row) -> Result<Ticket, rusqlite::Error> {
    let date_cloture: Option<String> = row.get(23)?;
    let cloture_by: Option<String> = row.get(24)?;
    let statut: String = row.get(25)?;
    Ok(Ticket {
        id: row.get(0)?,
        date_creation: row.get(1)?,
        agent: row.get(2)?,
        nom_prenom: row.get(3)?,
        id_client: row.get(4)?,
        num_cmd: row.get(5)?,
        canal: row.get(6)?,
        taxonomie: TaxonomyLevels {
            thematique: row.get(7)?,
            famille: row.get(8)?,
            sous_famille: row.get(9)?,
            categorie: row.get(10)?,
            sous_categorie: row.get(11)?,
            action: row.get(12)?,
        },
        traitement: row.get(13)?,
        si_exceptionnel: row.get(14)?,
        code_promo: row.get(15)?,
        prix_pdts: row.get(16)?,
        mnt_commande: row.get(17)?,
        mnt_rembour: row.get(18)?,
        mnt_gestco: row.get(19)?,
        total_code_promo: row.get(20)?,
        retour_magasin: row.get(21)?,
        commentaires: row.get(22)?,
        date_cloture: date_cloture.as_deref().and_then(non_blank),
        cloture_by: cloture_by.as_deref().and_then(non_blank),
        statut: Statut::from_stored(&statut),
        store: StoreLink {
            magasin: row.get(26)?,
            num_magasin: row.get(27)?,
            ville: row.get(28)?,
            bu: row.get(29)?,
            region: row.get(30)?,
            dr: row.get(31)?,
            dm: row.get(32)?,
        },
    })
}

fn find_by_rowid(conn: &Connection, rowid: i64) -> Result<Ticket, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {} FROM tickets WHERE rowid = ?1", TICKET_COLUMNS),
        rusqlite::params![rowid],
        ticket_from_row,
    )
}

/// rowid and closure stamp of the ticket matching `id`.
fn locate(conn: &Connection, id: &str) -> Result<(i64, Closure), AppError> {
    let (raw, canonical) = id_candidates(id);
    conn.query_row(
        &format!(
            "SELECT rowid, date_cloture, cloture_by FROM tickets WHERE {} ORDER BY rowid LIMIT 1",
            ID_MATCH
        ),
        rusqlite::params![raw, canonical],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Closure {
                    date_cloture: row.get(1)?,
                    cloture_by: row.get(2)?,
                },
            ))
        },
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(raw))
}

pub fn find_ticket(conn: &Connection, id: &str) -> Result<Ticket, AppError> {
    let (rowid, _) = locate(conn, id)?;
    Ok(find_by_rowid(conn, rowid)?)
}

fn checked_fields(
    conn: &Connection,
    form: &TicketForm,
    config: &AppConfig,
) -> Result<TicketFields, AppError> {
    let fields = validate_form(form)?;
    if config.taxonomie_stricte {
        check_taxonomy(&fields, &load_taxonomy(conn)?, config)?;
    }
    Ok(fields)
}

/// Fills blank store attributes from the `magasins` reference.
fn link_store(conn: &Connection, store: &mut StoreLink) -> Result<(), rusqlite::Error> {
    let Some(m) = find_magasin(conn, &store.magasin)? else {
        return Ok(());
    };
    let fill = |slot: &mut String, value: &str| {
        if slot.trim().is_empty() {
            *slot = value.trim().to_string();
        }
    };
    fill(&mut store.num_magasin, &m.code_magasin);
    fill(&mut store.ville, &m.ville);
    fill(&mut store.bu, &m.bu);
    fill(&mut store.region, &m.region);
    fill(&mut store.dr, &m.dr);
    fill(&mut store.dm, &m.dm);
    Ok(())
}

/// Validates `form`, allocates an id and inserts the ticket.
///
/// A unique violation on insert is reported as `DuplicateId`; the caller may
/// retry, which allocates a fresh id.
pub fn create_ticket(
    conn: &Connection,
    form: &TicketForm,
    agent: &str,
    now: &NaiveDateTime,
    config: &AppConfig,
) -> Result<Ticket, AppError> {
    let mut fields = checked_fields(conn, form, config)?;
    link_store(conn, &mut fields.store)?;

    let id = allocate_next_id(conn)?;
    let (statut, closure) = apply_transition(None, fields.statut, false, agent, now);

    let res = conn.execute(
        "INSERT INTO tickets (
            id, date_creation, agent, nom_prenom, id_client, num_cmd, canal,
            thematique, famille, sous_famille, categorie, sous_categorie, action,
            traitement, si_exceptionnel, code_promo,
            prix_pdts, mnt_commande, mnt_rembour, mnt_gestco, total_code_promo,
            retour_magasin, commentaires, date_cloture, cloture_by, statut,
            magasin, num_magasin, ville, bu, region, dr, dm
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16,
            ?17, ?18, ?19, ?20, ?21,
            ?22, ?23, ?24, ?25, ?26,
            ?27, ?28, ?29, ?30, ?31, ?32, ?33
        )",
        rusqlite::params![
            id,
            format_iso(now),
            agent,
            fields.nom_prenom,
            fields.id_client,
            fields.num_cmd,
            fields.canal,
            fields.taxonomie.thematique,
            fields.taxonomie.famille,
            fields.taxonomie.sous_famille,
            fields.taxonomie.categorie,
            fields.taxonomie.sous_categorie,
            fields.taxonomie.action,
            fields.traitement,
            fields.si_exceptionnel,
            fields.code_promo,
            fields.prix_pdts,
            fields.mnt_commande,
            fields.mnt_rembour,
            fields.mnt_gestco,
            fields.total_code_promo(),
            fields.retour_magasin,
            fields.commentaires,
            closure.date_cloture,
            closure.cloture_by,
            statut.label(),
            fields.store.magasin,
            fields.store.num_magasin,
            fields.store.ville,
            fields.store.bu,
            fields.store.region,
            fields.store.dr,
            fields.store.dm,
        ],
    );

    match res {
        Ok(_) => Ok(find_by_rowid(conn, conn.last_insert_rowid())?),
        Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateId(id)),
        Err(e) => Err(AppError::from_storage(e)),
    }
}

/// Full replace of the mutable fields. `id` and `date_creation` are kept,
/// `heure_cloture` is cleared.
pub fn update_ticket(
    conn: &Connection,
    id: &str,
    form: &TicketForm,
    agent: &str,
    close_requested: bool,
    now: &NaiveDateTime,
    config: &AppConfig,
) -> Result<Ticket, AppError> {
    let (rowid, existing) = locate(conn, id)?;
    let fields = checked_fields(conn, form, config)?;
    let (statut, closure) =
        apply_transition(Some(&existing), fields.statut, close_requested, agent, now);

    conn.execute(
        "UPDATE tickets SET
            nom_prenom = ?2, id_client = ?3, num_cmd = ?4, canal = ?5,
            thematique = ?6, famille = ?7, sous_famille = ?8, categorie = ?9,
            sous_categorie = ?10, action = ?11,
            traitement = ?12, si_exceptionnel = ?13, code_promo = ?14,
            prix_pdts = ?15, mnt_commande = ?16, mnt_rembour = ?17, mnt_gestco = ?18,
            total_code_promo = ?19,
            retour_magasin = ?20, commentaires = ?21,
            date_cloture = ?22, cloture_by = ?23, statut = ?24, heure_cloture = NULL,
            magasin = ?25, num_magasin = ?26, ville = ?27, bu = ?28,
            region = ?29, dr = ?30, dm = ?31
         WHERE rowid = ?1",
        rusqlite::params![
            rowid,
            fields.nom_prenom,
            fields.id_client,
            fields.num_cmd,
            fields.canal,
            fields.taxonomie.thematique,
            fields.taxonomie.famille,
            fields.taxonomie.sous_famille,
            fields.taxonomie.categorie,
            fields.taxonomie.sous_categorie,
            fields.taxonomie.action,
            fields.traitement,
            fields.si_exceptionnel,
            fields.code_promo,
            fields.prix_pdts,
            fields.mnt_commande,
            fields.mnt_rembour,
            fields.mnt_gestco,
            fields.total_code_promo(),
            fields.retour_magasin,
            fields.commentaires,
            closure.date_cloture,
            closure.cloture_by,
            statut.label(),
            fields.store.magasin,
            fields.store.num_magasin,
            fields.store.ville,
            fields.store.bu,
            fields.store.region,
            fields.store.dr,
            fields.store.dm,
        ],
    )
    .map_err(AppError::from_storage)?;

    Ok(find_by_rowid(conn, rowid)?)
}

/// Closes an open ticket in a single conditional update.
///
/// Already closed or unknown ids leave the store untouched and return `NoopClose`.
pub fn close_ticket(
    conn: &Connection,
    id: &str,
    agent: &str,
    now: &NaiveDateTime,
) -> Result<Ticket, AppError> {
    let (raw, canonical) = id_candidates(id);
    let changed = conn
        .execute(
            &format!(
                "UPDATE tickets
                 SET statut = ?3, date_cloture = ?4, cloture_by = ?5, heure_cloture = NULL
                 WHERE {} AND NOT {}",
                ID_MATCH,
                Statut::closed_condition("statut")
            ),
            rusqlite::params![raw, canonical, Statut::CLOTURE, format_iso(now), agent],
        )
        .map_err(AppError::from_storage)?;

    if changed == 0 {
        return Err(AppError::NoopClose(raw));
    }
    find_ticket(conn, id)
}

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::config::get_config_from_db;
use crate::db::{queries, sequence, tickets};
use crate::error::AppError;
use crate::model::{Ticket, TicketForm, TicketSummary};
use crate::state::{AppState, DbAccess};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TicketFilters {
    pub agent: Option<String>,
    pub statut: Option<String>,
    pub thematique: Option<String>,
    pub magasin: Option<String>,
    /// Inclusive creation-date bounds (date only).
    pub dmin: Option<String>,
    pub dmax: Option<String>,
    /// Case-insensitive search over name, order, client, store, comments and id.
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketList {
    pub tickets: Vec<TicketSummary>,
    pub agents: Vec<String>,
    pub statuts: Vec<String>,
    pub thematiques: Vec<String>,
    pub magasins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: i64,
    pub ouverts: i64,
    pub clotures: i64,
    pub par_statut: Vec<LabelCount>,
    pub top_thematiques: Vec<LabelCount>,
}

pub fn allocate_next_id(state: &AppState) -> Result<String, AppError> {
    state.db(sequence::allocate_next_id)
}

/// Creates a ticket. A duplicate id on insert is retried once with a freshly
/// allocated id.
pub fn create_ticket(state: &AppState, form: TicketForm, agent: &str) -> Result<Ticket, AppError> {
    let ticket = state.db(|conn| {
        let config = get_config_from_db(conn)?;
        let now = Local::now().naive_local();
        match tickets::create_ticket(conn, &form, agent, &now, &config) {
            Err(AppError::DuplicateId(id)) => {
                log::warn!("Identifiant {} déjà attribué, nouvelle allocation", id);
                tickets::create_ticket(conn, &form, agent, &now, &config)
            }
            other => other,
        }
    })?;
    log::info!("Ticket {} créé par {}", ticket.id, agent);
    Ok(ticket)
}

pub fn update_ticket(
    state: &AppState,
    id: &str,
    form: TicketForm,
    agent: &str,
    close_requested: bool,
) -> Result<Ticket, AppError> {
    let ticket = state.db(|conn| {
        let config = get_config_from_db(conn)?;
        let now = Local::now().naive_local();
        tickets::update_ticket(conn, id, &form, agent, close_requested, &now, &config)
    })?;
    log::info!("Ticket {} mis à jour par {} ({})", ticket.id, agent, ticket.statut.label());
    Ok(ticket)
}

pub fn close_ticket(state: &AppState, id: &str, agent: &str) -> Result<Ticket, AppError> {
    let res = state.db(|conn| tickets::close_ticket(conn, id, agent, &Local::now().naive_local()));
    match &res {
        Ok(t) => log::info!("Ticket {} clôturé par {}", t.id, agent),
        Err(AppError::NoopClose(id)) => log::warn!("Ticket {} déjà clôturé ou introuvable", id),
        Err(_) => {}
    }
    res
}

pub fn find_ticket(state: &AppState, id: &str) -> Result<Ticket, AppError> {
    state.db(|conn| tickets::find_ticket(conn, id))
}

pub fn list_tickets(state: &AppState, filters: TicketFilters) -> Result<TicketList, AppError> {
    state.db(|conn| queries::list_tickets(conn, &filters))
}

pub fn ticket_stats(state: &AppState) -> Result<TicketStats, AppError> {
    state.db(queries::ticket_stats)
}

use crate::config::get_config_from_db;
use crate::db::reference;
use crate::error::AppError;
use crate::model::{Agent, Magasin, NewAgent};
use crate::state::{AppState, DbAccess};

pub fn list_canaux(state: &AppState) -> Result<Vec<String>, AppError> {
    state.db(|conn| {
        let config = get_config_from_db(conn)?;
        reference::list_canaux(conn, &config)
    })
}

pub fn list_magasins(state: &AppState) -> Result<Vec<Magasin>, AppError> {
    state.db(reference::list_magasins)
}

pub fn add_canal(state: &AppState, canal: String) -> Result<(), AppError> {
    state.db(|conn| reference::add_canal(conn, &canal))?;
    log::info!("Canal {} ajouté", canal.trim());
    Ok(())
}

pub fn add_magasin(state: &AppState, magasin: Magasin) -> Result<(), AppError> {
    state.db(|conn| reference::add_magasin(conn, &magasin))?;
    log::info!("Magasin {} ajouté", magasin.magasin.trim());
    Ok(())
}

pub fn add_agent(state: &AppState, agent: NewAgent) -> Result<Agent, AppError> {
    let created = state.db(|conn| reference::add_agent(conn, &agent))?;
    log::info!("Agent {} créé", created.username);
    Ok(created)
}

/// The agent when the credentials match, `None` otherwise.
pub fn verify_agent(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Option<Agent>, AppError> {
    let agent = state.db(|conn| reference::verify_agent(conn, username, password))?;
    if agent.is_none() {
        log::warn!("Échec d'authentification pour {}", username.trim());
    }
    Ok(agent)
}

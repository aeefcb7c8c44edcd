use crate::config::AppConfig;
use crate::error::AppError;
use crate::state::{AppState, DbAccess};

pub fn get_config(state: &AppState) -> Result<AppConfig, AppError> {
    state.db(crate::config::get_config_from_db)
}

pub fn update_config(state: &AppState, config: AppConfig) -> Result<(), AppError> {
    state.db(|conn| crate::config::update_config_in_db(conn, &config))?;
    log::info!("Configuration mise à jour");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::reference;
    use crate::db::setup::init_db_in_memory;

    #[test]
    fn test_updated_defaults_drive_canal_list() {
        let state = AppState::from_connection(init_db_in_memory().unwrap());
        let mut config = get_config(&state).unwrap();
        config.canaux_par_defaut = vec!["Courrier".into()];
        update_config(&state, config.clone()).unwrap();

        assert_eq!(get_config(&state).unwrap(), config);
        assert_eq!(reference::list_canaux(&state).unwrap(), vec!["Courrier"]);
    }
}

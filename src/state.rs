use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

use crate::config::Settings;
use crate::db::setup::init_db;
use crate::error::AppError;

pub struct AppState {
    pub db: Mutex<Option<Connection>>,
}

impl AppState {
    /// Opens (and migrates) the database named in `settings`.
    pub fn open(settings: &Settings) -> Result<Self, AppError> {
        if let Some(parent) = Path::new(&settings.db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = init_db(&settings.db_path).map_err(AppError::from_storage)?;
        log::info!("Base de données ouverte : {}", settings.db_path);
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        AppState {
            db: Mutex::new(Some(conn)),
        }
    }
}

pub trait DbAccess {
    fn db<F, T, E>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: Into<AppError>;

    fn db_mut<F, T, E>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<T, E>,
        E: Into<AppError>;
}

impl DbAccess for AppState {
    fn db<F, T, E>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: Into<AppError>,
    {
        let guard = self
            .db
            .lock()
            .map_err(|e| AppError::StorageUnavailable(format!("Mutex poisoned: {}", e)))?;
        let conn = guard
            .as_ref()
            .ok_or_else(|| AppError::StorageUnavailable("Base de données non initialisée".into()))?;
        f(conn).map_err(Into::into)
    }

    fn db_mut<F, T, E>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<T, E>,
        E: Into<AppError>,
    {
        let mut guard = self
            .db
            .lock()
            .map_err(|e| AppError::StorageUnavailable(format!("Mutex poisoned: {}", e)))?;
        let conn = guard
            .as_mut()
            .ok_or_else(|| AppError::StorageUnavailable("Base de données non initialisée".into()))?;
        f(conn).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_state_is_storage_unavailable() {
        let state = AppState {
            db: Mutex::new(None),
        };
        let err = state.db(|_| Ok::<_, AppError>(())).unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }
}

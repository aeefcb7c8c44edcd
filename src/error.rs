use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erreur d'entrée/sortie: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erreur CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Erreur SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Erreur de sérialisation: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Champs obligatoires manquants : {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Ticket introuvable: {0}")]
    NotFound(String),

    #[error("Ticket {0} déjà clôturé ou introuvable")]
    NoopClose(String),

    #[error("Identifiant de ticket déjà attribué: {0}")]
    DuplicateId(String),

    #[error("Base de données indisponible: {0}")]
    StorageUnavailable(String),

    #[error("{0} existe déjà")]
    Conflict(String),

    #[error("Colonnes obligatoires manquantes: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Fichier vide ou sans données")]
    EmptyFile,
}

impl AppError {
    /// Conditions the request layer turns into a message for the agent
    /// instead of failing the request.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::NotFound(_)
                | AppError::NoopClose(_)
                | AppError::Conflict(_)
                | AppError::MissingColumns(_)
                | AppError::EmptyFile
        )
    }

    /// Maps connection-level SQLite failures to `StorageUnavailable`, keeps the rest.
    pub fn from_storage(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase
                | ErrorCode::SystemIoFailure,
            ) => AppError::StorageUnavailable(err.to_string()),
            _ => AppError::Sqlite(err),
        }
    }
}

/// True when the error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Process-level settings, read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: String,
}

impl Settings {
    pub const DB_PATH_VAR: &'static str = "TICKETING_DB_PATH";

    pub fn from_env() -> Self {
        let db_path = std::env::var(Self::DB_PATH_VAR)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "ticketing.db".to_string());
        Settings { db_path }
    }
}

/// Application configuration persisted in the `config` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Channels offered when the `canaux` reference table is empty.
    pub canaux_par_defaut: Vec<String>,
    pub limite_agents: u32,
    pub limite_thematiques: u32,
    /// Reject tickets whose taxonomy path is absent from the reference table.
    pub taxonomie_stricte: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            canaux_par_defaut: vec![
                "Téléphone".into(),
                "Email".into(),
                "Chat".into(),
                "InApp".into(),
            ],
            limite_agents: 10,
            limite_thematiques: 8,
            taxonomie_stricte: false,
        }
    }
}

pub fn get_config_from_db(conn: &Connection) -> Result<AppConfig, rusqlite::Error> {
    let mut stmt = conn.prepare_cached("SELECT key, value FROM config")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut config = AppConfig::default();

    for row in rows {
        let (key, value) = row?;
        match key.as_str() {
            "canaux_par_defaut" => {
                if let Ok(v) = serde_json::from_str(&value) {
                    config.canaux_par_defaut = v;
                }
            }
            "limite_agents" => config.limite_agents = value.parse().unwrap_or(10),
            "limite_thematiques" => config.limite_thematiques = value.parse().unwrap_or(8),
            "taxonomie_stricte" => {
                config.taxonomie_stricte = matches!(value.trim(), "1" | "true")
            }
            _ => {}
        }
    }

    Ok(config)
}

pub fn update_config_in_db(conn: &Connection, config: &AppConfig) -> Result<(), rusqlite::Error> {
    let pairs: Vec<(&str, String)> = vec![
        (
            "canaux_par_defaut",
            serde_json::to_string(&config.canaux_par_defaut).unwrap_or_default(),
        ),
        ("limite_agents", config.limite_agents.to_string()),
        ("limite_thematiques", config.limite_thematiques.to_string()),
        ("taxonomie_stricte", config.taxonomie_stricte.to_string()),
    ];

    let mut stmt = conn.prepare_cached(
        "INSERT OR REPLACE INTO config (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
    )?;

    for (key, value) in pairs {
        stmt.execute(rusqlite::params![key, value])?;
    }

    Ok(())
}

use chrono::NaiveDateTime;

use crate::model::Statut;
use crate::parser::deserializers::format_iso;

/// Closure stamp carried by a ticket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Closure {
    pub date_cloture: Option<String>,
    pub cloture_by: Option<String>,
}

impl Closure {
    fn stamped(agent: &str, now: &NaiveDateTime) -> Self {
        Closure {
            date_cloture: Some(format_iso(now)),
            cloture_by: Some(agent.to_string()),
        }
    }
}

/// Status and closure stamp after a save.
///
/// - an explicit close request forces `Clôturé` and restamps both fields;
/// - a closed status keeps an existing closure date, the saving agent becomes
///   `cloture_by`;
/// - an open status clears both fields.
///
/// `existing` is `None` on creation.
pub fn apply_transition(
    existing: Option<&Closure>,
    submitted: Statut,
    close_requested: bool,
    agent: &str,
    now: &NaiveDateTime,
) -> (Statut, Closure) {
    if close_requested {
        return (Statut::Cloture, Closure::stamped(agent, now));
    }
    match submitted {
        Statut::Ouvert => (Statut::Ouvert, Closure::default()),
        Statut::Cloture => {
            let date_cloture = existing
                .and_then(|c| c.date_cloture.as_deref())
                .filter(|d| !d.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format_iso(now));
            (
                Statut::Cloture,
                Closure {
                    date_cloture: Some(date_cloture),
                    cloture_by: Some(agent.to_string()),
                },
            )
        }
    }
}

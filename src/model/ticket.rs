use serde::{Deserialize, Serialize};

pub const TRAITEMENT_NORMAL: &str = "Normal";
pub const TRAITEMENT_EXCEPTIONNEL: &str = "Exceptionnel";

/// Ticket lifecycle status. Stored as its French label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statut {
    #[serde(rename = "Ouvert")]
    Ouvert,
    #[serde(rename = "Clôturé")]
    Cloture,
}

impl Statut {
    pub const OUVERT: &'static str = "Ouvert";
    pub const CLOTURE: &'static str = "Clôturé";

    pub fn label(self) -> &'static str {
        match self {
            Statut::Ouvert => Self::OUVERT,
            Statut::Cloture => Self::CLOTURE,
        }
    }

    /// `norm_key` forms of every label read as closed.
    pub const CLOSED_KEYS: [&'static str; 8] = [
        "clôturé", "cloturé", "clôture", "cloture", "clôturée", "cloturée", "clôturee", "cloturee",
    ];

    /// Accepts the stored labels and their unaccented / lowercase variants.
    pub fn from_label(s: &str) -> Option<Statut> {
        let key = crate::normalize::norm_key(s);
        if key == "ouvert" {
            Some(Statut::Ouvert)
        } else if Self::CLOSED_KEYS.contains(&key.as_str()) {
            Some(Statut::Cloture)
        } else {
            None
        }
    }

    /// SQL condition true when `column` holds a label `from_stored` reads as closed.
    pub fn closed_condition(column: &str) -> String {
        let keys: Vec<String> = Self::CLOSED_KEYS.iter().map(|k| format!("'{k}'")).collect();
        format!("norm_key({column}) IN ({})", keys.join(", "))
    }

    /// Stored labels that are not a known status read as open.
    pub fn from_stored(s: &str) -> Statut {
        Statut::from_label(s).unwrap_or(Statut::Ouvert)
    }
}

/// The six classification levels of a ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyLevels {
    pub thematique: String,
    pub famille: String,
    pub sous_famille: String,
    pub categorie: String,
    pub sous_categorie: String,
    pub action: String,
}

impl TaxonomyLevels {
    pub fn as_array(&self) -> [&str; 6] {
        [
            &self.thematique,
            &self.famille,
            &self.sous_famille,
            &self.categorie,
            &self.sous_categorie,
            &self.action,
        ]
    }
}

/// Store attributes copied onto the ticket at creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreLink {
    pub magasin: String,
    pub num_magasin: String,
    pub ville: String,
    pub bu: String,
    pub region: String,
    pub dr: String,
    pub dm: String,
}

/// Raw ticket form as submitted by the request layer.
///
/// Every field is optional; blanks are resolved by validation:
/// `traitement` defaults to `Normal`, amounts default to 0.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TicketForm {
    pub nom_prenom: Option<String>,
    pub id_client: Option<String>,
    pub num_cmd: Option<String>,
    pub canal: Option<String>,
    pub thematique: Option<String>,
    pub famille: Option<String>,
    pub sous_famille: Option<String>,
    pub categorie: Option<String>,
    pub sous_categorie: Option<String>,
    pub action: Option<String>,
    pub traitement: Option<String>,
    pub si_exceptionnel: Option<String>,
    pub code_promo: Option<String>,
    pub prix_pdts: Option<String>,
    pub mnt_commande: Option<String>,
    pub mnt_rembour: Option<String>,
    pub mnt_gestco: Option<String>,
    pub retour_magasin: Option<String>,
    pub commentaires: Option<String>,
    pub statut: Option<String>,
    pub magasin: Option<String>,
    pub num_magasin: Option<String>,
    pub ville: Option<String>,
    pub bu: Option<String>,
    pub region: Option<String>,
    pub dr: Option<String>,
    pub dm: Option<String>,
}

/// Validated, typed ticket fields ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketFields {
    pub nom_prenom: String,
    pub id_client: String,
    pub num_cmd: String,
    pub canal: String,
    pub taxonomie: TaxonomyLevels,
    pub traitement: String,
    pub si_exceptionnel: String,
    pub code_promo: String,
    pub prix_pdts: f64,
    pub mnt_commande: f64,
    pub mnt_rembour: f64,
    pub mnt_gestco: f64,
    pub retour_magasin: String,
    pub commentaires: String,
    pub statut: Statut,
    pub store: StoreLink,
}

impl TicketFields {
    /// Derived promo total, never taken from input.
    pub fn total_code_promo(&self) -> f64 {
        crate::analyzer::stats::round2(self.mnt_rembour + self.mnt_gestco)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub date_creation: String,
    pub agent: String,
    pub nom_prenom: String,
    pub id_client: String,
    pub num_cmd: String,
    pub canal: String,
    #[serde(flatten)]
    pub taxonomie: TaxonomyLevels,
    pub traitement: String,
    pub si_exceptionnel: String,
    pub code_promo: String,
    pub prix_pdts: f64,
    pub mnt_commande: f64,
    pub mnt_rembour: f64,
    pub mnt_gestco: f64,
    pub total_code_promo: f64,
    pub retour_magasin: String,
    pub commentaires: String,
    pub date_cloture: Option<String>,
    pub cloture_by: Option<String>,
    pub statut: Statut,
    #[serde(flatten)]
    pub store: StoreLink,
}

/// Row of the ticket list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub id: String,
    pub date_creation: String,
    pub agent: String,
    pub nom_prenom: String,
    pub magasin: String,
    pub thematique: String,
    pub statut: String,
    pub num_cmd: String,
    pub id_client: String,
    pub mnt_commande: f64,
    pub total_code_promo: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statut_labels() {
        assert_eq!(Statut::from_label("Clôturé"), Some(Statut::Cloture));
        assert_eq!(Statut::from_label(" cloture "), Some(Statut::Cloture));
        assert_eq!(Statut::from_label("OUVERT"), Some(Statut::Ouvert));
        assert_eq!(Statut::from_label("En pause"), None);
        assert_eq!(Statut::from_stored("En pause"), Statut::Ouvert);
        assert_eq!(Statut::Cloture.label(), "Clôturé");
        assert_eq!(Statut::from_label("CLÔTURÉE"), Some(Statut::Cloture));
        assert!(Statut::closed_condition("statut").starts_with("norm_key(statut) IN ('clôturé'"));
    }

    #[test]
    fn test_statut_serde() {
        assert_eq!(serde_json::to_string(&Statut::Cloture).unwrap(), "\"Clôturé\"");
        let s: Statut = serde_json::from_str("\"Ouvert\"").unwrap();
        assert_eq!(s, Statut::Ouvert);
    }

    #[test]
    fn test_form_deserializes_partial_json() {
        let form: TicketForm =
            serde_json::from_str(r#"{"nom_prenom": "Amine B.", "mnt_rembour": "10,50"}"#).unwrap();
        assert_eq!(form.nom_prenom.as_deref(), Some("Amine B."));
        assert_eq!(form.mnt_rembour.as_deref(), Some("10,50"));
        assert!(form.canal.is_none());
    }
}

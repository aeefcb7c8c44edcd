use crate::config::AppConfig;
use crate::error::AppError;
use crate::model::{
    Statut, StoreLink, TaxonomyEntry, TaxonomyLevels, TicketFields, TicketForm,
    TRAITEMENT_EXCEPTIONNEL, TRAITEMENT_NORMAL,
};
use crate::normalize::same_key;
use crate::parser::deserializers::parse_amount;

use super::taxonomy::contains_path;

fn text(v: &Option<String>) -> String {
    v.as_deref().unwrap_or("").trim().to_string()
}

/// Blank → 0. Negative or unparseable → `label` pushed to `errors`.
fn amount(v: &Option<String>, label: &str, errors: &mut Vec<String>) -> f64 {
    let raw = v.as_deref().unwrap_or("").trim();
    if raw.is_empty() {
        return 0.0;
    }
    match parse_amount(raw) {
        Some(n) if n >= 0.0 => n,
        _ => {
            errors.push(label.to_string());
            0.0
        }
    }
}

/// Checks a submitted form and returns its typed fields.
///
/// Every failing label is collected before returning, in form order.
pub fn validate_form(form: &TicketForm) -> Result<TicketFields, AppError> {
    let mut errors: Vec<String> = Vec::new();

    let nom_prenom = text(&form.nom_prenom);
    if nom_prenom.is_empty() {
        errors.push("Nom et Prénom client".into());
    }
    let canal = text(&form.canal);
    if canal.is_empty() {
        errors.push("Canal".into());
    }
    let statut = Statut::from_label(&text(&form.statut));
    if statut.is_none() {
        errors.push("Statut".into());
    }

    let traitement = match text(&form.traitement) {
        t if t.is_empty() => TRAITEMENT_NORMAL.to_string(),
        t => t,
    };
    let si_exceptionnel = text(&form.si_exceptionnel);
    if same_key(&traitement, TRAITEMENT_EXCEPTIONNEL) && si_exceptionnel.is_empty() {
        errors.push("Motif pour traitement exceptionnel".into());
    }

    let taxonomie = TaxonomyLevels {
        thematique: text(&form.thematique),
        famille: text(&form.famille),
        sous_famille: text(&form.sous_famille),
        categorie: text(&form.categorie),
        sous_categorie: text(&form.sous_categorie),
        action: text(&form.action),
    };
    let labels = ["Thematique", "Famille", "Sous Famille", "Categorie", "Sous Categorie", "Action"];
    for (value, label) in taxonomie.as_array().into_iter().zip(labels) {
        if value.is_empty() {
            errors.push(label.into());
        }
    }

    let prix_pdts = amount(&form.prix_pdts, "Prix produits", &mut errors);
    let mnt_commande = amount(&form.mnt_commande, "Montant commande", &mut errors);
    let mnt_rembour = amount(&form.mnt_rembour, "Montant remboursé", &mut errors);
    let mnt_gestco = amount(&form.mnt_gestco, "Montant gestion commerciale", &mut errors);

    let statut = match statut {
        Some(s) if errors.is_empty() => s,
        _ => return Err(AppError::Validation(errors)),
    };

    Ok(TicketFields {
        nom_prenom,
        id_client: text(&form.id_client),
        num_cmd: text(&form.num_cmd),
        canal,
        taxonomie,
        traitement,
        si_exceptionnel,
        code_promo: text(&form.code_promo),
        prix_pdts,
        mnt_commande,
        mnt_rembour,
        mnt_gestco,
        retour_magasin: text(&form.retour_magasin),
        commentaires: text(&form.commentaires),
        statut,
        store: StoreLink {
            magasin: text(&form.magasin),
            num_magasin: text(&form.num_magasin),
            ville: text(&form.ville),
            bu: text(&form.bu),
            region: text(&form.region),
            dr: text(&form.dr),
            dm: text(&form.dm),
        },
    })
}

/// Rejects a taxonomy path absent from the reference table when
/// `taxonomie_stricte` is set.
pub fn check_taxonomy(
    fields: &TicketFields,
    entries: &[TaxonomyEntry],
    config: &AppConfig,
) -> Result<(), AppError> {
    if config.taxonomie_stricte && !contains_path(entries, &fields.taxonomie) {
        return Err(AppError::Validation(vec!["Taxonomie inconnue".into()]));
    }
    Ok(())
}

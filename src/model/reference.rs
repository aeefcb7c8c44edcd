use serde::{Deserialize, Serialize};

/// Store reference row (`magasins`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Magasin {
    pub magasin: String,
    pub code_magasin: String,
    pub ville: String,
    pub bu: String,
    pub region: String,
    pub dr: String,
    pub dm: String,
}

/// One canonicalized row of the taxonomy table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxonomyEntry {
    pub thematique: String,
    pub famille: String,
    pub sous_famille: String,
    pub categorie: String,
    pub sous_categorie: String,
    pub action: String,
}

impl TaxonomyEntry {
    pub fn level(&self, level: TaxonomyLevel) -> &str {
        match level {
            TaxonomyLevel::Thematique => &self.thematique,
            TaxonomyLevel::Famille => &self.famille,
            TaxonomyLevel::SousFamille => &self.sous_famille,
            TaxonomyLevel::Categorie => &self.categorie,
            TaxonomyLevel::SousCategorie => &self.sous_categorie,
            TaxonomyLevel::Action => &self.action,
        }
    }

    pub fn level_mut(&mut self, level: TaxonomyLevel) -> &mut String {
        match level {
            TaxonomyLevel::Thematique => &mut self.thematique,
            TaxonomyLevel::Famille => &mut self.famille,
            TaxonomyLevel::SousFamille => &mut self.sous_famille,
            TaxonomyLevel::Categorie => &mut self.categorie,
            TaxonomyLevel::SousCategorie => &mut self.sous_categorie,
            TaxonomyLevel::Action => &mut self.action,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyLevel {
    Thematique,
    Famille,
    SousFamille,
    Categorie,
    SousCategorie,
    Action,
}

impl TaxonomyLevel {
    pub const ALL: [TaxonomyLevel; 6] = [
        TaxonomyLevel::Thematique,
        TaxonomyLevel::Famille,
        TaxonomyLevel::SousFamille,
        TaxonomyLevel::Categorie,
        TaxonomyLevel::SousCategorie,
        TaxonomyLevel::Action,
    ];

    /// Canonical column header, as written in the admin spreadsheets.
    pub fn header(self) -> &'static str {
        match self {
            TaxonomyLevel::Thematique => "Thematique",
            TaxonomyLevel::Famille => "Famille",
            TaxonomyLevel::SousFamille => "Sous Famille",
            TaxonomyLevel::Categorie => "Categorie",
            TaxonomyLevel::SousCategorie => "Sous Categorie",
            TaxonomyLevel::Action => "Action",
        }
    }
}

/// Partial taxonomy selection sent by the cascading form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaxonomyPath {
    pub thematique: Option<String>,
    pub famille: Option<String>,
    pub sous_famille: Option<String>,
    pub categorie: Option<String>,
    pub sous_categorie: Option<String>,
}

impl TaxonomyPath {
    pub fn from_levels(levels: &[&str]) -> Self {
        let get = |i: usize| levels.get(i).map(|s| s.to_string());
        TaxonomyPath {
            thematique: get(0),
            famille: get(1),
            sous_famille: get(2),
            categorie: get(3),
            sous_categorie: get(4),
        }
    }

    /// Leading non-blank levels; stops at the first blank one.
    pub fn specified(&self) -> Vec<&str> {
        [
            &self.thematique,
            &self.famille,
            &self.sous_famille,
            &self.categorie,
            &self.sous_categorie,
        ]
        .into_iter()
        .map(|v| v.as_deref().unwrap_or("").trim())
        .take_while(|v| !v.is_empty())
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub username: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewAgent {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
}

use chrono::NaiveDate;
use serde::Deserialize;

use crate::normalize::non_blank;
use crate::parser::deserializers::{parse_amount, parse_date_flexible};

/// Analytics filters as received from the request layer. Every value is a raw
/// string; [`ParsedFilters::parse`] drops the malformed ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyticsFilters {
    pub agent: Option<String>,
    pub canal: Option<String>,
    pub thematique: Option<String>,
    pub action: Option<String>,
    pub magasin: Option<String>,
    pub bu: Option<String>,
    pub promo_min: Option<String>,
    pub promo_max: Option<String>,
    pub date_min: Option<String>,
    pub date_max: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFilters {
    pub agent: Option<String>,
    pub canal: Option<String>,
    pub thematique: Option<String>,
    pub action: Option<String>,
    pub magasin: Option<String>,
    pub bu: Option<String>,
    pub promo_min: Option<f64>,
    pub promo_max: Option<f64>,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
}

impl ParsedFilters {
    pub fn parse(raw: &AnalyticsFilters) -> Self {
        let text = |v: &Option<String>| v.as_deref().and_then(non_blank);
        let amount = |v: &Option<String>| v.as_deref().and_then(parse_amount);
        let date = |v: &Option<String>| v.as_deref().and_then(parse_date_flexible);
        ParsedFilters {
            agent: text(&raw.agent),
            canal: text(&raw.canal),
            thematique: text(&raw.thematique),
            action: text(&raw.action),
            magasin: text(&raw.magasin),
            bu: text(&raw.bu),
            promo_min: amount(&raw.promo_min),
            promo_max: amount(&raw.promo_max),
            date_min: date(&raw.date_min),
            date_max: date(&raw.date_max),
        }
    }
}

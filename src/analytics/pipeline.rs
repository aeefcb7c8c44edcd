//! Pure construction of analytics pipelines.
//!
//! A [`Pipeline`] is an ordered list of named stages, built from a dimension
//! and a filter set without touching the store. Filters come first, then
//! business-unit resolution and its post-filter, then grouping, sort and limit.
//! [`super::compile`] turns it into SQL.

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::normalize::norm_key;

use super::filters::ParsedFilters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    ByBu,
    ByAgent,
    ByCanal,
    ByThematique,
    ActionsAmount,
    Count,
}

/// Row filters applied before any grouping.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Normalized agent name.
    AgentEq(String),
    CanalEq(String),
    ThematiqueEq(String),
    ActionEq(String),
    /// Normalized store name.
    MagasinEq(String),
    PromoMin(f64),
    PromoMax(f64),
    /// `YYYY-MM-DD 00:00:00`
    CreatedFrom(String),
    /// `YYYY-MM-DD 23:59:59`
    CreatedUntil(String),
}

impl Predicate {
    fn name(&self) -> &'static str {
        match self {
            Predicate::AgentEq(_) => "match_agent",
            Predicate::CanalEq(_) => "match_canal",
            Predicate::ThematiqueEq(_) => "match_thematique",
            Predicate::ActionEq(_) => "match_action",
            Predicate::MagasinEq(_) => "match_magasin",
            Predicate::PromoMin(_) => "match_promo_min",
            Predicate::PromoMax(_) => "match_promo_max",
            Predicate::CreatedFrom(_) => "match_date_min",
            Predicate::CreatedUntil(_) => "match_date_max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Bu,
    Agent,
    Canal,
    Thematique,
    Action,
}

impl GroupKey {
    /// Bucket for blank values. The casing differs per dimension.
    pub fn default_label(self) -> &'static str {
        match self {
            GroupKey::Bu | GroupKey::Thematique => "Autres",
            GroupKey::Agent | GroupKey::Canal | GroupKey::Action => "AUTRES",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Count,
    PromoSum,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Predicate),
    /// Adds `bu_final`: store BU, else ticket BU, else `Autres`.
    ResolveBusinessUnit,
    /// Normalized BU, compared against `bu_final`.
    MatchBusinessUnit(String),
    Group { key: GroupKey, measure: Measure },
    SortDesc,
    Limit(u32),
    Count,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(p) => p.name(),
            Stage::ResolveBusinessUnit => "resolve_bu",
            Stage::MatchBusinessUnit(_) => "match_bu",
            Stage::Group { key, .. } => match key {
                GroupKey::Bu => "group_bu",
                GroupKey::Agent => "group_agent",
                GroupKey::Canal => "group_canal",
                GroupKey::Thematique => "group_thematique",
                GroupKey::Action => "group_action",
            },
            Stage::SortDesc => "sort_desc",
            Stage::Limit(_) => "limit",
            Stage::Count => "count",
        }
    }
}

/// Top-N sizes of the truncated dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub agents: u32,
    pub thematiques: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            agents: 10,
            thematiques: 8,
        }
    }
}

impl From<&AppConfig> for Limits {
    fn from(config: &AppConfig) -> Self {
        Limits {
            agents: config.limite_agents,
            thematiques: config.limite_thematiques,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    dimension: Dimension,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }
}

fn filter_stages(filters: &ParsedFilters) -> Vec<Stage> {
    let mut predicates = Vec::new();
    if let Some(agent) = &filters.agent {
        predicates.push(Predicate::AgentEq(norm_key(agent)));
    }
    if let Some(canal) = &filters.canal {
        predicates.push(Predicate::CanalEq(canal.clone()));
    }
    if let Some(thematique) = &filters.thematique {
        predicates.push(Predicate::ThematiqueEq(thematique.clone()));
    }
    if let Some(action) = &filters.action {
        predicates.push(Predicate::ActionEq(action.clone()));
    }
    if let Some(magasin) = &filters.magasin {
        predicates.push(Predicate::MagasinEq(norm_key(magasin)));
    }
    if let Some(min) = filters.promo_min {
        predicates.push(Predicate::PromoMin(min));
    }
    if let Some(max) = filters.promo_max {
        predicates.push(Predicate::PromoMax(max));
    }
    if let Some(d) = filters.date_min {
        predicates.push(Predicate::CreatedFrom(format!("{} 00:00:00", d.format("%Y-%m-%d"))));
    }
    if let Some(d) = filters.date_max {
        predicates.push(Predicate::CreatedUntil(format!("{} 23:59:59", d.format("%Y-%m-%d"))));
    }
    predicates.into_iter().map(Stage::Match).collect()
}

/// Builds the stage list for `dimension` under `filters`.
pub fn build_pipeline(dimension: Dimension, filters: &ParsedFilters, limits: &Limits) -> Pipeline {
    let mut stages = filter_stages(filters);

    if dimension == Dimension::ByBu || filters.bu.is_some() {
        stages.push(Stage::ResolveBusinessUnit);
    }
    if let Some(bu) = &filters.bu {
        stages.push(Stage::MatchBusinessUnit(norm_key(bu)));
    }

    let grouping = match dimension {
        Dimension::ByBu => Some((GroupKey::Bu, Measure::Count, None)),
        Dimension::ByAgent => Some((GroupKey::Agent, Measure::Count, Some(limits.agents))),
        Dimension::ByCanal => Some((GroupKey::Canal, Measure::Count, None)),
        Dimension::ByThematique => {
            Some((GroupKey::Thematique, Measure::Count, Some(limits.thematiques)))
        }
        Dimension::ActionsAmount => Some((GroupKey::Action, Measure::PromoSum, None)),
        Dimension::Count => None,
    };

    match grouping {
        Some((key, measure, limit)) => {
            stages.push(Stage::Group { key, measure });
            stages.push(Stage::SortDesc);
            if let Some(n) = limit {
                stages.push(Stage::Limit(n));
            }
        }
        None => stages.push(Stage::Count),
    }

    Pipeline { dimension, stages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_by_bu_without_filters() {
        let p = build_pipeline(Dimension::ByBu, &ParsedFilters::default(), &Limits::default());
        assert_eq!(p.stage_names(), vec!["resolve_bu", "group_bu", "sort_desc"]);
    }

    #[test]
    fn test_filters_precede_bu_resolution_and_post_filter() {
        let filters = ParsedFilters {
            agent: Some("Sara".into()),
            bu: Some(" NORD ".into()),
            date_max: NaiveDate::from_ymd_opt(2024, 3, 31),
            ..Default::default()
        };
        let p = build_pipeline(Dimension::ByCanal, &filters, &Limits::default());
        assert_eq!(
            p.stage_names(),
            vec![
                "match_agent",
                "match_date_max",
                "resolve_bu",
                "match_bu",
                "group_canal",
                "sort_desc"
            ]
        );
        assert_eq!(p.stages()[0], Stage::Match(Predicate::AgentEq("sara".into())));
        assert_eq!(
            p.stages()[1],
            Stage::Match(Predicate::CreatedUntil("2024-03-31 23:59:59".into()))
        );
        assert_eq!(p.stages()[3], Stage::MatchBusinessUnit("nord".into()));
    }

    #[test]
    fn test_truncated_dimensions_use_limits() {
        let limits = Limits {
            agents: 5,
            thematiques: 3,
        };
        let agent = build_pipeline(Dimension::ByAgent, &ParsedFilters::default(), &limits);
        assert_eq!(agent.stages().last(), Some(&Stage::Limit(5)));
        let them = build_pipeline(Dimension::ByThematique, &ParsedFilters::default(), &limits);
        assert_eq!(them.stages().last(), Some(&Stage::Limit(3)));
        let canal = build_pipeline(Dimension::ByCanal, &ParsedFilters::default(), &limits);
        assert_eq!(canal.stages().last(), Some(&Stage::SortDesc));
    }

    #[test]
    fn test_count_pipeline() {
        let filters = ParsedFilters {
            promo_min: Some(10.0),
            ..Default::default()
        };
        let p = build_pipeline(Dimension::Count, &filters, &Limits::default());
        assert_eq!(p.stage_names(), vec!["match_promo_min", "count"]);
        assert_eq!(p.dimension(), Dimension::Count);
    }

    #[test]
    fn test_actions_amount_sums_promo() {
        let p = build_pipeline(
            Dimension::ActionsAmount,
            &ParsedFilters::default(),
            &Limits::default(),
        );
        assert_eq!(
            p.stages()[0],
            Stage::Group {
                key: GroupKey::Action,
                measure: Measure::PromoSum
            }
        );
    }

    #[test]
    fn test_limits_from_config() {
        let limits = Limits::from(&AppConfig::default());
        assert_eq!(limits, Limits::default());
    }
}

use rusqlite::types::Value;

use super::pipeline::{GroupKey, Measure, Pipeline, Predicate, Stage};

/// Parameterized SQL for a pipeline. Grouped pipelines yield `(label, valeur)`
/// rows, count pipelines a single integer.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

fn predicate_sql(predicate: &Predicate, params: &mut Vec<Value>) -> String {
    let (expr, value) = match predicate {
        Predicate::AgentEq(v) => ("norm_key(agent) =", Value::Text(v.clone())),
        Predicate::CanalEq(v) => ("canal =", Value::Text(v.clone())),
        Predicate::ThematiqueEq(v) => ("thematique =", Value::Text(v.clone())),
        Predicate::ActionEq(v) => ("action =", Value::Text(v.clone())),
        Predicate::MagasinEq(v) => ("norm_key(magasin) =", Value::Text(v.clone())),
        Predicate::PromoMin(v) => ("montant(total_code_promo) >=", Value::Real(*v)),
        Predicate::PromoMax(v) => ("montant(total_code_promo) <=", Value::Real(*v)),
        Predicate::CreatedFrom(v) => ("date_creation >=", Value::Text(v.clone())),
        Predicate::CreatedUntil(v) => ("date_creation <=", Value::Text(v.clone())),
    };
    params.push(value);
    format!("{} ?{}", expr, params.len())
}

fn label_sql(key: GroupKey) -> String {
    let blank = key.default_label();
    match key {
        GroupKey::Bu => "bu_final".to_string(),
        GroupKey::Agent => format!(
            "CASE WHEN upper_trim(agent) = '' THEN '{blank}' ELSE upper_trim(agent) END"
        ),
        GroupKey::Canal => {
            format!("CASE WHEN TRIM(canal) = '' THEN '{blank}' ELSE TRIM(canal) END")
        }
        GroupKey::Thematique => {
            format!("CASE WHEN TRIM(thematique) = '' THEN '{blank}' ELSE TRIM(thematique) END")
        }
        GroupKey::Action => {
            format!("CASE WHEN TRIM(action) = '' THEN '{blank}' ELSE TRIM(action) END")
        }
    }
}

/// One CTE per filtering/grouping stage; sort and limit land on the final SELECT.
pub fn compile(pipeline: &Pipeline) -> CompiledQuery {
    let mut params: Vec<Value> = Vec::new();
    let mut ctes: Vec<String> = vec!["s0 AS (SELECT * FROM tickets)".to_string()];
    let mut prev = "s0".to_string();
    let mut order_by = String::new();
    let mut limit = String::new();
    let mut counting = false;

    for (i, stage) in pipeline.stages().iter().enumerate() {
        let name = format!("s{}", i + 1);
        match stage {
            Stage::Match(p) => {
                let cond = predicate_sql(p, &mut params);
                ctes.push(format!("{name} AS (SELECT * FROM {prev} WHERE {cond})"));
            }
            Stage::ResolveBusinessUnit => {
                ctes.push(format!(
                    "{name}_brut AS (SELECT p.*, TRIM(COALESCE(
                        (SELECT m.bu FROM magasins m
                         WHERE norm_key(m.magasin) = norm_key(p.magasin)
                         ORDER BY m.rowid LIMIT 1),
                        p.bu, '')) AS _bu_brut
                     FROM {prev} p)"
                ));
                ctes.push(format!(
                    "{name} AS (SELECT *, CASE WHEN _bu_brut = '' THEN 'Autres' ELSE _bu_brut END AS bu_final
                     FROM {name}_brut)"
                ));
            }
            Stage::MatchBusinessUnit(bu) => {
                params.push(Value::Text(bu.clone()));
                ctes.push(format!(
                    "{name} AS (SELECT * FROM {prev} WHERE norm_key(bu_final) = ?{})",
                    params.len()
                ));
            }
            Stage::Group { key, measure } => {
                let value = match measure {
                    Measure::Count => "COUNT(*)",
                    Measure::PromoSum => "COALESCE(SUM(montant(total_code_promo)), 0)",
                };
                ctes.push(format!(
                    "{name} AS (SELECT {} AS label, {value} AS valeur FROM {prev} GROUP BY 1)",
                    label_sql(*key)
                ));
            }
            Stage::SortDesc => {
                order_by = " ORDER BY valeur DESC, label ASC".to_string();
                continue;
            }
            Stage::Limit(n) => {
                params.push(Value::Integer(i64::from(*n)));
                limit = format!(" LIMIT ?{}", params.len());
                continue;
            }
            Stage::Count => {
                counting = true;
                continue;
            }
        }
        prev = name;
    }

    let select = if counting {
        format!("SELECT COUNT(*) FROM {prev}")
    } else {
        format!("SELECT label, valeur FROM {prev}{order_by}{limit}")
    };

    CompiledQuery {
        sql: format!("WITH {} {}", ctes.join(",\n"), select),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::filters::ParsedFilters;
    use crate::analytics::pipeline::{build_pipeline, Dimension, Limits};

    #[test]
    fn test_params_follow_stage_order() {
        let filters = ParsedFilters {
            magasin: Some("Casa Anfa".into()),
            promo_min: Some(10.0),
            bu: Some("Nord".into()),
            ..Default::default()
        };
        let q = compile(&build_pipeline(Dimension::ByAgent, &filters, &Limits::default()));
        assert_eq!(
            q.params,
            vec![
                Value::Text("casa anfa".into()),
                Value::Real(10.0),
                Value::Text("nord".into()),
                Value::Integer(10),
            ]
        );
        assert!(q.sql.contains("norm_key(magasin) = ?1"));
        assert!(q.sql.contains("montant(total_code_promo) >= ?2"));
        assert!(q.sql.contains("norm_key(bu_final) = ?3"));
        assert!(q.sql.ends_with("ORDER BY valeur DESC, label ASC LIMIT ?4"));
    }

    #[test]
    fn test_count_query_shape() {
        let q = compile(&build_pipeline(
            Dimension::Count,
            &ParsedFilters::default(),
            &Limits::default(),
        ));
        assert!(q.params.is_empty());
        assert!(q.sql.ends_with("SELECT COUNT(*) FROM s0"));
    }

    #[test]
    fn test_bu_resolution_adds_two_ctes() {
        let q = compile(&build_pipeline(
            Dimension::ByBu,
            &ParsedFilters::default(),
            &Limits::default(),
        ));
        assert!(q.sql.contains("s1_brut AS"));
        assert!(q.sql.contains("AS bu_final"));
        assert!(q.sql.contains("SELECT label, valeur FROM s2 ORDER BY"));
    }
}

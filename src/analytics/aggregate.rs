use rusqlite::{params_from_iter, Connection};
use serde::Serialize;

use crate::analyzer::stats::{percentages, round2};

use super::compile::compile;
use super::filters::{AnalyticsFilters, ParsedFilters};
use super::pipeline::{build_pipeline, Dimension, Limits};

/// Count-based breakdown (`by_bu`, `by_agent`, `by_canal`, `by_thematique`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionBreakdown {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
    pub percentages: Vec<f64>,
    pub total: i64,
}

/// Promo amounts summed per action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionAmounts {
    pub actions: Vec<String>,
    pub montants: Vec<f64>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregateResult {
    Breakdown(DimensionBreakdown),
    Amounts(ActionAmounts),
    Total { total: i64 },
}

/// Runs the pipeline for `dimension` under `filters`.
pub fn aggregate(
    conn: &Connection,
    dimension: Dimension,
    filters: &AnalyticsFilters,
    limits: &Limits,
) -> Result<AggregateResult, rusqlite::Error> {
    let parsed = ParsedFilters::parse(filters);
    let pipeline = build_pipeline(dimension, &parsed, limits);
    let query = compile(&pipeline);
    log::debug!("Agrégation {:?} : {}", pipeline.dimension(), query.sql);

    if pipeline.dimension() == Dimension::Count {
        let total = conn.query_row(&query.sql, params_from_iter(query.params.iter()), |row| {
            row.get::<_, i64>(0)
        })?;
        return Ok(AggregateResult::Total { total });
    }

    let mut stmt = conn.prepare(&query.sql)?;

    if pipeline.dimension() == Dimension::ActionsAmount {
        let rows: Vec<(String, f64)> = stmt
            .query_map(params_from_iter(query.params.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let total = round2(rows.iter().map(|(_, v)| v).sum());
        let (actions, montants) = rows.into_iter().map(|(a, v)| (a, round2(v))).unzip();
        return Ok(AggregateResult::Amounts(ActionAmounts {
            actions,
            montants,
            total,
        }));
    }

    let rows: Vec<(String, i64)> = stmt
        .query_map(params_from_iter(query.params.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    let (labels, values): (Vec<String>, Vec<i64>) = rows.into_iter().unzip();

    Ok(AggregateResult::Breakdown(DimensionBreakdown {
        percentages: percentages(&values),
        total: values.iter().sum(),
        labels,
        values,
    }))
}

/// Post-filter ticket count, with the same BU resolution as the breakdowns.
pub fn total_count(conn: &Connection, filters: &AnalyticsFilters) -> Result<i64, rusqlite::Error> {
    match aggregate(conn, Dimension::Count, filters, &Limits::default())? {
        AggregateResult::Total { total } => Ok(total),
        _ => Ok(0),
    }
}

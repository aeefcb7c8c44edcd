use crate::analytics::{self, AggregateResult, AnalyticsFilters, Dimension, FilterOptions, Limits};
use crate::config::get_config_from_db;
use crate::error::AppError;
use crate::state::{AppState, DbAccess};

pub fn aggregate(
    state: &AppState,
    dimension: Dimension,
    filters: AnalyticsFilters,
) -> Result<AggregateResult, AppError> {
    state.db(|conn| {
        let limits = Limits::from(&get_config_from_db(conn)?);
        analytics::aggregate(conn, dimension, &filters, &limits)
    })
}

pub fn filter_options(state: &AppState) -> Result<FilterOptions, AppError> {
    state.db(analytics::filter_options)
}

pub fn total_count(state: &AppState, filters: AnalyticsFilters) -> Result<i64, AppError> {
    state.db(|conn| analytics::total_count(conn, &filters))
}

use rusqlite::types::Value;
use serde::Serialize;

/// One row of a legacy ticket export, ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyTicket {
    /// Canonical id (`"547.0"` → `"547"`).
    pub id: String,
    /// ISO creation date (`%Y-%m-%d %H:%M:%S`).
    pub date_creation: String,
    /// Values of [`crate::parser::columns::LEGACY_COLUMNS`], in order.
    /// Amounts that are not plain numbers are kept as text.
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvImportResult {
    pub imported: usize,
    pub duplicates: usize,
    pub skipped_rows: usize,
    pub warnings: Vec<ParseWarning>,
    pub detected_columns: Vec<String>,
    pub missing_optional_columns: Vec<String>,
    pub parse_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

use std::collections::HashSet;
use std::io::Read;
use std::time::Instant;

use rusqlite::types::Value;

use crate::analyzer::taxonomy::normalize_entry;
use crate::error::AppError;
use crate::model::{TaxonomyEntry, TaxonomyLevel};
use crate::parser::columns::{
    detect_delimiter, validate_ticket_columns, ColumnMap, AMOUNT_COLUMNS, LEGACY_COLUMNS,
    NULLABLE_COLUMNS,
};
use crate::parser::deserializers::{canonical_id, format_iso, parse_datetime_flexible};
use crate::parser::types::{LegacyTicket, ParseWarning};

/// Values that legacy exports use to mean "nothing".
const NULLY: &[&str] = &["", "None", "none", "nan", "NaN", "_", "-"];

/// Output of [`parse_tickets_csv_reader`].
#[derive(Debug)]
pub struct TicketsParseOutput {
    pub tickets: Vec<LegacyTicket>,
    pub warnings: Vec<ParseWarning>,
    pub total_rows_processed: usize,
    pub skipped_rows: usize,
    pub detected_columns: Vec<String>,
    pub missing_optional_columns: Vec<String>,
    pub parse_duration_ms: u64,
}

/// Output of [`parse_taxonomy_csv_reader`].
#[derive(Debug)]
pub struct TaxonomyParseOutput {
    pub entries: Vec<TaxonomyEntry>,
    pub warnings: Vec<ParseWarning>,
    pub total_rows_processed: usize,
    pub skipped_rows: usize,
    pub detected_columns: Vec<String>,
    /// Canonical headers absent from the file (their values stay empty).
    pub missing_levels: Vec<String>,
}

/// Reads the whole input, drops the UTF-8 BOM and builds a reader with the
/// detected delimiter.
fn open_csv<R: Read>(mut reader: R) -> Result<csv::Reader<std::io::Cursor<Vec<u8>>>, AppError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    if buf.starts_with(b"\xEF\xBB\xBF") {
        buf.drain(..3);
    }
    if buf.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::EmptyFile);
    }

    let header_end = buf.iter().position(|&b| b == b'\n').unwrap_or(buf.len());
    let delimiter = detect_delimiter(&String::from_utf8_lossy(&buf[..header_end]));

    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .double_quote(true)
        .quoting(true)
        .from_reader(std::io::Cursor::new(buf)))
}

/// Parse a legacy ticket export from `path`.
/// `progress_cb(rows_processed, tickets_accepted)` is called every 500 rows.
pub fn parse_tickets_csv(
    path: &str,
    progress_cb: impl Fn(usize, usize),
) -> Result<TicketsParseOutput, AppError> {
    let file = std::fs::File::open(path)?;
    parse_tickets_csv_reader(std::io::BufReader::new(file), progress_cb)
}

pub fn parse_tickets_csv_reader<R: Read>(
    reader: R,
    progress_cb: impl Fn(usize, usize),
) -> Result<TicketsParseOutput, AppError> {
    let start = Instant::now();
    let mut rdr = open_csv(reader)?;

    // Phase 1: validate columns
    let headers = rdr.headers()?.clone();
    let col_map = ColumnMap::from_headers(&headers);
    let col_validation = validate_ticket_columns(&col_map)?;

    // Phase 2: parse and normalise records
    let mut tickets: Vec<LegacyTicket> = Vec::new();
    let mut warnings: Vec<ParseWarning> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut skipped = 0usize;
    let mut row_idx = 0usize;

    for result in rdr.records() {
        row_idx += 1;
        if row_idx % 500 == 0 {
            progress_cb(row_idx, tickets.len());
        }

        let outcome = result
            .map_err(|e| e.to_string())
            .and_then(|record| normalize_ticket(&col_map, &record));
        match outcome {
            Ok(ticket) if !seen.insert(ticket.id.clone()) => {
                warnings.push(ParseWarning {
                    line: row_idx + 1,
                    message: format!("Identifiant {} en double dans le fichier", ticket.id),
                });
                skipped += 1;
            }
            Ok(ticket) => tickets.push(ticket),
            Err(msg) => {
                warnings.push(ParseWarning {
                    line: row_idx + 1, // +1 for the header row
                    message: msg,
                });
                skipped += 1;
            }
        }
    }

    if row_idx == 0 {
        return Err(AppError::EmptyFile);
    }

    Ok(TicketsParseOutput {
        tickets,
        warnings,
        total_rows_processed: row_idx,
        skipped_rows: skipped,
        detected_columns: col_validation.present,
        missing_optional_columns: col_validation.missing_optional,
        parse_duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn is_nully(s: &str) -> bool {
    NULLY.contains(&s.trim())
}

/// Plain numbers become REAL, anything else is kept verbatim so `montant()`
/// can read comma decimals later.
fn amount_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if is_nully(trimmed) {
        return Value::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Value::Real(v),
        _ => Value::Text(trimmed.to_string()),
    }
}

fn normalize_ticket(col_map: &ColumnMap, record: &csv::StringRecord) -> Result<LegacyTicket, String> {
    // ID (required)
    let raw_id = col_map.get(record, "id").unwrap_or("").trim();
    if is_nully(raw_id) {
        return Err("Identifiant manquant".to_string());
    }
    let id = canonical_id(raw_id);

    // Date de création (required)
    let raw_date = col_map.get(record, "date_creation").unwrap_or("");
    let date_creation = parse_datetime_flexible(raw_date)
        .map(|dt| format_iso(&dt))
        .ok_or_else(|| format!("Date de création invalide: {:?}", raw_date))?;

    let values = LEGACY_COLUMNS
        .iter()
        .map(|&col| {
            let raw = col_map.get(record, col).unwrap_or("");
            if AMOUNT_COLUMNS.contains(&col) {
                amount_value(raw)
            } else if is_nully(raw) {
                if NULLABLE_COLUMNS.contains(&col) {
                    Value::Null
                } else {
                    Value::Text(String::new())
                }
            } else if col == "date_cloture" {
                let iso = parse_datetime_flexible(raw).map(|dt| format_iso(&dt));
                Value::Text(iso.unwrap_or_else(|| raw.trim().to_string()))
            } else {
                Value::Text(raw.trim().to_string())
            }
        })
        .collect();

    Ok(LegacyTicket {
        id,
        date_creation,
        values,
    })
}

/// Parse a taxonomy spreadsheet export (`;` or `,` separated).
pub fn parse_taxonomy_csv(path: &str) -> Result<TaxonomyParseOutput, AppError> {
    let file = std::fs::File::open(path)?;
    parse_taxonomy_csv_reader(std::io::BufReader::new(file))
}

pub fn parse_taxonomy_csv_reader<R: Read>(reader: R) -> Result<TaxonomyParseOutput, AppError> {
    let mut rdr = open_csv(reader)?;

    let headers = rdr.headers()?.clone();
    let col_map = ColumnMap::from_headers(&headers);
    let indices = col_map.taxonomy_indices();
    if !indices.iter().any(|(l, _)| *l == TaxonomyLevel::Thematique) {
        return Err(AppError::MissingColumns(vec![TaxonomyLevel::Thematique
            .header()
            .to_string()]));
    }
    let missing_levels = TaxonomyLevel::ALL
        .iter()
        .filter(|level| !indices.iter().any(|(l, _)| l == *level))
        .map(|level| level.header().to_string())
        .collect();

    let mut entries = Vec::new();
    let mut warnings = Vec::new();
    let mut skipped = 0usize;
    let mut row_idx = 0usize;

    for result in rdr.records() {
        row_idx += 1;
        let record = match result {
            Ok(r) => r,
            Err(err) => {
                warnings.push(ParseWarning {
                    line: row_idx + 1,
                    message: err.to_string(),
                });
                skipped += 1;
                continue;
            }
        };

        let mut entry = TaxonomyEntry::default();
        for (level, i) in &indices {
            *entry.level_mut(*level) = record.get(*i).unwrap_or("").to_string();
        }
        let entry = normalize_entry(&entry);
        if entry.thematique.is_empty() {
            warnings.push(ParseWarning {
                line: row_idx + 1,
                message: "Thematique vide, ligne ignorée".to_string(),
            });
            skipped += 1;
            continue;
        }
        entries.push(entry);
    }

    if row_idx == 0 {
        return Err(AppError::EmptyFile);
    }

    Ok(TaxonomyParseOutput {
        entries,
        warnings,
        total_rows_processed: row_idx,
        skipped_rows: skipped,
        detected_columns: col_map.all_headers().to_vec(),
        missing_levels,
    })
}

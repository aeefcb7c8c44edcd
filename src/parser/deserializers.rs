use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ValueRef;

/// Storage format of `date_creation` / `date_cloture`.
pub const ISO_DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    ISO_DT_FMT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Values that legacy exports use to mean "nothing".
const NULLY: &[&str] = &["", "None", "none", "nan", "NaN", "_", "-"];

fn is_nully(s: &str) -> bool {
    NULLY.contains(&s.trim())
}

/// Parse a monetary amount written with either `.` or `,` as decimal separator.
/// Returns None for blank or unparseable input.
pub fn parse_amount(s: &str) -> Option<f64> {
    if is_nully(s) {
        return None;
    }
    s.trim().replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Promo amount of a stored value: numbers as-is, text through `parse_amount`,
/// anything else 0.
pub fn amount_from_ref(value: ValueRef<'_>) -> f64 {
    match value {
        ValueRef::Integer(i) => i as f64,
        ValueRef::Real(f) => f,
        ValueRef::Text(bytes) => parse_amount(&String::from_utf8_lossy(bytes)).unwrap_or(0.0),
        ValueRef::Null | ValueRef::Blob(_) => 0.0,
    }
}

/// `"547"`, `"547.0"`, `" 547 "` → `Some(547)`; non-numeric or outside the
/// `i64` range → None.
pub fn numeric_id(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .map(f64::trunc)
        .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
        .map(|f| f as i64)
}

/// Canonical stored form of a ticket id: the decimal integer when the input is
/// numeric, the trimmed input otherwise.
pub fn canonical_id(s: &str) -> String {
    match numeric_id(s) {
        Some(n) => n.to_string(),
        None => s.trim().to_string(),
    }
}

/// Both representations an id lookup must match (raw trimmed and canonical).
pub fn id_candidates(s: &str) -> (String, String) {
    (s.trim().to_string(), canonical_id(s))
}

/// Parse a creation date from the app's ISO form or the legacy French form.
pub fn parse_datetime_flexible(s: &str) -> Option<NaiveDateTime> {
    if is_nully(s) {
        return None;
    }
    let trimmed = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    parse_date_flexible(trimmed).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Calendar date of a filter input; datetimes keep only their date part.
pub fn parse_date_flexible(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(d);
        }
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.date())
}

pub fn format_iso(dt: &NaiveDateTime) -> String {
    dt.format(ISO_DT_FMT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12,50"), Some(12.5));
        assert_eq!(parse_amount(" 7.25 "), Some(7.25));
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("douze"), None);
    }

    #[test]
    fn test_amount_from_ref() {
        assert_eq!(amount_from_ref(ValueRef::Text(b"12,50")), 12.5);
        assert_eq!(amount_from_ref(ValueRef::Integer(3)), 3.0);
        assert_eq!(amount_from_ref(ValueRef::Null), 0.0);
    }

    #[test]
    fn test_numeric_id() {
        assert_eq!(numeric_id("547"), Some(547));
        assert_eq!(numeric_id("547.0"), Some(547));
        assert_eq!(numeric_id(" 12 "), Some(12));
        assert_eq!(numeric_id("T-12"), None);
    }

    #[test]
    fn test_canonical_id() {
        assert_eq!(canonical_id("547.0"), "547");
        assert_eq!(canonical_id(" abc "), "abc");
        assert_eq!(numeric_id("99999999999999999999"), None);
        assert_eq!(canonical_id("99999999999999999999"), "99999999999999999999");
        assert_eq!(numeric_id("1e25"), None);
        assert_eq!(id_candidates(" 0042 "), ("0042".to_string(), "42".to_string()));
    }

    #[test]
    fn test_parse_datetime_flexible() {
        let iso = parse_datetime_flexible("2025-03-01 14:05:00").unwrap();
        assert_eq!(format_iso(&iso), "2025-03-01 14:05:00");
        let fr = parse_datetime_flexible("01/03/2025 14:05").unwrap();
        assert_eq!(iso, fr);
        let day = parse_datetime_flexible("2025-03-01").unwrap();
        assert_eq!(format_iso(&day), "2025-03-01 00:00:00");
        assert!(parse_datetime_flexible("nan").is_none());
        assert!(parse_datetime_flexible("hier").is_none());
    }

    #[test]
    fn test_parse_date_flexible() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(parse_date_flexible("2025-03-01"), Some(d));
        assert_eq!(parse_date_flexible("01/03/2025"), Some(d));
        assert_eq!(parse_date_flexible("2025-03-01T10:00:00"), Some(d));
        assert_eq!(parse_date_flexible("03-2025"), None);
    }
}

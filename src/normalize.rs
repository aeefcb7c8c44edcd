//! Text normalization shared by the taxonomy resolver, store lookups and
//! the SQL helper functions.

use std::sync::LazyLock;

use caseless::default_case_fold_str;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN: invalid pattern"));

/// NFKC + trim. Stored form of reference values.
pub fn canon_value(s: &str) -> String {
    s.nfkc().collect::<String>().trim().to_string()
}

/// NFKC + trim + full Unicode case fold. Comparison key for case-insensitive
/// matching (`"Straße"` and `"STRASSE"` share a key).
pub fn norm_key(s: &str) -> String {
    default_case_fold_str(&canon_value(s))
}

pub fn same_key(a: &str, b: &str) -> bool {
    norm_key(a) == norm_key(b)
}

/// Accent-stripped, whitespace-collapsed, lowercased header name.
/// `"Sous  Catégorie "` → `"sous categorie"`.
pub fn header_slug(s: &str) -> String {
    let ascii: String = s.nfkd().filter(char::is_ascii).collect();
    WHITESPACE_RUN
        .replace_all(ascii.trim(), " ")
        .to_lowercase()
}

/// Trimmed value, `None` when blank.
pub fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_key_folds_case_and_width() {
        assert_eq!(norm_key("  Livraison "), "livraison");
        // U+FF21 FULLWIDTH LATIN CAPITAL LETTER A
        assert_eq!(norm_key("\u{FF21}ppel"), "appel");
        assert!(same_key("RETOUR Produit", "retour produit"));
        assert!(!same_key("Retour", "Retours"));
    }

    #[test]
    fn test_norm_key_full_case_fold() {
        assert!(same_key("Straße", "STRASSE"));
        assert!(same_key("ΟΔΟΣ", "οδος"));
        // U+FB01 LATIN SMALL LIGATURE FI
        assert!(same_key("\u{FB01}nition", "FINITION"));
    }

    #[test]
    fn test_norm_key_composes_accents() {
        // "é" written as e + combining acute
        assert_eq!(norm_key("Re\u{0301}clamation"), norm_key("Réclamation"));
    }

    #[test]
    fn test_header_slug() {
        assert_eq!(header_slug("Sous  Catégorie "), "sous categorie");
        assert_eq!(header_slug("Thématique"), "thematique");
        assert_eq!(header_slug("ACTIONS"), "actions");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" Nord "), Some("Nord".to_string()));
    }
}

//! Lexical categories of a single statement token.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::TransactionType;

/// Currencies the line parser will anchor on. Compared after upper-casing.
pub const ACCEPTED_CURRENCIES: &[&str] = &["USD"];

/// Categories the scoring model was trained on, plus the short forms
/// statements print (`shopping`, `grocery`) and the fallbacks.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "entertainment",
    "food_dining",
    "gas_transport",
    "grocery",
    "grocery_net",
    "grocery_pos",
    "health_fitness",
    "home",
    "kids_pets",
    "misc",
    "misc_net",
    "misc_pos",
    "other",
    "personal_care",
    "shopping",
    "shopping_net",
    "shopping_pos",
    "travel",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Date,
    TransactionType(TransactionType),
    Unclassified,
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex"))
}

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w]").expect("non-word regex"))
}

pub fn classify(token: &str) -> TokenClass {
    if is_date(token) {
        return TokenClass::Date;
    }
    match transaction_type(token) {
        Some(kind) => TokenClass::TransactionType(kind),
        None => TokenClass::Unclassified,
    }
}

/// Exact `YYYY-MM-DD` shape only. `2019-10-9` or `10/09/2019` do not count.
pub fn is_date(token: &str) -> bool {
    date_re().is_match(token)
}

/// Keyword lookup tolerant of OCR punctuation: `Purchase.` and `|refund` both match.
pub fn transaction_type(token: &str) -> Option<TransactionType> {
    let stripped = non_word_re().replace_all(token, "").to_lowercase();
    TransactionType::ALL
        .into_iter()
        .find(|kind| kind.as_str() == stripped)
}

pub fn is_transaction_type(token: &str) -> bool {
    transaction_type(token).is_some()
}

pub fn is_accepted_currency(token: &str) -> bool {
    let upper = token.to_uppercase();
    ACCEPTED_CURRENCIES.contains(&upper.as_str())
}

/// Vocabulary match, ignoring case: `Shopping` and `GROCERY_POS` both count.
pub fn is_known_category(token: &str) -> bool {
    KNOWN_CATEGORIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(token))
}

/// Parse an amount with thousands separators removed. `NaN` and infinities are rejected.
pub fn parse_amount(token: &str) -> Option<f64> {
    let cleaned = token.trim().replace(',', "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_shape_is_strict() {
        assert!(is_date("2019-10-09"));
        assert!(!is_date("2019-10-9"));
        assert!(!is_date("10/09/2019"));
        assert!(!is_date("2019-10-09,"));
        assert!(!is_date("x2019-10-09"));
        assert_eq!(classify("2019-10-09"), TokenClass::Date);
    }

    #[test]
    fn test_transaction_type_ignores_case_and_punctuation() {
        assert_eq!(transaction_type("Purchase"), Some(TransactionType::Purchase));
        assert_eq!(transaction_type("REFUND."), Some(TransactionType::Refund));
        assert_eq!(transaction_type("|debit"), Some(TransactionType::Debit));
        assert!(is_transaction_type("Withdrawal;"));
        assert!(!is_transaction_type("Purchased"));
        assert_eq!(classify("shopping"), TokenClass::Unclassified);
    }

    #[test]
    fn test_only_usd_is_accepted() {
        assert!(is_accepted_currency("USD"));
        assert!(is_accepted_currency("usd"));
        assert!(!is_accepted_currency("EUR"));
        assert!(!is_accepted_currency("US"));
    }

    #[test]
    fn test_known_categories_ignore_case() {
        assert!(is_known_category("shopping"));
        assert!(is_known_category("Shopping"));
        assert!(is_known_category("GROCERY_POS"));
        assert!(!is_known_category("PLC"));
        assert!(!is_known_category("shop"));
    }

    #[test]
    fn test_amount_strips_thousands_separators() {
        assert_eq!(parse_amount("1,200.50"), Some(1200.50));
        assert_eq!(parse_amount("965.55"), Some(965.55));
        assert_eq!(parse_amount("-15.00"), Some(-15.0));
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("12.3O"), None);
    }
}

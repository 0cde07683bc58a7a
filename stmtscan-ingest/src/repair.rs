//! Currency repair and tokenization for raw OCR lines.
//!
//! Tesseract regularly reads `USD` as `USP`, `USB` or `US0`. The fix is a
//! substring rewrite on the whole line, so it has to happen before the line
//! is split into tokens.

use std::sync::OnceLock;

use regex::Regex;

/// Known misreads of `USD`, matched case-insensitively anywhere in the line.
/// `usd` itself is listed so lower-case readings come out upper-case.
pub const CURRENCY_MISREADS: &[(&str, &str)] = &[
    ("usp", "USD"),
    ("usb", "USD"),
    ("us0", "USD"),
    ("usd", "USD"),
];

/// Tokens that are left-over table rules rather than content.
const BORDER_TOKENS: &[&str] = &["-", "|"];

fn border_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[|,]").expect("border regex"))
}

fn misread_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = CURRENCY_MISREADS
            .iter()
            .map(|(bad, _)| regex::escape(bad))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!("(?i){alternation}")).expect("currency misread regex")
    })
}

/// Turn pipes and commas into spaces, then rewrite currency misreads.
///
/// All misreads are replaced in a single pass, so a substituted `USD` is
/// never matched a second time.
pub fn repair_line(line: &str) -> String {
    let cleaned = border_re().replace_all(line, " ");
    let cleaned = cleaned.trim();
    misread_re()
        .replace_all(cleaned, |caps: &regex::Captures<'_>| {
            let hit = caps[0].to_lowercase();
            CURRENCY_MISREADS
                .iter()
                .find(|(bad, _)| *bad == hit)
                .map(|(_, good)| *good)
                .unwrap_or("USD")
                .to_string()
        })
        .into_owned()
}

/// Split on whitespace and drop stray `-` / `|` tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace()
        .filter(|t| !BORDER_TOKENS.contains(t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_usd_is_left_alone() {
        assert_eq!(repair_line("USD"), "USD");
        assert_eq!(repair_line(&repair_line("USD")), "USD");
    }

    #[test]
    fn test_misreads_become_usd_once() {
        assert_eq!(repair_line("usp"), "USD");
        assert_eq!(repair_line("USB"), "USD");
        assert_eq!(repair_line("Us0"), "USD");
        assert_eq!(repair_line("usd"), "USD");
        assert_eq!(repair_line("12.00 USP Purchase"), "12.00 USD Purchase");
    }

    #[test]
    fn test_pipes_and_commas_become_whitespace() {
        let repaired = repair_line("| 2019-10-09 | Kuhic LLC | shopping |");
        assert_eq!(tokenize(&repaired), vec!["2019-10-09", "Kuhic", "LLC", "shopping"]);
    }

    #[test]
    fn test_tokenize_drops_border_tokens() {
        assert_eq!(
            tokenize("2019-10-09 - Kuhic | 5.00"),
            vec!["2019-10-09", "Kuhic", "5.00"]
        );
        assert!(tokenize("   ").is_empty());
    }
}

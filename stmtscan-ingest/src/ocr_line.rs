//! OCR line parser.
//!
//! Expected token layout (after repair and tokenization):
//!   2019-10-09  Kuhic LLC  shopping  965.55  USD  Purchase
//!   DATE        MERCHANT.. [CATEGORY] AMOUNT CUR  TYPE
//!
//! The date must be the first token. The transaction type is the rightmost
//! keyword; currency, amount and the optional category sit at fixed offsets
//! to its left. Any anchor that fails its check drops the whole line: a
//! missing line is preferred over shifted fields.

use crate::repair::{repair_line, tokenize};
use crate::token::{
    is_accepted_currency, is_date, is_known_category, is_transaction_type, parse_amount,
};
use crate::types::{Outcome, RawTransactionRecord, SkipReason};

pub const MIN_TOKENS: usize = 5;
pub const DEFAULT_CATEGORY: &str = "misc";

/// Repair, tokenize and parse one raw OCR line.
pub fn parse_ocr_line(line: &str) -> Outcome {
    let repaired = repair_line(line);
    parse_tokens(&tokenize(&repaired))
}

/// Parse an already-tokenized line.
pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Outcome {
    let tokens: Vec<&str> = tokens
        .iter()
        .map(|t| t.as_ref())
        .filter(|t| *t != "-" && *t != "|")
        .collect();

    if tokens.len() < MIN_TOKENS {
        return Outcome::NoMatch(SkipReason::TooFewTokens {
            found: tokens.len(),
        });
    }

    let date = tokens[0];
    if !is_date(date) {
        return Outcome::NoMatch(SkipReason::MissingDate {
            token: date.to_string(),
        });
    }

    let Some(type_idx) = tokens.iter().rposition(|t| is_transaction_type(t)) else {
        return Outcome::NoMatch(SkipReason::MissingTransactionType);
    };

    // Index 0 is the date, so every field anchor has to be at 1 or later.
    let Some(currency_idx) = type_idx.checked_sub(1).filter(|i| *i >= 1) else {
        return Outcome::NoMatch(SkipReason::MissingCurrency);
    };
    let currency = tokens[currency_idx];
    if !is_accepted_currency(currency) {
        return Outcome::NoMatch(SkipReason::CurrencyNotAccepted {
            token: currency.to_string(),
        });
    }

    let Some(amount_idx) = currency_idx.checked_sub(1).filter(|i| *i >= 1) else {
        return Outcome::NoMatch(SkipReason::MissingAmount);
    };
    let Some(amount) = parse_amount(tokens[amount_idx]) else {
        return Outcome::NoMatch(SkipReason::AmountNotNumeric {
            token: tokens[amount_idx].to_string(),
        });
    };

    let (category, merchant_end) = match amount_idx.checked_sub(1) {
        Some(idx) if idx >= 1 && looks_like_category(tokens[idx]) => {
            (tokens[idx].to_string(), idx)
        }
        _ => (DEFAULT_CATEGORY.to_string(), amount_idx),
    };

    Outcome::Parsed(RawTransactionRecord {
        date: date.to_string(),
        merchant: tokens[1..merchant_end].join(" "),
        category,
        amount,
        currency: currency.to_uppercase(),
        transaction_type: tokens[type_idx].to_string(),
    })
}

/// A known category in any case (`Shopping`, `GROCERY_POS`) is always taken.
/// Otherwise only a lower-case label qualifies; tokens with capitals or no
/// letters at all (`PLC`, `#204`) stay with the merchant name.
fn looks_like_category(token: &str) -> bool {
    if is_known_category(token) {
        return true;
    }
    token.chars().any(char::is_alphabetic) && !token.chars().any(char::is_uppercase)
}

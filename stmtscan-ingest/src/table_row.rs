//! Table row parser for PDF statements whose transactions sit in a real table.
//!
//! Expected columns, in order:
//!   Date | Merchant | Category | Amount | Currency | Transaction Type
//!
//! The table extractor already split the cells, so fields are read by
//! position. Extra trailing cells are ignored.

use crate::token::parse_amount;
use crate::types::{Outcome, RawTransactionRecord, SkipReason};

pub const MIN_CELLS: usize = 6;

pub fn is_header_row<S: AsRef<str>>(row: &[S]) -> bool {
    let cell_is = |idx: usize, name: &str| {
        row.get(idx)
            .is_some_and(|c| c.as_ref().trim().eq_ignore_ascii_case(name))
    };
    cell_is(0, "date") || cell_is(3, "amount")
}

pub fn parse_row<S: AsRef<str>>(row: &[S]) -> Outcome {
    if row.len() < MIN_CELLS {
        return Outcome::NoMatch(SkipReason::TooFewCells { found: row.len() });
    }
    if is_header_row(row) {
        return Outcome::NoMatch(SkipReason::HeaderRow);
    }

    let cell = |idx: usize| row[idx].as_ref().trim();

    let Some(amount) = parse_amount(cell(3)) else {
        return Outcome::Rejected(SkipReason::AmountNotNumeric {
            token: cell(3).to_string(),
        });
    };

    Outcome::Parsed(RawTransactionRecord {
        date: cell(0).to_string(),
        merchant: cell(1).to_string(),
        category: cell(2).to_string(),
        amount,
        currency: cell(4).to_string(),
        transaction_type: cell(5).to_string(),
    })
}

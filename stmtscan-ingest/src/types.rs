use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of transaction-type keywords recognized on statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Purchase,
    Refund,
    Withdrawal,
    Payment,
    Credit,
    Debit,
}

impl TransactionType {
    pub const ALL: [TransactionType; 6] = [
        TransactionType::Purchase,
        TransactionType::Refund,
        TransactionType::Withdrawal,
        TransactionType::Payment,
        TransactionType::Credit,
        TransactionType::Debit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Purchase => "purchase",
            TransactionType::Refund => "refund",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Payment => "payment",
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

/// One transaction as read off a statement, before normalization.
///
/// `date` is kept in whatever shape the statement printed it; the
/// normalizer decides whether it is a real timestamp. `transaction_type`
/// keeps the statement's own spelling (e.g. `Purchase`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransactionRecord {
    pub date: String,
    pub merchant: String,
    pub category: String,
    /// Always finite. Parsers report a skip instead of building a record otherwise.
    pub amount: f64,
    pub currency: String,
    pub transaction_type: String,
}

/// Scoring-only sex code. Statements never carry it, so it is almost always `U`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[default]
    #[serde(rename = "U")]
    Unknown,
}

/// A normalized transaction, named the way the scoring model expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    #[serde(with = "timestamp_format")]
    pub trans_date_trans_time: Option<NaiveDateTime>,
    pub merchant: String,
    pub category: String,
    pub amt: f64,
    pub currency: String,
    pub transaction_type: String,
    pub hour: u32,
    pub day_of_week: u32,
    pub city_pop: f64,
    pub distance: f64,
    pub gender: Gender,
    pub state: String,
}

/// The feature row handed to the risk scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringFeatures {
    pub amt: f64,
    pub category: String,
    pub gender: Gender,
    pub state: String,
    pub city_pop: f64,
    pub hour: u32,
    pub day_of_week: u32,
    pub distance: f64,
}

/// Why a table row or OCR line did not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("line has {found} tokens, need at least 5")]
    TooFewTokens { found: usize },
    #[error("first token `{token}` is not a YYYY-MM-DD date")]
    MissingDate { token: String },
    #[error("no transaction-type keyword on line")]
    MissingTransactionType,
    #[error("currency `{token}` is not accepted")]
    CurrencyNotAccepted { token: String },
    #[error("no currency token left of the transaction type")]
    MissingCurrency,
    #[error("no amount token left of the currency")]
    MissingAmount,
    #[error("amount `{token}` is not a finite number")]
    AmountNotNumeric { token: String },
    #[error("row has {found} cells, need at least 6")]
    TooFewCells { found: usize },
    #[error("header row")]
    HeaderRow,
}

/// Result of parsing one table row or OCR line.
///
/// `NoMatch` is the quiet outcome: the input simply isn't a transaction
/// (headers, page numbers, short rows). `Rejected` means the input had
/// the shape of a transaction but a field failed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Parsed(RawTransactionRecord),
    NoMatch(SkipReason),
    Rejected(SkipReason),
}

impl Outcome {
    pub fn into_record(self) -> Option<RawTransactionRecord> {
        match self {
            Outcome::Parsed(record) => Some(record),
            _ => None,
        }
    }
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) if !s.is_empty() => NaiveDateTime::parse_from_str(&s, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

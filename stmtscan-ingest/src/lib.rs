//! stmtscan-ingest: turns statement tables and OCR text into transaction records for fraud scoring.

pub mod bridge;
pub mod capability;
pub mod cleanup;
pub mod normalize;
pub mod ocr_line;
pub mod repair;
pub mod router;
pub mod table_row;
pub mod token;
pub mod types;

pub use capability::{ImagePreprocessor, PageTables, PassThrough, TableExtractor, TextRecognizer};
pub use cleanup::StatementImageCleanup;
pub use normalize::normalize;
pub use router::{DocumentKind, DocumentReport, ExtractedDocument, StatementParser, parse_extracted};
pub use types::{
    CanonicalTransaction, Gender, Outcome, RawTransactionRecord, ScoringFeatures, SkipReason,
    TransactionType,
};

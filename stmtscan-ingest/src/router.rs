//! Document router: pick the parsing path from the file extension, run the
//! external extraction for that path, and fold every row or line outcome
//! into one report.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::capability::{ImagePreprocessor, PageTables, TableExtractor, TextRecognizer};
use crate::normalize::normalize;
use crate::ocr_line::parse_ocr_line;
use crate::table_row::parse_row;
use crate::types::{CanonicalTransaction, Outcome, RawTransactionRecord, SkipReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    /// `.pdf` (any case) is a table document; everything else goes through OCR.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => DocumentKind::Pdf,
            _ => DocumentKind::Image,
        }
    }
}

/// Output of the external extraction step, one variant per parsing path.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedDocument {
    Tables(Vec<PageTables>),
    /// Recognized text, one entry per page.
    Text(Vec<String>),
}

/// Everything a parse produced: the records plus how the rest was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentReport {
    pub records: Vec<RawTransactionRecord>,
    pub pages: usize,
    pub failed_pages: usize,
    pub no_match: usize,
    pub header_rows: usize,
    pub rejected: usize,
}

impl DocumentReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn fail_page(&mut self, page: usize, reason: &str) {
        warn!(page, %reason, "page extraction failed, continuing without it");
        self.failed_pages += 1;
    }

    fn absorb(&mut self, outcome: Outcome, page: usize, item: usize, source: &dyn std::fmt::Debug) {
        match outcome {
            Outcome::Parsed(record) => self.records.push(record),
            Outcome::NoMatch(SkipReason::HeaderRow) => self.header_rows += 1,
            Outcome::NoMatch(reason) => {
                debug!(page, item, %reason, ?source, "no match");
                self.no_match += 1;
            }
            Outcome::Rejected(reason) => {
                warn!(page, item, %reason, ?source, "skipped row");
                self.rejected += 1;
            }
        }
    }
}

/// Run the parsers over already-extracted content. Pure: no I/O.
///
/// Records come out in page order, then table order, then row/line order.
pub fn parse_extracted(document: &ExtractedDocument) -> DocumentReport {
    let mut report = DocumentReport::default();

    match document {
        ExtractedDocument::Tables(pages) => {
            report.pages = pages.len();
            for (page_idx, page) in pages.iter().enumerate() {
                let tables = match page {
                    PageTables::Extracted(tables) => tables,
                    PageTables::Failed(reason) => {
                        report.fail_page(page_idx, reason);
                        continue;
                    }
                };
                for table in tables {
                    for (row_idx, row) in table.iter().enumerate() {
                        report.absorb(parse_row(row), page_idx, row_idx, row);
                    }
                }
            }
        }
        ExtractedDocument::Text(pages) => {
            report.pages = pages.len();
            for (page_idx, text) in pages.iter().enumerate() {
                for (line_idx, line) in text.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    report.absorb(parse_ocr_line(line), page_idx, line_idx, &line);
                }
            }
        }
    }

    report
}

/// The engine's entry point, wired to its external capabilities.
pub struct StatementParser {
    tables: Box<dyn TableExtractor>,
    preprocessor: Box<dyn ImagePreprocessor>,
    recognizer: Box<dyn TextRecognizer>,
}

impl StatementParser {
    pub fn new(
        tables: Box<dyn TableExtractor>,
        preprocessor: Box<dyn ImagePreprocessor>,
        recognizer: Box<dyn TextRecognizer>,
    ) -> Self {
        Self {
            tables,
            preprocessor,
            recognizer,
        }
    }

    /// Parse a statement into canonical transactions.
    ///
    /// An empty result means nothing could be extracted; it is not an error.
    pub fn parse(&self, document: &Path) -> Vec<CanonicalTransaction> {
        normalize(self.parse_report(document).records)
    }

    pub fn parse_report(&self, document: &Path) -> DocumentReport {
        let kind = DocumentKind::from_path(document);
        let extracted = match self.extract(document, kind) {
            Ok(extracted) => extracted,
            Err(err) => {
                warn!(document = %document.display(), error = %format!("{err:#}"), "extraction failed");
                return DocumentReport {
                    failed_pages: 1,
                    ..DocumentReport::default()
                };
            }
        };

        let report = parse_extracted(&extracted);
        info!(
            document = %document.display(),
            ?kind,
            pages = report.pages,
            records = report.records.len(),
            no_match = report.no_match,
            rejected = report.rejected,
            failed_pages = report.failed_pages,
            "parsed statement"
        );
        report
    }

    pub fn extract(&self, document: &Path, kind: DocumentKind) -> Result<ExtractedDocument> {
        match kind {
            DocumentKind::Pdf => {
                let pages = self
                    .tables
                    .extract_tables(document)
                    .with_context(|| format!("extracting tables from {}", document.display()))?;
                Ok(ExtractedDocument::Tables(pages))
            }
            DocumentKind::Image => {
                let work_dir = tempfile::tempdir().context("creating OCR work dir")?;
                let cleaned = self
                    .preprocessor
                    .preprocess(document, work_dir.path())
                    .with_context(|| format!("preprocessing {}", document.display()))?;
                let text = self
                    .recognizer
                    .recognize_text(&cleaned)
                    .with_context(|| format!("recognizing text in {}", document.display()))?;
                Ok(ExtractedDocument::Text(vec![text]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("a/statement.PDF")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("scan.png")), DocumentKind::Image);
        assert_eq!(DocumentKind::from_path(Path::new("noext")), DocumentKind::Image);
    }

    #[test]
    fn test_tables_keep_page_order_and_survive_failed_pages() {
        let doc = ExtractedDocument::Tables(vec![
            PageTables::Extracted(vec![vec![
                row(&["Date", "Merchant", "Category", "Amount", "Currency", "Type"]),
                row(&["2019-10-09", "A", "shopping", "1.00", "USD", "Purchase"]),
                row(&["2019-10-10", "B", "shopping", "oops", "USD", "Purchase"]),
            ]]),
            PageTables::Failed("corrupt page".to_string()),
            PageTables::Extracted(vec![
                vec![row(&["2019-10-11", "C", "travel", "3.00", "USD", "Refund"])],
                vec![row(&["short"])],
            ]),
        ]);

        let report = parse_extracted(&doc);
        let merchants: Vec<_> = report.records.iter().map(|r| r.merchant.as_str()).collect();
        assert_eq!(merchants, vec!["A", "C"]);
        assert_eq!(report.pages, 3);
        assert_eq!(report.failed_pages, 1);
        assert_eq!(report.header_rows, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.no_match, 1);
    }

    #[test]
    fn test_text_lines() {
        let text = "ACME BANK STATEMENT\n\
                    2019-10-09 Kuhic LLC shopping 965.55 USD Purchase\n\
                    \n\
                    Page 1 of 2\n\
                    2019-10-10 Brown PLC 1200.50 usb Refund\n";
        let report = parse_extracted(&ExtractedDocument::Text(vec![text.to_string()]));
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].currency, "USD");
        assert_eq!(report.records[1].category, "misc");
        assert_eq!(report.no_match, 2);
    }

    #[test]
    fn test_empty_document() {
        let report = parse_extracted(&ExtractedDocument::Tables(Vec::new()));
        assert!(report.is_empty());
        assert!(parse_extracted(&ExtractedDocument::Text(vec![String::new()])).is_empty());
    }
}

//! Seams to the external tools the engine leans on.
//!
//! Table extraction and OCR live outside this crate. The router only sees
//! these traits; `bridge` has command-line backed implementations, `cleanup`
//! the built-in image pass, and tests plug in fakes.

use std::path::{Path, PathBuf};

use anyhow::Result;

/// One table row as cell text.
pub type Row = Vec<String>;
/// One table as a sequence of rows.
pub type Table = Vec<Row>;

/// What the table extractor produced for a single page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageTables {
    Extracted(Vec<Table>),
    Failed(String),
}

pub trait TableExtractor: Send + Sync {
    /// One entry per page, in page order.
    fn extract_tables(&self, document: &Path) -> Result<Vec<PageTables>>;
}

pub trait ImagePreprocessor: Send + Sync {
    /// Returns the path of the cleaned-up image. It may be the input path itself.
    fn preprocess(&self, image: &Path, work_dir: &Path) -> Result<PathBuf>;
}

pub trait TextRecognizer: Send + Sync {
    /// Free text, one recognized line per `\n`.
    fn recognize_text(&self, image: &Path) -> Result<String>;
}

/// Hands the image to OCR untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl ImagePreprocessor for PassThrough {
    fn preprocess(&self, image: &Path, _work_dir: &Path) -> Result<PathBuf> {
        Ok(image.to_path_buf())
    }
}

//! Command-line backed capabilities: pdfplumber for tables, an optional
//! image clean-up command, and tesseract for OCR.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::capability::{ImagePreprocessor, PageTables, Table, TableExtractor, TextRecognizer};

/// Prints `[[table, ...], ...]` per page as JSON; a page that blows up
/// becomes `{"error": "..."}` so the other pages still come through.
pub const PDFPLUMBER_SCRIPT: &str = r#"
import json, sys
import pdfplumber
pages = []
with pdfplumber.open(sys.argv[1]) as pdf:
    for page in pdf.pages:
        try:
            pages.append(page.extract_tables())
        except Exception as e:
            pages.append({"error": str(e)})
print(json.dumps(pages))
"#;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageJson {
    Tables(Vec<Vec<Vec<Option<String>>>>),
    Failed { error: String },
}

impl From<PageJson> for PageTables {
    fn from(page: PageJson) -> Self {
        match page {
            PageJson::Tables(tables) => PageTables::Extracted(
                tables
                    .into_iter()
                    .map(|table| -> Table {
                        table
                            .into_iter()
                            .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
                            .collect()
                    })
                    .collect(),
            ),
            PageJson::Failed { error } => PageTables::Failed(error),
        }
    }
}

/// Decode the extractor's stdout.
pub fn decode_tables_json(json: &str) -> Result<Vec<PageTables>> {
    let pages: Vec<PageJson> =
        serde_json::from_str(json).context("failed to parse table extractor JSON")?;
    Ok(pages.into_iter().map(PageTables::from).collect())
}

fn run_checked(cmd: &mut Command, what: &str) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to invoke {what}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{what} failed ({}): {}", output.status, stderr.trim());
    }
    Ok(output)
}

#[derive(Debug, Clone)]
pub struct CommandTableExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandTableExtractor {
    /// `python3 -c <pdfplumber script> <pdf>`.
    pub fn pdfplumber() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["-c".to_string(), PDFPLUMBER_SCRIPT.to_string()],
        }
    }

    /// Any program that takes the PDF path as its last argument and prints the same JSON.
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

impl TableExtractor for CommandTableExtractor {
    fn extract_tables(&self, document: &Path) -> Result<Vec<PageTables>> {
        let output = run_checked(
            Command::new(&self.program).args(&self.args).arg(document),
            "table extractor",
        )?;
        decode_tables_json(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Runs a user-supplied image clean-up command.
///
/// `{input}` and `{output}` in the arguments are replaced by the source image
/// and a fresh PNG path inside the work dir.
#[derive(Debug, Clone)]
pub struct CommandPreprocessor {
    program: String,
    args: Vec<String>,
}

impl CommandPreprocessor {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.display().to_string();
        let output = output.display().to_string();
        self.args
            .iter()
            .map(|a| a.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }
}

impl ImagePreprocessor for CommandPreprocessor {
    fn preprocess(&self, image: &Path, work_dir: &Path) -> Result<PathBuf> {
        let output = work_dir.join("preprocessed.png");
        run_checked(
            Command::new(&self.program).args(self.expand_args(image, &output)),
            "image preprocessor",
        )?;
        if !output.exists() {
            anyhow::bail!(
                "image preprocessor did not write {}",
                output.display()
            );
        }
        Ok(output)
    }
}

#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: String,
    lang: String,
    psm: u8,
}

impl TesseractRecognizer {
    pub fn new(program: String) -> Self {
        Self {
            program,
            lang: "eng".to_string(),
            psm: 6,
        }
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    /// Page segmentation mode; 6 treats the image as one uniform block of text.
    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize_text(&self, image: &Path) -> Result<String> {
        let output = run_checked(
            Command::new(&self.program)
                .arg(image)
                .arg("stdout")
                .arg("--psm")
                .arg(self.psm.to_string())
                .arg("-l")
                .arg(&self.lang),
            "tesseract",
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

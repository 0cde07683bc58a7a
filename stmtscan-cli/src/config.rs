use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use stmtscan_ingest::bridge::{CommandPreprocessor, CommandTableExtractor, TesseractRecognizer};
use stmtscan_ingest::cleanup::{BINARY_THRESHOLD, RULE_MIN_WIDTH};
use stmtscan_ingest::{ImagePreprocessor, PassThrough, StatementImageCleanup, StatementParser};

/// Overrides the `~/.stmtscan` directory the default config lives in.
pub const HOME_ENV: &str = "STMTSCAN_HOME";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ocr: OcrSection,
    pub preprocess: PreprocessSection,
    pub tables: TablesSection,
    pub engine: EngineSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSection {
    pub command: String,
    pub lang: String,
    /// Tesseract page segmentation mode
    pub page_segmentation_mode: u8,
}

/// Image clean-up before OCR. An external `command` wins over the built-in
/// pass; `{input}` / `{output}` in `args` are substituted with file paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessSection {
    pub command: Option<String>,
    pub args: Vec<String>,
    /// Grayscale, threshold and rule removal without external tools
    pub builtin: bool,
    pub threshold: u8,
    /// Shortest horizontal run removed as a table rule, in pixels
    pub rule_width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesSection {
    pub command: String,
    /// When empty, the built-in pdfplumber script is used.
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Documents parsed at once
    pub jobs: usize,
}

impl Default for OcrSection {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            lang: "eng".to_string(),
            page_segmentation_mode: 6,
        }
    }
}

impl Default for PreprocessSection {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            builtin: true,
            threshold: BINARY_THRESHOLD,
            rule_width: RULE_MIN_WIDTH,
        }
    }
}

impl Default for TablesSection {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            args: Vec::new(),
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self { jobs: 4 }
    }
}

impl Config {
    pub fn build_parser(&self) -> StatementParser {
        let tables = if self.tables.args.is_empty() && self.tables.command == "python3" {
            CommandTableExtractor::pdfplumber()
        } else {
            CommandTableExtractor::new(self.tables.command.clone(), self.tables.args.clone())
        };

        let recognizer = TesseractRecognizer::new(self.ocr.command.clone())
            .with_lang(self.ocr.lang.clone())
            .with_psm(self.ocr.page_segmentation_mode);

        StatementParser::new(Box::new(tables), self.preprocessor(), Box::new(recognizer))
    }

    fn preprocessor(&self) -> Box<dyn ImagePreprocessor> {
        let pre = &self.preprocess;
        match &pre.command {
            Some(cmd) => Box::new(CommandPreprocessor::new(cmd.clone(), pre.args.clone())),
            None if pre.builtin => Box::new(StatementImageCleanup {
                threshold: pre.threshold,
                rule_width: pre.rule_width,
            }),
            None => Box::new(PassThrough),
        }
    }
}

/// `$STMTSCAN_HOME/config.toml`, falling back to `~/.stmtscan/config.toml`.
/// The directory is created on first use.
pub fn config_path() -> Result<PathBuf> {
    let dir = match std::env::var_os(HOME_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let home = std::env::var_os("HOME").context("neither STMTSCAN_HOME nor HOME is set")?;
            PathBuf::from(home).join(".stmtscan")
        }
    };
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir.join("config.toml"))
}

/// Load from `path`, or the default location when `None`. A missing file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.engine.jobs, 4);
        assert_eq!(cfg.ocr.page_segmentation_mode, 6);
        assert!(cfg.preprocess.builtin);
        assert_eq!(cfg.preprocess.threshold, 150);
        assert_eq!(cfg.preprocess.rule_width, 50);
    }

    #[test]
    fn test_default_preprocessor_is_builtin_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let scan = dir.path().join("scan.png");
        image::GrayImage::from_pixel(60, 3, image::Luma([255]))
            .save(&scan)
            .unwrap();

        let cleaned = Config::default()
            .preprocessor()
            .preprocess(&scan, dir.path())
            .unwrap();
        assert_eq!(cleaned, dir.path().join("preprocessed.png"));

        let mut cfg = Config::default();
        cfg.preprocess.builtin = false;
        assert_eq!(cfg.preprocessor().preprocess(&scan, dir.path()).unwrap(), scan);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[ocr]
lang = "eng+spa"

[preprocess]
command = "magick"
args = ["{input}", "-colorspace", "Gray", "{output}"]
"#,
        )
        .unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.ocr.lang, "eng+spa");
        assert_eq!(cfg.ocr.command, "tesseract");
        assert_eq!(cfg.preprocess.command.as_deref(), Some("magick"));
        assert_eq!(cfg.preprocess.args.len(), 4);
        assert!(cfg.preprocess.builtin);
        assert_eq!(cfg.engine.jobs, 4);
    }

    #[test]
    fn test_init_writes_loadable_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        init_config(Some(&path)).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Config::default());

        fs::write(&path, "[engine]\njobs = 9\n").unwrap();
        init_config(Some(&path)).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap().engine.jobs, 9);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[engine]\njobs = \"many\"\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}

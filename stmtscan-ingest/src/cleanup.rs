//! Built-in clean-up for scanned statements before they reach OCR.
//!
//! The page is reduced to grayscale, binarized with ink as white on black,
//! and the long horizontal table rules are lifted out so tesseract does not
//! read them as rows of dashes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, ImageReader, Luma};
use tracing::debug;

use crate::capability::ImagePreprocessor;

/// Pixels at or below this gray level count as ink.
pub const BINARY_THRESHOLD: u8 = 150;
/// Shortest run of ink, in pixels, treated as a table rule.
pub const RULE_MIN_WIDTH: u32 = 50;

const INK: u8 = 255;
const PAPER: u8 = 0;

/// Inverted binary threshold: `> threshold` becomes black, everything else white.
pub fn binarize_inverted(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > threshold {
            Luma([PAPER])
        } else {
            Luma([INK])
        }
    })
}

/// Opening with a `1 x min_width` line: keeps only the horizontal runs of ink
/// that are at least `min_width` pixels long.
pub fn horizontal_rules(binary: &GrayImage, min_width: u32) -> GrayImage {
    let (width, height) = binary.dimensions();
    let mut rules = GrayImage::new(width, height);
    for y in 0..height {
        let mut x = 0;
        while x < width {
            if binary.get_pixel(x, y)[0] != INK {
                x += 1;
                continue;
            }
            let start = x;
            while x < width && binary.get_pixel(x, y)[0] == INK {
                x += 1;
            }
            if x - start >= min_width {
                for rx in start..x {
                    rules.put_pixel(rx, y, Luma([INK]));
                }
            }
        }
    }
    rules
}

/// Grayscale, inverted threshold, then subtract the horizontal rules.
pub fn clean_statement_image(image: &DynamicImage, threshold: u8, rule_width: u32) -> GrayImage {
    let binary = binarize_inverted(&image.to_luma8(), threshold);
    let rules = horizontal_rules(&binary, rule_width);
    let mut cleaned = binary;
    for (pixel, rule) in cleaned.pixels_mut().zip(rules.pixels()) {
        pixel[0] = pixel[0].saturating_sub(rule[0]);
    }
    cleaned
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementImageCleanup {
    pub threshold: u8,
    pub rule_width: u32,
}

impl Default for StatementImageCleanup {
    fn default() -> Self {
        Self {
            threshold: BINARY_THRESHOLD,
            rule_width: RULE_MIN_WIDTH,
        }
    }
}

impl ImagePreprocessor for StatementImageCleanup {
    fn preprocess(&self, image: &Path, work_dir: &Path) -> Result<PathBuf> {
        let decoded = ImageReader::open(image)
            .with_context(|| format!("open {}", image.display()))?
            .with_guessed_format()
            .with_context(|| format!("sniff image format of {}", image.display()))?
            .decode()
            .with_context(|| format!("decode {}", image.display()))?;

        let cleaned = clean_statement_image(&decoded, self.threshold, self.rule_width);
        let output = work_dir.join("preprocessed.png");
        cleaned
            .save(&output)
            .with_context(|| format!("write {}", output.display()))?;
        debug!(
            input = %image.display(),
            width = cleaned.width(),
            height = cleaned.height(),
            "cleaned statement image"
        );
        Ok(output)
    }
}

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde_json::{Value, json};
use std::io::Write;

use stmtscan_ingest::CanonicalTransaction;

use crate::batch::ParsedDocument;

/// Column order of the scoring schema.
pub const CANONICAL_COLUMNS: [&str; 12] = [
    "trans_date_trans_time",
    "merchant",
    "category",
    "amt",
    "currency",
    "transaction_type",
    "hour",
    "day_of_week",
    "city_pop",
    "distance",
    "gender",
    "state",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

pub fn write_transactions<W: Write>(
    out: W,
    format: OutputFormat,
    txns: &[CanonicalTransaction],
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, &serde_json::to_value(txns)?),
        OutputFormat::Csv => write_csv(out, txns),
    }
}

/// Per-document summaries with their transactions, JSON only.
pub fn write_reports<W: Write>(out: W, docs: &[ParsedDocument]) -> Result<()> {
    let reports = docs
        .iter()
        .map(|doc| {
            Ok(json!({
                "document": doc.path.display().to_string(),
                "pages": doc.report.pages,
                "failed_pages": doc.report.failed_pages,
                "records": doc.report.records.len(),
                "no_match": doc.report.no_match,
                "header_rows": doc.report.header_rows,
                "rejected": doc.report.rejected,
                "transactions": serde_json::to_value(&doc.transactions)?,
            }))
        })
        .collect::<Result<Vec<Value>>>()?;
    write_json(out, &Value::Array(reports))
}

fn write_json<W: Write>(mut out: W, value: &Value) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, value).context("write JSON")?;
    writeln!(out)?;
    Ok(())
}

fn write_csv<W: Write>(out: W, txns: &[CanonicalTransaction]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    wtr.write_record(CANONICAL_COLUMNS)?;
    for txn in txns {
        wtr.serialize(txn).context("write CSV row")?;
    }
    wtr.flush()?;
    Ok(())
}

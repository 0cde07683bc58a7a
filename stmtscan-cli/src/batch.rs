//! Parse several statements at once on a bounded pool of blocking workers.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use stmtscan_ingest::{CanonicalTransaction, DocumentReport, StatementParser, normalize};

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub path: PathBuf,
    pub report: DocumentReport,
    pub transactions: Vec<CanonicalTransaction>,
}

/// Results come back in the order of `paths`, whatever order the workers finish in.
pub async fn parse_documents(
    parser: Arc<StatementParser>,
    paths: Vec<PathBuf>,
    jobs: usize,
) -> Result<Vec<ParsedDocument>> {
    let permits = Arc::new(Semaphore::new(jobs.max(1)));
    let mut set = JoinSet::new();

    for (idx, path) in paths.into_iter().enumerate() {
        let parser = Arc::clone(&parser);
        let permits = Arc::clone(&permits);
        set.spawn(async move {
            let _permit = permits.acquire_owned().await.context("worker pool closed")?;
            let parsed = tokio::task::spawn_blocking(move || {
                let report = parser.parse_report(&path);
                let transactions = normalize(report.records.clone());
                ParsedDocument {
                    path,
                    report,
                    transactions,
                }
            })
            .await
            .context("parse worker panicked")?;
            anyhow::Ok((idx, parsed))
        });
    }

    let mut done = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        done.push(joined.context("parse task aborted")??);
    }
    done.sort_by_key(|(idx, _)| *idx);
    Ok(done.into_iter().map(|(_, parsed)| parsed).collect())
}

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use stmtscan_ingest::ocr_line::parse_ocr_line;
use stmtscan_ingest::repair::{repair_line, tokenize};
use stmtscan_ingest::{CanonicalTransaction, Outcome};

mod batch;
mod config;
mod output;

use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "stmtscan",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STMTSCAN_BUILD_SHA"), ")"),
    about = "Extract transactions from statement PDFs and scans"
)]
struct Cli {
    /// Config file (default: ~/.stmtscan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log skipped lines and rows
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse one or more statements (PDF tables or images) into transactions
    Parse {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Documents parsed at once (default: [engine] jobs from config)
        #[arg(long)]
        jobs: Option<usize>,

        /// Emit per-document counts alongside the transactions (JSON only)
        #[arg(long)]
        report: bool,
    },

    /// Run a single OCR line through repair and the line parser
    Line {
        text: String,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "stmtscan=debug,stmtscan_ingest=debug"
    } else {
        "stmtscan=info,stmtscan_ingest=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Parse {
            files,
            format,
            jobs,
            report,
        } => {
            if report && format != OutputFormat::Json {
                bail!("--report is only available with --format json");
            }
            for f in &files {
                if !f.exists() {
                    bail!("file not found: {}", f.display());
                }
            }

            let cfg = config::load_config(cli.config.as_deref())?;
            let jobs = jobs.unwrap_or(cfg.engine.jobs);
            let parser = Arc::new(cfg.build_parser());

            let docs = batch::parse_documents(parser, files, jobs).await?;
            let stdout = std::io::stdout().lock();

            if report {
                output::write_reports(stdout, &docs)?;
            } else {
                let txns: Vec<CanonicalTransaction> = docs
                    .iter()
                    .flat_map(|d| d.transactions.iter().cloned())
                    .collect();
                output::write_transactions(stdout, format, &txns)?;
            }

            let total: usize = docs.iter().map(|d| d.transactions.len()).sum();
            if total == 0 {
                warn!("no transactions found");
            } else {
                info!(documents = docs.len(), transactions = total, "done");
            }
        }

        Command::Line { text } => {
            let repaired = repair_line(&text);
            println!("repaired: {repaired}");
            println!("tokens:   {:?}", tokenize(&repaired));
            match parse_ocr_line(&text) {
                Outcome::Parsed(record) => {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
                Outcome::NoMatch(reason) => println!("no match: {reason}"),
                Outcome::Rejected(reason) => println!("rejected: {reason}"),
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(cli.config.as_deref())?,
            ConfigCommand::Show => {
                let cfg = config::load_config(cli.config.as_deref())?;
                print!("{}", toml::to_string_pretty(&cfg)?);
            }
        },
    }

    Ok(())
}

pub mod predict;
pub mod reconcile;
pub mod settings;
pub mod suggest;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::matcher::SkippedRow;
use crate::session::Session;
use crate::sheet;

/// Read a ledger file into a fresh session, reporting rows that could not be used.
pub(crate) fn open_ledger(path: &Path) -> anyhow::Result<Session> {
    let rows = sheet::read_rows(path)
        .with_context(|| format!("reading ledger {}", path.display()))?;
    let mut session = Session::new(crate::settings::load_settings());
    let skipped = session.load_ledger(&rows);
    report_skipped("ledger", &skipped);
    Ok(session)
}

pub(crate) fn report_skipped(source: &str, skipped: &[SkippedRow]) {
    for row in skipped {
        eprintln!(
            "{} {source} row {} skipped: {}",
            "warning:".yellow().bold(),
            row.index + 1,
            row.error
        );
    }
}

#[derive(Parser)]
#[command(
    name = "betteraccounting",
    about = "Reconcile bank exports against a spreadsheet ledger and suggest categories."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match a bank export against the ledger and show what would change.
    Reconcile {
        /// Ledger file (CSV or XLSX)
        ledger: PathBuf,
        /// Bank export to reconcile (CSV or XLSX)
        import: PathBuf,
        /// Merge every incoming row into the ledger
        #[arg(long = "accept-all")]
        accept_all: bool,
        /// Print the resulting ledger as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Predict a category and tags for a piece of transaction text.
    Predict {
        /// Ledger file to train on
        ledger: PathBuf,
        /// Text to classify (sender, recipient, description)
        #[arg(required = true)]
        text: Vec<String>,
        /// Required odds ratio over the runner-up category
        #[arg(long)]
        confidence: Option<f64>,
        /// Show every category's score
        #[arg(long)]
        explain: bool,
    },
    /// Suggest categories and tags for unlabelled ledger rows.
    Suggest {
        /// Ledger file to train on and fill in
        ledger: PathBuf,
        /// Print the filled-in ledger as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show or change prediction settings.
    Settings {
        #[arg(long = "category-confidence")]
        category_confidence: Option<f64>,
        #[arg(long = "strict-category-confidence")]
        strict_category_confidence: Option<f64>,
        #[arg(long = "tag-confidence")]
        tag_confidence: Option<f64>,
        #[arg(long = "tag-relative-threshold")]
        tag_relative_threshold: Option<f64>,
    },
}

use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::fmt::kroner_opt;
use crate::session::{Review, ReviewKind};
use crate::sheet;

use super::{open_ledger, report_skipped};

fn review_table(review: &Review) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Status", "Date", "Sender", "Recipient", "Text", "Amount", "Category", "Tags",
    ]);
    for entry in &review.entries {
        let status = match &entry.kind {
            ReviewKind::Exact { .. } => "exact".dimmed(),
            ReviewKind::Near { old, .. } => format!("near ({})", old.posting_date).yellow(),
            ReviewKind::New => "new".green(),
        };
        let row = &entry.row;
        let category = if entry.predicted && !row.category.is_empty() {
            format!("{}*", row.category).cyan()
        } else {
            row.category.normal()
        };
        table.add_row(vec![
            Cell::new(status),
            Cell::new(&row.posting_date),
            Cell::new(&row.sender),
            Cell::new(&row.recipient),
            Cell::new(&row.text),
            Cell::new(kroner_opt(row.amount)),
            Cell::new(category),
            Cell::new(&row.tags),
        ]);
    }
    table
}

pub fn run(ledger: &Path, import: &Path, accept_all: bool, json: bool) -> anyhow::Result<()> {
    let mut session = open_ledger(ledger)?;
    let rows = sheet::read_rows(import)
        .with_context(|| format!("reading import {}", import.display()))?;
    report_skipped("import", session.load_import(&rows));

    let review = session.review();
    let summary = format!(
        "{} exact, {} near, {} new, {} skipped",
        review.exact_count(),
        review.near_count(),
        review.new_count(),
        review.skipped
    );

    if json {
        eprintln!("{summary}");
    } else {
        println!("{}", review_table(&review));
        println!("{summary}");
        if review.entries.iter().any(|e| e.predicted) {
            println!("{}", "* suggested from the ledger".dimmed());
        }
    }

    if accept_all {
        let merged = session.accept_all();
        let line = format!(
            "Merged: {} appended, {} replaced, {} duplicates dropped",
            merged.appended, merged.replaced, merged.duplicates
        );
        if json {
            eprintln!("{line}");
        } else {
            println!("{}", line.bold());
        }
    }

    if json {
        let out = serde_json::to_string_pretty(session.merged())
            .context("serializing ledger")?;
        println!("{out}");
    }
    Ok(())
}

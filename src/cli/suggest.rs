use std::path::Path;

use anyhow::Context;
use comfy_table::{Cell, Table};

use crate::fmt::kroner_opt;

use super::open_ledger;

pub fn run(ledger: &Path, json: bool) -> anyhow::Result<()> {
    let mut session = open_ledger(ledger)?;
    let suggested = session.suggest_ledger();

    if json {
        eprintln!("{} rows filled in", suggested.len());
        let out = serde_json::to_string_pretty(session.merged())
            .context("serializing ledger")?;
        println!("{out}");
        return Ok(());
    }

    if suggested.is_empty() {
        println!("No confident suggestions.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Sender", "Recipient", "Amount", "Category", "Tags"]);
    for row in session
        .merged()
        .iter()
        .filter(|r| suggested.contains(&r.key()))
    {
        table.add_row(vec![
            Cell::new(&row.posting_date),
            Cell::new(&row.sender),
            Cell::new(&row.recipient),
            Cell::new(kroner_opt(row.amount)),
            Cell::new(&row.category),
            Cell::new(&row.tags),
        ]);
    }
    println!("Suggestions\n{table}");
    println!("{} rows filled in", suggested.len());
    Ok(())
}

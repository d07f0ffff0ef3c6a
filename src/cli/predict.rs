use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::settings::check_level;

use super::open_ledger;

pub fn run(
    ledger: &Path,
    text: &[String],
    confidence: Option<f64>,
    explain: bool,
) -> anyhow::Result<()> {
    if let Some(level) = confidence {
        check_level("confidence", level)?;
    }
    let session = open_ledger(ledger)?;
    let predictor = session.predictor();
    let text = text.join(" ");
    let confidence = confidence.unwrap_or(session.settings().category_confidence);

    match predictor.predict_category(&text, confidence) {
        Some(category) => {
            println!("Category: {}", category.green().bold());
            let tags = predictor.predict_tags(&text);
            if tags.is_empty() {
                println!("Tags:     {}", "(none)".dimmed());
            } else {
                println!("Tags:     {}", tags.join(", "));
            }
        }
        None => println!("{}", "No confident category.".yellow()),
    }

    if explain {
        let scores = predictor.categories().scores(&text);
        let best = scores.first().map(|(_, s)| *s).unwrap_or(0.0);
        let mut table = Table::new();
        table.set_header(vec!["Category", "Log score", "Odds vs best"]);
        for (label, score) in &scores {
            table.add_row(vec![
                Cell::new(label),
                Cell::new(format!("{score:.3}")),
                Cell::new(format!("1:{:.2}", (best - score).exp())),
            ]);
        }
        println!("{table}");
    }
    Ok(())
}

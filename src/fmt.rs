/// Format an amount the Norwegian way, space-grouped with a decimal comma: -1 234,56
pub fn kroner(val: f64) -> String {
    let negative = val < 0.0;
    let ore = format!("{:.2}", val.abs());
    let (int_part, dec_part) = ore.split_once('.').unwrap_or((ore.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative && ore != "0.00" {
        format!("-{grouped},{dec_part}")
    } else {
        format!("{grouped},{dec_part}")
    }
}

/// Empty amounts render as an empty table cell.
pub fn kroner_opt(val: Option<f64>) -> String {
    val.map(kroner).unwrap_or_default()
}

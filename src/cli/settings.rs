use comfy_table::{Cell, Table};

use crate::settings::{load_settings, save_settings, settings_path, Settings};

pub struct Changes {
    pub category_confidence: Option<f64>,
    pub strict_category_confidence: Option<f64>,
    pub tag_confidence: Option<f64>,
    pub tag_relative_threshold: Option<f64>,
}

impl Changes {
    fn is_empty(&self) -> bool {
        self.category_confidence.is_none()
            && self.strict_category_confidence.is_none()
            && self.tag_confidence.is_none()
            && self.tag_relative_threshold.is_none()
    }

    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = self.category_confidence {
            settings.category_confidence = v;
        }
        if let Some(v) = self.strict_category_confidence {
            settings.strict_category_confidence = v;
        }
        if let Some(v) = self.tag_confidence {
            settings.tag_confidence = v;
        }
        if let Some(v) = self.tag_relative_threshold {
            settings.tag_relative_threshold = v;
        }
    }
}

pub fn run(changes: Changes) -> anyhow::Result<()> {
    let mut settings = load_settings();
    if !changes.is_empty() {
        changes.apply(&mut settings);
        save_settings(&settings)?;
        println!("Saved settings to {}", settings_path().display());
    }

    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    for (name, value) in [
        ("category_confidence", settings.category_confidence),
        ("strict_category_confidence", settings.strict_category_confidence),
        ("tag_confidence", settings.tag_confidence),
        ("tag_relative_threshold", settings.tag_relative_threshold),
    ] {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    println!("{table}");
    Ok(())
}

pub mod document;
pub mod text;

use anyhow::Result;

use crate::model::{ExtractionResult, Settings};

/// Export-time options: the stored settings resolved against the extraction
/// result (client name falls back to the scraped one).
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub client_name: String,
    pub water_goal: String,
    pub include_notes: bool,
    pub include_swaps: bool,
}

impl ExportOptions {
    pub fn resolve(settings: &Settings, result: &ExtractionResult) -> ExportOptions {
        let client_name = settings
            .client_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| {
                if result.client_name.trim().is_empty() {
                    "Client".to_string()
                } else {
                    result.client_name.clone()
                }
            });
        ExportOptions {
            client_name,
            water_goal: settings.water_goal.clone(),
            include_notes: settings.include_notes,
            include_swaps: settings.include_swaps,
        }
    }
}

/// Pretty-printed JSON of the full result, the shape downstream tooling
/// already reads.
pub fn to_json(result: &ExtractionResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Download-style file name: client name with whitespace underscored.
pub fn file_name(client_name: &str, suffix: &str) -> String {
    let base = client_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    let base = if base.is_empty() { "meal_plan".to_string() } else { base };
    format!("{}{}", base, suffix)
}

//! Presentation: text and JSON formatters for command results.

use crate::diff::ChangedPaths;
use crate::error::ApiError;
use crate::patch::{Action, ApplySummary, Patch};
use crate::store::SignatureRecord;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::StorageError(crate::error::StorageError::Serialization(e.to_string())))
}

pub fn format_changed_paths_text(changed: &ChangedPaths) -> String {
    if changed.is_empty() {
        return "No changes.".to_string();
    }
    let mut lines = Vec::with_capacity(changed.len() + 1);
    for path in &changed.removed {
        lines.push(format!("{} {}", "-".red(), path));
    }
    for path in &changed.updated {
        lines.push(format!("{} {}", "~".yellow(), path));
    }
    for path in &changed.added {
        lines.push(format!("{} {}", "+".green(), path));
    }
    lines.push(format!(
        "\n{} added, {} updated, {} removed",
        changed.added.len(),
        changed.updated.len(),
        changed.removed.len()
    ));
    lines.join("\n")
}

pub fn format_changed_paths_json(changed: &ChangedPaths) -> Result<String, ApiError> {
    to_json(changed)
}

pub fn format_patches_text(patches: &[Patch]) -> String {
    if patches.is_empty() {
        return "No model code patches.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Action", "Path", "Bytes"]);
    for patch in patches {
        let Patch::ModelCode(body) = patch;
        let action = match body.action() {
            Action::Update => "UPDATE",
            Action::Remove => "REMOVE",
        };
        let bytes = body
            .content()
            .map(|c| c.len().to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![action.to_string(), body.path().to_string(), bytes]);
    }
    format!("{}\n{} patch(es)", table, patches.len())
}

pub fn format_apply_summary(summary: &ApplySummary) -> String {
    let mut out = format!(
        "Applied patches: {} updated, {} removed",
        summary.updated.len(),
        summary.removed.len()
    );
    if !summary.missing.is_empty() {
        out.push_str(&format!(
            "\n{} {} path(s) to remove were already absent:",
            "warning:".yellow().bold(),
            summary.missing.len()
        ));
        for path in &summary.missing {
            out.push_str(&format!("\n  - {}", path));
        }
    }
    out
}

pub fn format_store_list_text(records: &[(String, SignatureRecord)]) -> String {
    if records.is_empty() {
        return "No signatures recorded.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Files", "Recorded At"]);
    for (key, record) in records {
        let recorded_at = record
            .recorded_at()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![key.clone(), record.signature.len().to_string(), recorded_at]);
    }
    table.to_string()
}

pub fn format_store_list_json(records: &[(String, SignatureRecord)]) -> Result<String, ApiError> {
    let rows: Vec<serde_json::Value> = records
        .iter()
        .map(|(key, record)| {
            serde_json::json!({
                "key": key,
                "files": record.signature.len(),
                "recorded_at_ms": record.recorded_at_ms,
            })
        })
        .collect();
    to_json(&rows)
}

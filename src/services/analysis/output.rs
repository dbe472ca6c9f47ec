//! Output Validation and Normalization
//!
//! Extracts the JSON report from the toolchain's noisy stdout, parses it,
//! checks structural expectations, and normalizes legacy camelCase field
//! spellings into the canonical snake_case names downstream consumers use.

use serde_json::Value;
use tracing::warn;

use crate::models::analysis::{AnalysisIssue, AnalysisKind, AnalysisWarning};
use crate::utils::error::{AnalysisError, AnalysisResult};

/// Known alternate spellings, normalized to the canonical snake_case form.
/// The toolchain emitted camelCase in older releases; both are accepted.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("linesAdded", "lines_added"),
    ("linesRemoved", "lines_removed"),
    ("commitCount", "commit_count"),
    ("techStack", "tech_stack"),
    ("moduleGraph", "module_graph"),
    ("functionGraph", "function_graph"),
    ("referencedBy", "referenced_by"),
    ("firstCommit", "first_commit"),
    ("lastCommit", "last_commit"),
    ("totalLines", "total_lines"),
];

/// A parsed, normalized toolchain report
#[derive(Debug, Clone)]
pub struct ParsedOutput {
    /// Whether the payload declared success (defaults to true when absent)
    pub success: bool,
    /// The normalized report payload
    pub data: Value,
    /// Errors the toolchain reported inside the payload
    pub errors: Vec<AnalysisIssue>,
    /// Warnings the toolchain reported inside the payload
    pub warnings: Vec<AnalysisWarning>,
    /// Advisory findings about missing/malformed report sections. Logged,
    /// never fatal; a partially-populated report is still useful.
    pub structural_warnings: Vec<String>,
}

/// Extract the JSON span from raw toolchain output.
///
/// The span runs from the first `{` to the last `}`; banner and log text
/// outside it is discarded. Fails when no such span exists or the braces are
/// out of order.
pub fn extract_json_span(raw: &str) -> AnalysisResult<&str> {
    let start = raw.find('{');
    let end = raw.rfind('}');

    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&raw[start..=end]),
        _ => Err(AnalysisError::malformed_output(
            "No JSON object found in analysis output".to_string(),
        )),
    }
}

/// Parse raw toolchain output into a normalized report.
///
/// Parse failures are terminal and never retried. Structural validation is
/// advisory: findings are collected and logged but never block the result.
pub fn parse_output(raw: &str, kind: AnalysisKind) -> AnalysisResult<ParsedOutput> {
    let span = extract_json_span(raw)?;

    let value: Value = serde_json::from_str(span).map_err(|e| {
        AnalysisError::malformed_output(format!("Analysis output is not valid JSON: {}", e))
    })?;

    let mut value = normalize_keys(value);

    let structural_warnings = structural_findings(&value, kind);
    for finding in &structural_warnings {
        warn!(kind = kind.label(), finding = %finding, "report section check");
    }

    let success = value
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let errors = take_entries(&mut value, "errors");
    let warnings = take_entries(&mut value, "warnings");

    Ok(ParsedOutput {
        success,
        data: value,
        errors,
        warnings,
        structural_warnings,
    })
}

/// Recursively rename known alternate keys to their canonical spelling.
/// A canonical key already present wins over its alias.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut normalized = serde_json::Map::with_capacity(map.len());
            for (key, inner) in map {
                let canonical = KEY_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == key)
                    .map(|(_, canonical)| canonical.to_string())
                    .unwrap_or(key);
                let inner = normalize_keys(inner);
                normalized.entry(canonical).or_insert(inner);
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Advisory structural checks for report kinds with a fixed section contract.
/// Git analytics and schema payloads have no fixed top-level shape.
fn structural_findings(value: &Value, kind: AnalysisKind) -> Vec<String> {
    let mut findings = Vec::new();

    if !matches!(kind, AnalysisKind::Project | AnalysisKind::File) {
        return findings;
    }

    if value.get("tech_stack").is_none() {
        findings.push("missing tech_stack section".to_string());
    }
    for section in ["modules", "functions"] {
        match value.get(section) {
            None => findings.push(format!("missing {} section", section)),
            Some(graph) => {
                for part in ["nodes", "edges"] {
                    if !graph.get(part).is_some_and(Value::is_array) {
                        findings.push(format!("{} section has no {} list", section, part));
                    }
                }
            }
        }
    }

    findings
}

/// Lift a typed entry list (`errors` or `warnings`) out of the payload.
/// Entries that do not match the expected shape are kept as generic
/// messages rather than dropped.
fn take_entries<T: serde::de::DeserializeOwned + FromMessage>(
    value: &mut Value,
    field: &str,
) -> Vec<T> {
    let Some(entries) = value.as_object_mut().and_then(|obj| obj.remove(field)) else {
        return Vec::new();
    };
    let Value::Array(entries) = entries else {
        return Vec::new();
    };

    entries
        .into_iter()
        .map(|entry| match serde_json::from_value::<T>(entry.clone()) {
            Ok(parsed) => parsed,
            Err(_) => T::from_message(entry_message(&entry)),
        })
        .collect()
}

/// Fallback construction for entries that are bare strings or odd shapes
trait FromMessage {
    fn from_message(message: String) -> Self;
}

impl FromMessage for AnalysisIssue {
    fn from_message(message: String) -> Self {
        AnalysisIssue::new("analysis_error", message)
    }
}

impl FromMessage for AnalysisWarning {
    fn from_message(message: String) -> Self {
        AnalysisWarning::new("analysis_warning", message)
    }
}

fn entry_message(entry: &Value) -> String {
    match entry {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//! Report assembly: a console block for the terminal and a structured
//! payload for the report view and the JSON file.

use crate::config::Config;
use crate::engine::validator::parse_instant;
use crate::pipeline::{RunFailure, RunResult};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    pub source_url: String,
    pub max_retries: u32,
    pub navigation_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub position: usize,
    pub title: String,
    pub timestamp: String,
    pub relative_age_text: String,
    pub is_violation: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub passed: bool,
    pub item_count: usize,
    pub target_count: u32,
    pub violation_count: usize,
    pub duration_seconds: f64,
    pub generated_at: String,
    pub config_snapshot: ConfigSnapshot,
    pub failure: Option<RunFailure>,
    pub rows: Vec<ReportRow>,
}

impl ReportPayload {
    /// Both items of every violating pair are flagged.
    pub fn assemble(result: &RunResult, config: &Config) -> Self {
        let flagged: HashSet<usize> = result
            .violations
            .iter()
            .flat_map(|v| [v.position, v.position + 1])
            .collect();

        let rows = result
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| ReportRow {
                position: i + 1,
                title: item.title.clone(),
                timestamp: item.timestamp.clone(),
                relative_age_text: item.relative_age.clone(),
                is_violation: flagged.contains(&(i + 1)),
            })
            .collect();

        Self {
            passed: result.passed(),
            item_count: result.items.len(),
            target_count: config.target_count,
            violation_count: result.violations.len(),
            duration_seconds: result.duration_ms as f64 / 1000.0,
            generated_at: chrono::Utc::now().to_rfc3339(),
            config_snapshot: ConfigSnapshot {
                source_url: config.source_url.clone(),
                max_retries: config.max_retries,
                navigation_timeout_ms: config.navigation_timeout_ms,
            },
            failure: result.failure.clone(),
            rows,
        }
    }
}

/// Oldest and newest timestamps by instant, as the raw strings.
fn time_span(result: &RunResult) -> Option<(&str, &str)> {
    let parsed = result
        .items
        .iter()
        .filter_map(|i| parse_instant(&i.timestamp).map(|t| (t, i.timestamp.as_str())));
    let (mut oldest, mut newest) = (None, None);
    for (t, raw) in parsed {
        if oldest.map_or(true, |(o, _)| t < o) {
            oldest = Some((t, raw));
        }
        if newest.map_or(true, |(n, _)| t > n) {
            newest = Some((t, raw));
        }
    }
    Some((oldest?.1, newest?.1))
}

/// Human-readable summary printed after every run.
pub fn render_console(result: &RunResult, config: &Config) -> String {
    let mut out = String::new();
    let verdict = if result.passed() { "PASS" } else { "FAIL" };

    let _ = writeln!(out);
    let _ = writeln!(out, "  Listing order check: {}", config.source_url);
    let _ = writeln!(out, "  ========================================");
    let _ = writeln!(
        out,
        "  Items collected : {} / {}",
        result.items.len(),
        config.target_count
    );
    let _ = writeln!(
        out,
        "  Elapsed         : {:.2}s",
        result.duration_ms as f64 / 1000.0
    );
    match time_span(result) {
        Some((oldest, newest)) => {
            let _ = writeln!(out, "  Newest          : {}", newest);
            let _ = writeln!(out, "  Oldest          : {}", oldest);
        }
        None => {
            let _ = writeln!(out, "  Newest          : -");
            let _ = writeln!(out, "  Oldest          : -");
        }
    }
    let _ = writeln!(out, "  Verdict         : {}", verdict);

    if let Some(failure) = &result.failure {
        let _ = writeln!(out, "  Incomplete run  : {}", failure);
    }
    if !result.violations.is_empty() {
        let _ = writeln!(out, "  Violations ({}):", result.violations.len());
        for v in &result.violations {
            let _ = writeln!(
                out,
                "    #{} {:?}: {} is older than #{} {}",
                v.position,
                v.item.title,
                v.item.timestamp,
                v.position + 1,
                v.next_item.timestamp
            );
        }
    }
    out
}

/// Persist the payload as pretty JSON, creating parent directories.
pub async fn write_report(path: &Path, payload: &ReportPayload) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(payload).context("Failed to serialize report")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

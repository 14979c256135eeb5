// conform-core/src/application/output.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::report::RunReport;
use crate::domain::analytic::AnalyticConfig;
use crate::error::ConformError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::{atomic_write, sanitize_file_component};

/// Writes the main report as `QA_<id>_Main_<timestamp>.json`.
#[instrument(skip(report), fields(analytic = %report.analytic_id))]
pub fn write_report(report: &RunReport, out_dir: &Path) -> Result<PathBuf, ConformError> {
    let name = format!(
        "QA_{}_Main_{}.json",
        sanitize_file_component(&report.analytic_id),
        report.as_of.format("%Y%m%d_%H%M%S")
    );
    let path = out_dir.join(name);
    write_json(&path, report)?;
    info!(path = ?path, "Report written");
    Ok(path)
}

/// One `QA_<id>_<group>_<date>.json` per group. The ungrouped bucket gets no
/// file of its own.
#[instrument(skip(report, config), fields(analytic = %report.analytic_id))]
pub fn write_group_reports(
    report: &RunReport,
    config: &AnalyticConfig,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ConformError> {
    let date = report.as_of.format("%Y%m%d");
    let id = sanitize_file_component(&report.analytic_id);
    let mut written = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();

    for (position, group) in report.summary.groups.iter().enumerate() {
        if group.group.is_ungrouped() {
            continue;
        }
        let Some(group_report) = report.for_group(config, &group.group) else {
            continue;
        };
        // Distinct groups may sanitize to the same name
        let base = sanitize_file_component(group.group.label());
        let mut stem = base.clone();
        let mut n = position + 1;
        while !taken.insert(stem.clone()) {
            stem = format!("{base}_{n}");
            n += 1;
        }
        if stem != base {
            warn!(group = %group.group.label(), file_stem = %stem, "Group file name collides, suffixed");
        }
        let path = out_dir.join(format!("QA_{id}_{stem}_{date}.json"));
        write_json(&path, &group_report)?;
        written.push(path);
    }
    info!(files = written.len(), "Individual reports written");
    Ok(written)
}

fn write_json(path: &Path, report: &RunReport) -> Result<(), ConformError> {
    let json = serde_json::to_string_pretty(report).map_err(InfrastructureError::JsonError)?;
    atomic_write(path, json)?;
    Ok(())
}

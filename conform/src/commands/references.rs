// conform/src/commands/references.rs
//
// USE CASE: Freshness report of every declared reference table.

use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use futures::future::join_all;
use std::path::PathBuf;

use conform_core::domain::reference::{FreshnessStatus, ReferenceBinder, ReferenceCache, ReferenceSet};
use conform_core::infrastructure::adapters::{FileReferenceLoader, MemoryAuditSink};

pub async fn execute(project_dir: PathBuf, as_of: Option<DateTime<Utc>>) -> anyhow::Result<()> {
    let project = super::load(&project_dir)?;
    let catalog = &project.references;
    if catalog.reference_files.is_empty() {
        println!("   No reference tables declared.");
        return Ok(());
    }

    // Status only: staleness events stay out of the audit log.
    let cache = ReferenceCache::new();
    let loader = FileReferenceLoader::new();
    let audit = MemoryAuditSink::new();
    let binder = ReferenceBinder::new(catalog, &cache, &loader, &audit, as_of.unwrap_or_else(Utc::now))
        .with_timeout(project.reference_timeout());

    let bound: ReferenceSet = join_all(
        catalog
            .reference_files
            .keys()
            .map(|name| binder.bind(name, None)),
    )
    .await
    .into_iter()
    .collect();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Table", "Version", "Status", "Age (days)", "Max Age", "Rows", "Note"]);

    let mut problems = 0;
    for status in bound.statuses() {
        let icon = match status.status {
            FreshnessStatus::Fresh => "✅ fresh",
            FreshnessStatus::Stale => {
                problems += 1;
                "⚠️  stale"
            }
            FreshnessStatus::Unavailable => {
                problems += 1;
                "❌ unavailable"
            }
        };
        table.add_row(vec![
            status.name.clone(),
            status.version.clone(),
            icon.to_string(),
            status
                .age_days
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
            status.max_age_days.to_string(),
            status.row_count.to_string(),
            status.reason.clone().unwrap_or_default(),
        ]);
    }
    println!("{table}");

    if problems > 0 {
        println!("   {problems} table(s) need attention.");
    }
    Ok(())
}

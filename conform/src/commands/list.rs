// conform/src/commands/list.rs
//
// USE CASE: List analytics or the rule library.

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::path::PathBuf;

use conform_core::domain::rules::RuleRegistry;

pub fn execute(project_dir: PathBuf, rules: bool) -> anyhow::Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    if rules {
        let registry = RuleRegistry::with_builtin_rules();
        table.set_header(vec!["Rule", "Description"]);
        for rule in registry.iter() {
            table.add_row(vec![rule.name(), rule.description()]);
        }
        println!("{table}");
        return Ok(());
    }

    let project = super::load(&project_dir)?;
    if project.analytics.is_empty() {
        println!("   No analytics configured.");
        return Ok(());
    }

    table.set_header(vec!["ID", "Name", "Rules", "Group By", "Threshold (%)", "Data Source"]);
    for config in project.analytics.values() {
        table.add_row(vec![
            config.analytic_id.clone(),
            config.analytic_name.clone(),
            config.validations.len().to_string(),
            config.reporting.group_by.clone(),
            format!("{:.2}", config.thresholds.error_percentage),
            project
                .data_sources
                .source_for(config)
                .unwrap_or("-")
                .to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

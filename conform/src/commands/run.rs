// conform/src/commands/run.rs
//
// USE CASE: Run analytics over one input file and write the reports.

use anyhow::Context;
use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use conform_core::application::{
    BatchJob, RunContext, RunInput, RunReport, run_batch, write_group_reports, write_report,
};
use conform_core::domain::reference::ReferenceCache;
use conform_core::domain::rules::RuleRegistry;
use conform_core::infrastructure::adapters::{FileReferenceLoader, JsonlAuditSink, read_csv_table};
use conform_core::infrastructure::config::reference::DEFAULT_AUDIT_LOG;

pub struct RunArgs {
    pub project_dir: PathBuf,
    pub analytics: Vec<String>,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub as_of: Option<DateTime<Utc>>,
    pub individual_reports: bool,
    pub timeout_secs: Option<u64>,
}

pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    // A. Load the Config (Infra)
    let project = super::load(&args.project_dir)?;
    let configs = args
        .analytics
        .iter()
        .map(|id| project.analytic(id))
        .collect::<Result<Vec<_>, _>>()?;

    // B. Read the input once
    println!("📥 Reading {}...", args.input.display());
    let raw = read_csv_table(&args.input)
        .with_context(|| format!("Failed to read input file {:?}", args.input))?;
    println!("   {} records, {} columns", raw.len(), raw.headers.len());

    // C. Wire the adapters
    let registry = RuleRegistry::with_builtin_rules();
    let cache = ReferenceCache::new();
    let loader = FileReferenceLoader::new();
    let audit_path = project
        .references
        .audit_log_path
        .clone()
        .unwrap_or_else(|| project.root.join(DEFAULT_AUDIT_LOG));
    let audit = JsonlAuditSink::new(audit_path);
    let ctx = RunContext {
        registry: &registry,
        catalog: &project.references,
        cache: &cache,
        loader: &loader,
        audit: &audit,
        as_of: args.as_of.unwrap_or_else(Utc::now),
        reference_timeout: args
            .timeout_secs
            .map(Duration::from_secs)
            .or_else(|| project.reference_timeout()),
    };

    let mappings: Vec<_> = configs.iter().map(|c| project.mappings_for(c)).collect();
    let source_file = args.input.display().to_string();
    let jobs: Vec<BatchJob> = configs
        .iter()
        .copied()
        .zip(&mappings)
        .map(|(config, mappings)| BatchJob {
            config,
            input: RunInput {
                raw: &raw,
                mappings,
                source_file: Some(&source_file),
            },
        })
        .collect();

    debug!(as_of = %ctx.as_of, timeout = ?ctx.reference_timeout, "Run context ready");

    // D. Run (Application Layer)
    println!("🟢 Evaluating {} analytic(s)...", jobs.len());
    let outcomes = run_batch(ctx, &jobs).await;

    // E. Persist
    let out_dir = args.output.clone().unwrap_or_else(|| project.output_dir());
    let mut failures = 0;
    for (outcome, config) in outcomes.into_iter().zip(&configs) {
        match outcome.result {
            Ok(report) => {
                print_summary(&report);
                let path = write_report(&report, &out_dir)?;
                println!("   📄 {}", path.display());
                if args.individual_reports {
                    let files = write_group_reports(&report, config, &out_dir)?;
                    println!("   📁 {} individual report(s)", files.len());
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("\n❌ QA-{} failed:", outcome.analytic_id);
                eprintln!("{:?}", miette::Report::new(e));
            }
        }
    }

    if failures > 0 {
        eprintln!("\n❌ FAILURE. {failures} analytic(s) could not run.");
        std::process::exit(1);
    }
    println!("\n✨ SUCCESS! Finished in {:.2?}", start.elapsed());
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!(
        "\n📊 QA-{} {} ({} records)",
        report.analytic_id, report.analytic_name, report.records
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(report.summary.header(&report.group_by));
    for row in report.summary.rows() {
        table.add_row(row);
    }
    println!("{table}");

    for warning in &report.warnings {
        println!("   ⚠️  {warning}");
    }
}

// conform-core/src/application/engine.rs

use chrono::{DateTime, Utc};
use futures::future::join_all;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{info, instrument, warn};

use super::report::{RuleStats, RunReport, RunWarning};
use crate::domain::analytic::AnalyticConfig;
use crate::domain::classification::classify_batch;
use crate::domain::error::DomainError;
use crate::domain::reference::{
    BindState, ReferenceBinder, ReferenceCache, ReferenceCatalog, ReferenceSet,
};
use crate::domain::report::{ConfigurationSheet, ReportSummary, SheetContext, aggregate};
use crate::domain::rules::{RuleContext, RuleEvaluation, RuleRegistry, evaluate_rule};
use crate::domain::schema::{ColumnMapping, RawTable, Resolution, SchemaResolver};
use crate::error::ConformError;
use crate::ports::{AuditSink, ReferenceLoader};

/// Collaborators shared by every run of a process.
#[derive(Clone, Copy)]
pub struct RunContext<'a> {
    pub registry: &'a RuleRegistry,
    pub catalog: &'a ReferenceCatalog,
    pub cache: &'a ReferenceCache,
    pub loader: &'a dyn ReferenceLoader,
    pub audit: &'a dyn AuditSink,
    /// The run's "now": reference ages and the report date derive from it.
    pub as_of: DateTime<Utc>,
    pub reference_timeout: Option<Duration>,
}

/// Raw input of one run.
#[derive(Debug, Clone, Copy)]
pub struct RunInput<'a> {
    pub raw: &'a RawTable,
    pub mappings: &'a [ColumnMapping],
    pub source_file: Option<&'a str>,
}

/// Runs one analytic over one batch.
///
/// Configuration, schema and unresolved-field errors abort before any record
/// is evaluated. Everything else degrades into warnings on the report.
#[instrument(skip_all, fields(analytic = %config.analytic_id, records = input.raw.len()))]
pub async fn run_analytic(
    ctx: RunContext<'_>,
    config: &AnalyticConfig,
    input: RunInput<'_>,
) -> Result<RunReport, ConformError> {
    let start = Instant::now();

    // 1. CONFIGURATION
    config.validate_against(ctx.registry, ctx.catalog)?;

    // 2. SCHEMA
    let resolution = SchemaResolver::new(input.mappings)
        .resolve(input.raw, &config.data_source.required_fields)?;
    let table = &resolution.table;

    let unresolved: Vec<String> = config
        .referenced_fields(ctx.registry)
        .into_iter()
        .filter(|field| !table.has_column(field))
        .collect();
    if !unresolved.is_empty() {
        return Err(DomainError::UnresolvedFields {
            analytic: config.analytic_id.clone(),
            fields: unresolved,
        }
        .into());
    }

    // 3. REFERENCE DATA
    let binder = ReferenceBinder::new(ctx.catalog, ctx.cache, ctx.loader, ctx.audit, ctx.as_of)
        .with_timeout(ctx.reference_timeout);
    let tables = config.referenced_tables(ctx.registry);
    let references: ReferenceSet = join_all(
        tables
            .iter()
            .map(|(name, override_days)| binder.bind(name, *override_days)),
    )
    .await
    .into_iter()
    .collect();

    // 4. RULES (independent, merged back in configuration order)
    let rule_ctx = RuleContext::new(&references, config.stale_reference_policy);
    let labels = config.rule_labels();
    let evaluations: Vec<RuleEvaluation> = off_reactor(|| {
        labels
            .par_iter()
            .zip(config.validations.par_iter())
            .map(|(label, spec)| {
                ctx.registry.get(&spec.rule).map(|rule| {
                    evaluate_rule(label, rule.as_ref(), &spec.parameters, table, &rule_ctx)
                })
            })
            .collect::<Result<_, _>>()
    })
    .map_err(|e| ConformError::InternalError(e.to_string()))?;

    // 5. CLASSIFICATION + AGGREGATION
    let classifications = classify_batch(table.len(), &evaluations);
    let threshold = config.thresholds.error_percentage;
    let aggregation = aggregate(
        table,
        &classifications,
        &config.reporting.group_by,
        &config.reporting.summary_fields,
        threshold,
    );

    // 6. REPORT
    let warnings = collect_warnings(&resolution, &references, &evaluations, &aggregation.summary, threshold);
    let warning_lines: Vec<String> = warnings.iter().map(ToString::to_string).collect();
    let configuration = ConfigurationSheet::build(
        config,
        SheetContext {
            as_of: ctx.as_of,
            source_file: input.source_file,
            warnings: &warning_lines,
            group: None,
            counts: &aggregation.summary.overall,
        },
    );

    let overall = &aggregation.summary.overall;
    info!(
        gc = overall.gc,
        pc = overall.pc,
        dnc = overall.dnc,
        dnc_pct = overall.dnc_percentage,
        warnings = warnings.len(),
        duration = ?start.elapsed(),
        "Analytic evaluated"
    );
    if aggregation.summary.any_exceeds_threshold() {
        warn!(threshold, "DNC threshold exceeded");
    }

    Ok(RunReport {
        analytic_id: config.analytic_id.clone(),
        analytic_name: config.analytic_name.clone(),
        as_of: ctx.as_of,
        source_file: input.source_file.map(str::to_string),
        group_by: config.reporting.group_by.clone(),
        threshold,
        records: table.len(),
        rule_stats: evaluations.iter().map(RuleStats::from).collect(),
        references: references.statuses(),
        detail: config.reporting.detail_required.then_some(aggregation.detail),
        summary: aggregation.summary,
        warnings,
        configuration,
    })
}

/// Runs CPU-bound work without stalling the async worker. A current-thread
/// runtime cannot give up its only worker, so the work runs inline there.
fn off_reactor<R>(work: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

fn collect_warnings(
    resolution: &Resolution,
    references: &ReferenceSet,
    evaluations: &[RuleEvaluation],
    summary: &ReportSummary,
    threshold: f64,
) -> Vec<RunWarning> {
    let mut warnings = Vec::new();

    let mut coercions: IndexMap<&str, RunWarning> = IndexMap::new();
    for issue in &resolution.issues {
        coercions
            .entry(issue.column.as_str())
            .and_modify(|w| {
                if let RunWarning::CoercionFailures { count, .. } = w {
                    *count += 1;
                }
            })
            .or_insert_with(|| RunWarning::CoercionFailures {
                column: issue.column.clone(),
                expected: issue.expected,
                count: 1,
                first_row: issue.row,
            });
    }
    warnings.extend(coercions.into_values());

    warnings.extend(
        resolution
            .shadowed
            .iter()
            .map(|header| RunWarning::ShadowedColumn {
                header: header.clone(),
            }),
    );

    for bound in references.iter() {
        match &bound.state {
            BindState::Fresh => {}
            BindState::Stale => warnings.push(RunWarning::StaleReference {
                table: bound.name.clone(),
                age_days: bound.age_days.unwrap_or_default(),
                max_age_days: bound.max_age_days,
            }),
            BindState::Unavailable { reason } => warnings.push(RunWarning::ReferenceUnavailable {
                table: bound.name.clone(),
                reason: reason.clone(),
            }),
        }
    }

    warnings.extend(evaluations.iter().filter_map(|e| {
        e.error.as_ref().map(|err| RunWarning::RuleFailed {
            rule: e.label.clone(),
            reason: err.to_string(),
        })
    }));

    warnings.extend(
        summary
            .groups
            .iter()
            .filter(|g| g.counts.exceeds_threshold)
            .map(|g| RunWarning::ThresholdExceeded {
                group: g.group.clone(),
                dnc_percentage: g.counts.dnc_percentage,
                threshold,
            }),
    );

    warnings
}

// conform-core/src/application/batch.rs

use futures::StreamExt;
use tracing::{error, info, instrument};

use super::engine::{RunContext, RunInput, run_analytic};
use super::report::RunReport;
use crate::domain::analytic::AnalyticConfig;
use crate::error::ConformError;

const MAX_CONCURRENT_RUNS: usize = 4;

pub struct BatchJob<'a> {
    pub config: &'a AnalyticConfig,
    pub input: RunInput<'a>,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub analytic_id: String,
    pub result: Result<RunReport, ConformError>,
}

/// Runs every job against the same reference cache and audit sink.
///
/// A failing job never stops the others. Outcomes come back in job order.
#[instrument(skip_all, fields(jobs = jobs.len()))]
pub async fn run_batch(ctx: RunContext<'_>, jobs: &[BatchJob<'_>]) -> Vec<BatchOutcome> {
    let runs = jobs.iter().map(|job| async move {
        let result = run_analytic(ctx, job.config, job.input).await;
        if let Err(e) = &result {
            error!(analytic = %job.config.analytic_id, error = %e, "❌ Analytic run failed");
        }
        BatchOutcome {
            analytic_id: job.config.analytic_id.clone(),
            result,
        }
    });

    let outcomes: Vec<BatchOutcome> = futures::stream::iter(runs)
        .buffered(MAX_CONCURRENT_RUNS)
        .collect()
        .await;

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(total = outcomes.len(), failed, "Batch finished");
    outcomes
}

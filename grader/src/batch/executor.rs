//! @ai:module:intent Concurrent batch evaluation over a bounded worker pool
//! @ai:module:layer application
//! @ai:module:public_api BatchAggregator
//! @ai:module:depends_on evaluator, batch::stats
//! @ai:module:stateless false

use crate::batch::stats;
use crate::batch::types::{BatchEntry, BatchReport, Submission};
use crate::config::{BatchConfig, LimitsConfig};
use crate::evaluator::{ScenarioEvaluatorTrait, ScoredResult};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// @ai:intent Runs submissions through an evaluator and aggregates the results
pub struct BatchAggregator<E: ScenarioEvaluatorTrait + 'static> {
    evaluator: Arc<E>,
    workers: usize,
    max_source_bytes: usize,
}

impl<E: ScenarioEvaluatorTrait + 'static> BatchAggregator<E> {
    /// @ai:intent Create an aggregator with the default worker count and limits
    /// @ai:effects pure
    pub fn new(evaluator: Arc<E>) -> Self {
        Self::with_config(evaluator, &BatchConfig::default(), &LimitsConfig::default())
    }

    /// @ai:intent Create an aggregator from batch and limit configuration
    /// @ai:effects pure
    pub fn with_config(evaluator: Arc<E>, batch: &BatchConfig, limits: &LimitsConfig) -> Self {
        Self {
            evaluator,
            workers: batch.workers.max(1),
            max_source_bytes: limits.max_source_bytes,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// @ai:intent Evaluate every submission and build the batch report
    /// @ai:post report.entries.len() == submissions.len(), in submission order
    /// @ai:effects fs:read
    pub async fn run(&self, submissions: Vec<Submission>) -> BatchReport {
        let total = submissions.len();
        tracing::info!(
            "Evaluating {} submissions with {} workers",
            total,
            self.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set = JoinSet::new();

        for (idx, submission) in submissions.iter().cloned().enumerate() {
            let evaluator = Arc::clone(&self.evaluator);
            let semaphore = Arc::clone(&semaphore);
            let max_bytes = self.max_source_bytes;

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let submission_id = submission.id();
                let scenario_id = submission.scenario_id.clone();

                let outcome = tokio::task::spawn_blocking(move || {
                    evaluate_submission(evaluator.as_ref(), &submission, max_bytes)
                })
                .await;

                let result = outcome.unwrap_or_else(|e| {
                    ScoredResult::failed(
                        &scenario_id,
                        &submission_id,
                        format!("evaluation panicked: {}", e),
                    )
                });
                (idx, result)
            });
        }

        let mut slots: Vec<Option<ScoredResult>> = vec![None; total];
        let mut completed = 0;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    completed += 1;
                    tracing::info!(
                        "[{}/{}] {} / {}: {}",
                        completed,
                        total,
                        result.submission_id(),
                        result.scenario_id(),
                        match result.failure() {
                            Some(reason) => format!("failed ({})", reason),
                            None => format!("{:.1}", result.total_score()),
                        }
                    );
                    slots[idx] = Some(result);
                }
                Err(e) => tracing::warn!("Batch task did not complete: {}", e),
            }
        }

        let entries: Vec<BatchEntry> = submissions
            .into_iter()
            .zip(slots)
            .map(|(submission, slot)| {
                let result = slot.unwrap_or_else(|| {
                    ScoredResult::failed(
                        &submission.scenario_id,
                        submission.id(),
                        "evaluation task did not complete",
                    )
                });
                BatchEntry {
                    tool_id: submission.tool_id,
                    result,
                }
            })
            .collect();

        build_report(entries)
    }
}

/// @ai:intent Load and score one submission, turning every error into a failed result
/// @ai:effects fs:read
fn evaluate_submission<E: ScenarioEvaluatorTrait + ?Sized>(
    evaluator: &E,
    submission: &Submission,
    max_bytes: usize,
) -> ScoredResult {
    let submission_id = submission.id();
    let outcome = submission.load(max_bytes).and_then(|source| {
        evaluator.evaluate(&submission_id, &source, &submission.scenario_id)
    });

    outcome.unwrap_or_else(|e| {
        tracing::warn!(
            "Submission {} on {} failed: {}",
            submission_id,
            submission.scenario_id,
            e
        );
        ScoredResult::failed(&submission.scenario_id, &submission_id, e.to_string())
    })
}

/// @ai:intent Compute statistics and rankings over ordered entries
/// @ai:effects pure
pub fn build_report(entries: Vec<BatchEntry>) -> BatchReport {
    let tool_stats = stats::tool_stats(&entries);
    let ranking = stats::rank_tools(&tool_stats);

    BatchReport {
        generated_at: chrono::Utc::now(),
        scenario_stats: stats::scenario_stats(&entries),
        module_usage: stats::module_usage(&entries),
        tool_stats,
        ranking,
        entries,
    }
}

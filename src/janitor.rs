//! Percentile-based corpus eviction driven by survival score.

use std::sync::Arc;

use anyhow::Result;

use crate::config::JanitorConfig;
use crate::models::PruneReport;
use crate::search::lexical::LexicalIndex;
use crate::store::IssueStore;

/// Periodic maintenance job that bounds corpus growth by deleting the lowest
/// scoring slice of issues. No per-row TTL bookkeeping: one percentile
/// aggregate and one bulk delete per run.
pub struct Janitor {
    store: Arc<IssueStore>,
    lexical: Arc<LexicalIndex>,
    config: JanitorConfig,
}

impl Janitor {
    pub fn new(store: Arc<IssueStore>, lexical: Arc<LexicalIndex>, config: JanitorConfig) -> Self {
        Self {
            store,
            lexical,
            config,
        }
    }

    /// Run one pruning pass. Errors propagate to the job orchestrator;
    /// a failed run is never retried here since pruning twice against stale
    /// state could over-delete.
    pub fn execute_pruning(&self) -> Result<PruneReport> {
        let count_before = self.store.issue_count();

        if count_before == 0 || count_before < self.config.min_issues {
            tracing::info!(
                "Janitor: Skipping prune (row count {count_before} < {})",
                self.config.min_issues
            );
            return Ok(PruneReport {
                deleted_count: 0,
                remaining_count: count_before,
            });
        }

        let threshold = match self.store.survival_percentile(self.config.prune_percentile) {
            Some(t) => t,
            // Count was non-zero above; a missing percentile means the
            // corpus emptied concurrently. Nothing to do.
            None => {
                return Ok(PruneReport {
                    deleted_count: 0,
                    remaining_count: self.store.issue_count(),
                })
            }
        };

        // Rows exactly at the threshold are retained.
        let deleted_ids = self.store.prune_below(threshold)?;
        self.lexical.delete_issues(&deleted_ids)?;

        let count_after = self.store.issue_count();
        let deleted_count = count_before - count_after;

        tracing::info!(
            "Janitor: Pruned {deleted_count} issues ({count_before} -> {count_after})"
        );

        Ok(PruneReport {
            deleted_count,
            remaining_count: count_after,
        })
    }
}

//! Building many debates with failure isolation

use crate::builder::DebateBuilder;
use crate::error::BuilderError;
use crate::types::{BuildReport, DebateSpec};
use argmap_domain::traits::{Classifier, LlmProvider, SimilarityIndex};
use argmap_store::{DebateLedger, GraphDocument};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Result of one debate in a batch
#[derive(Debug)]
pub struct DebateOutcome {
    /// Debate identifier
    pub debate_id: String,
    /// The build report, or the error message of the failed build
    pub result: Result<BuildReport, String>,
}

/// Summary of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Debates attempted in this run, in manifest order
    pub outcomes: Vec<DebateOutcome>,
    /// Debates skipped because the ledger records them as built
    pub skipped: Vec<String>,
    /// Whether the run stopped early on a shutdown signal
    pub cancelled: bool,
}

impl BatchReport {
    /// Number of debates built successfully
    pub fn built(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of failed debates
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

/// Builds a list of debates `batch_size` at a time
///
/// A failed build is recorded and the batch moves on. With a ledger,
/// debates already built are skipped and failed ones are retried.
pub struct DebateBatch<L: LlmProvider, C: Classifier, S: SimilarityIndex> {
    builder: Arc<DebateBuilder<L, C, S>>,
    ledger: Option<Arc<DebateLedger>>,
}

impl<L, C, S> DebateBatch<L, C, S>
where
    L: LlmProvider + 'static,
    C: Classifier + 'static,
    S: SimilarityIndex + 'static,
{
    /// Create a batch runner without persistence
    pub fn new(builder: Arc<DebateBuilder<L, C, S>>) -> Self {
        Self {
            builder,
            ledger: None,
        }
    }

    /// Record progress in `ledger`
    pub fn with_ledger(mut self, ledger: Arc<DebateLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Build every debate in `specs`
    ///
    /// # Errors
    ///
    /// Only ledger failures abort the run; build failures are reported in
    /// the [`BatchReport`].
    pub async fn run(
        &self,
        specs: &[DebateSpec],
        shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<BatchReport, BuilderError> {
        let mut report = BatchReport::default();
        let mut pending: Vec<&DebateSpec> = Vec::with_capacity(specs.len());
        for spec in specs {
            if let Some(ledger) = &self.ledger {
                ledger.register(&spec.debate_id).map_err(ledger_error)?;
                if !ledger.needs_build(&spec.debate_id).map_err(ledger_error)? {
                    info!("Skipping '{}': already built", spec.debate_id);
                    report.skipped.push(spec.debate_id.clone());
                    continue;
                }
            }
            pending.push(spec);
        }

        let batch_size = self.builder.config().batch_size;
        info!(
            "Building {} debates in batches of {} ({} skipped)",
            pending.len(),
            batch_size,
            report.skipped.len()
        );

        for (batch_no, chunk) in pending.chunks(batch_size).enumerate() {
            info!("Starting batch {} with {} debates", batch_no + 1, chunk.len());
            let results = join_all(
                chunk
                    .iter()
                    .map(|spec| self.builder.build_debate(spec, shutdown.clone())),
            )
            .await;

            for (spec, result) in chunk.iter().zip(results) {
                match result {
                    Ok(build) => {
                        self.record_built(&build)?;
                        report.outcomes.push(DebateOutcome {
                            debate_id: spec.debate_id.clone(),
                            result: Ok(build),
                        });
                    }
                    Err(BuilderError::Cancelled) => report.cancelled = true,
                    Err(e) => {
                        warn!("Debate '{}' failed: {}", spec.debate_id, e);
                        if let Some(ledger) = &self.ledger {
                            ledger
                                .mark_failed(&spec.debate_id, &e.to_string())
                                .map_err(ledger_error)?;
                        }
                        report.outcomes.push(DebateOutcome {
                            debate_id: spec.debate_id.clone(),
                            result: Err(e.to_string()),
                        });
                    }
                }
            }

            if report.cancelled {
                warn!("Batch run cancelled after batch {}", batch_no + 1);
                break;
            }
        }

        info!(
            "Batch run finished: {} built, {} failed, {} skipped",
            report.built(),
            report.failed(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn record_built(&self, build: &BuildReport) -> Result<(), BuilderError> {
        let Some(ledger) = &self.ledger else {
            return Ok(());
        };
        let json = GraphDocument::from_graph(&build.graph)
            .to_json()
            .map_err(|e| BuilderError::Ledger(e.to_string()))?;
        ledger
            .mark_built(&build.debate_id, &json)
            .map_err(ledger_error)
    }
}

fn ledger_error(e: argmap_store::LedgerError) -> BuilderError {
    BuilderError::Ledger(e.to_string())
}

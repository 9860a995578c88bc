//! Drafting of pro and con argument candidates

use crate::error::BuilderError;
use crate::parser::{self, ArgumentsOutput, RankingOutput};
use crate::prompt;
use crate::structured::StructuredCaller;
use argmap_domain::traits::LlmProvider;
use argmap_domain::{ArgumentCandidate, Valence};
use std::sync::Arc;
use tracing::{debug, warn};

/// Input for one persona's generation round
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    /// Premises of the claim under attack or defence
    pub premises: &'a [String],
    /// Premise indices, most plausible first
    pub ranking: &'a [usize],
    /// Persona to argue as
    pub persona: &'a str,
    /// Domain tags
    pub tags: &'a [String],
    /// Candidates requested per valence
    pub n: usize,
}

/// Candidates drafted for one persona
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateBatch {
    /// Supporting the most plausible premise
    pub pros: Vec<ArgumentCandidate>,
    /// Attacking the least plausible premise
    pub cons: Vec<ArgumentCandidate>,
}

/// Drafts raw argument candidates per persona
pub struct CandidateGenerator<L: LlmProvider> {
    caller: Arc<StructuredCaller<L>>,
}

impl<L: LlmProvider> CandidateGenerator<L> {
    /// Create a generator
    pub fn new(caller: Arc<StructuredCaller<L>>) -> Self {
        Self { caller }
    }

    /// Order premise indices from most to least plausible
    ///
    /// Never fails: a single premise needs no ranking, and any failed or
    /// unparseable ranking falls back to index order.
    pub async fn rank_premises(&self, premises: &[String], tags: &[String]) -> Vec<usize> {
        let identity: Vec<usize> = (0..premises.len()).collect();
        if premises.len() < 2 {
            return identity;
        }
        match self.try_rank(premises, tags).await {
            Ok(Some(order)) => {
                debug!("Premise ranking: {:?}", order);
                order
            }
            Ok(None) => {
                warn!("Unparseable premise ranking, using index order");
                identity
            }
            Err(e) => {
                warn!("Premise ranking failed, using index order: {}", e);
                identity
            }
        }
    }

    async fn try_rank(
        &self,
        premises: &[String],
        tags: &[String],
    ) -> Result<Option<Vec<usize>>, BuilderError> {
        let assessment = self.caller.draft(&prompt::assessment(premises, tags)).await?;
        let output: RankingOutput = self
            .caller
            .format_json(&prompt::ranking(premises, &assessment), prompt::RANKING_SCHEMA)
            .await?;
        Ok(parser::ranking(output, premises.len()))
    }

    /// Draft pro and con candidates for one persona
    ///
    /// Pros target `ranking[0]`, cons target the last ranked premise. The two
    /// valences are drafted concurrently; a failed valence yields no
    /// candidates rather than an error.
    pub async fn generate(&self, request: GenerationRequest<'_>) -> CandidateBatch {
        let (Some(&strongest), Some(&weakest)) = (request.ranking.first(), request.ranking.last())
        else {
            return CandidateBatch::default();
        };

        let (pros, cons) = tokio::join!(
            self.draft_valence(&request, strongest, Valence::Pro),
            self.draft_valence(&request, weakest, Valence::Con),
        );
        CandidateBatch { pros, cons }
    }

    async fn draft_valence(
        &self,
        request: &GenerationRequest<'_>,
        target_index: usize,
        valence: Valence,
    ) -> Vec<ArgumentCandidate> {
        let prompt = prompt::arguments(
            request.premises,
            target_index,
            valence,
            request.persona,
            request.tags,
            request.n,
        );
        match self
            .caller
            .draft_json::<ArgumentsOutput>(&prompt, prompt::ARGUMENTS_SCHEMA)
            .await
        {
            Ok(output) => parser::candidates(output, target_index, valence, request.n),
            Err(e) => {
                warn!("Dropping {} candidates for one persona: {}", valence, e);
                Vec::new()
            }
        }
    }
}

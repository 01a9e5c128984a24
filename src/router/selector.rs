//! Tier and provider selection from a complexity score
//!
//! Builds the fallback chain as a fixed priority order: the primary tier at the
//! highest-priority eligible provider, then the alternate capability tier at a
//! different provider where possible, then a third distinct candidate. The
//! chain is capped at three candidates to bound worst-case latency, and it
//! includes candidates from at least two distinct providers whenever two
//! eligible providers carry bindings.

use crate::config::Config;
use crate::providers::ProviderId;
use crate::router::{AnalysisType, ModelTier, RouteCandidate, RoutingDecision};
use std::sync::Arc;

/// Maximum candidates per routing decision
///
/// Worst-case request latency is bounded by this times the per-attempt timeout.
const MAX_CANDIDATES: usize = 3;

/// Maps a complexity score to an ordered candidate chain
///
/// Pure function of the score and the read-only configuration: the same score
/// and the same configuration always yield the same ordered candidate list.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    config: Arc<Config>,
}

impl ModelSelector {
    /// Create a new selector over validated configuration
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Build the routing decision for a score
    ///
    /// A score at or below the configured threshold is "simple" and leads with
    /// the fast-cheap tier; above the threshold leads with high-capability.
    /// `analysis_type` is passed through for prompt selection downstream.
    ///
    /// Returns an empty candidate list when zero providers are eligible
    /// (no credentials configured, or no bindings for any chain tier).
    pub fn select(&self, score: f64, analysis_type: AnalysisType) -> RoutingDecision {
        let threshold = self.config.routing.threshold();
        let is_complex = score > threshold;

        let primary_tier = if is_complex {
            ModelTier::HighCapability
        } else {
            ModelTier::FastCheap
        };

        // Fixed tier preference chain. For complex requests it descends in
        // capability (and cost); for simple requests the alternate tier gives
        // a second provider a chance before retrying fast-cheap elsewhere.
        let tier_chain: [ModelTier; MAX_CANDIDATES] = if is_complex {
            [
                ModelTier::HighCapability,
                ModelTier::Balanced,
                ModelTier::FastCheap,
            ]
        } else {
            [
                ModelTier::FastCheap,
                ModelTier::Balanced,
                ModelTier::FastCheap,
            ]
        };

        let eligible: Vec<ProviderId> = self
            .config
            .routing
            .provider_priority()
            .iter()
            .copied()
            .filter(|p| self.config.providers.is_configured(*p))
            .collect();

        let mut candidates: Vec<RouteCandidate> = Vec::with_capacity(MAX_CANDIDATES);
        let mut previous_provider: Option<ProviderId> = None;

        for tier in tier_chain {
            let Some(candidate) = self.pick(tier, &eligible, previous_provider) else {
                continue;
            };

            // Never attempt the same (provider, model) twice in one request
            if candidates
                .iter()
                .any(|c| c.provider() == candidate.provider() && c.model() == candidate.model())
            {
                continue;
            }

            previous_provider = Some(candidate.provider());
            candidates.push(candidate);
        }

        tracing::debug!(
            score = score,
            threshold = threshold,
            primary_tier = primary_tier.as_str(),
            analysis_type = analysis_type.as_str(),
            candidate_count = candidates.len(),
            eligible_providers = eligible.len(),
            "Built routing decision"
        );

        RoutingDecision::new(primary_tier, analysis_type, candidates)
    }

    /// Pick the binding for a tier, preferring a provider different from the
    /// previous candidate's so the chain crosses providers where possible
    fn pick(
        &self,
        tier: ModelTier,
        eligible: &[ProviderId],
        previous: Option<ProviderId>,
    ) -> Option<RouteCandidate> {
        let bindings = self.config.bindings.for_tier(tier);

        let alternates = eligible.iter().copied().filter(|p| Some(*p) != previous);
        let fallback_to_previous = eligible
            .iter()
            .copied()
            .filter(|p| Some(*p) == previous);

        for provider in alternates.chain(fallback_to_previous) {
            if let Some(binding) = bindings.iter().find(|b| b.provider() == provider) {
                return Some(RouteCandidate::new(tier, binding));
            }
        }

        None
    }
}

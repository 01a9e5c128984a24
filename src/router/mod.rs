//! Routing types and tier selection for Mailroute
//!
//! Maps a complexity score to an ordered preference list of (tier, provider,
//! model) candidates, most-preferred first.

pub mod selector;

pub use selector::ModelSelector;

use crate::providers::ProviderId;
use serde::{Deserialize, Serialize};

/// Model capability tier (generic, provider-agnostic)
///
/// Maps to config.toml: bindings.fast_cheap, bindings.balanced,
/// bindings.high_capability. Model-specific details (vendor, model id, cost)
/// are in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    FastCheap,
    Balanced,
    HighCapability,
}

impl ModelTier {
    /// Convert to string representation for logging and serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FastCheap => "fast_cheap",
            Self::Balanced => "balanced",
            Self::HighCapability => "high_capability",
        }
    }
}

/// Kind of analysis requested for a text
///
/// Does not change the threshold logic; it selects type-appropriate prompts in
/// the dispatcher and is an explicit extension point for future per-type
/// routing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    Summary,
    ActionItems,
    Recommendations,
    Custom,
}

impl AnalysisType {
    /// Convert to string representation for logging and serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::ActionItems => "action_items",
            Self::Recommendations => "recommendations",
            Self::Custom => "custom",
        }
    }
}

/// One attemptable (tier, provider, model) candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteCandidate {
    tier: ModelTier,
    provider: ProviderId,
    model: String,
    cost_per_1k_tokens: f64,
}

impl RouteCandidate {
    /// Create a candidate from a configured binding
    pub fn new(tier: ModelTier, binding: &crate::config::ProviderBinding) -> Self {
        Self {
            tier,
            provider: binding.provider(),
            model: binding.model().to_string(),
            cost_per_1k_tokens: binding.cost_per_1k_tokens(),
        }
    }

    pub fn tier(&self) -> ModelTier {
        self.tier
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn cost_per_1k_tokens(&self) -> f64 {
        self.cost_per_1k_tokens
    }

    /// Stable identifier surfaced to callers as `model_used`
    pub fn identifier(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }
}

/// Output of the model selector: an ordered fallback chain
///
/// Ordering invariant: the first candidate's tier matches the tier chosen from
/// the complexity score; subsequent candidates are the fixed-priority fallback
/// chain. The order is decided entirely at selection time, never re-scored per
/// attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    primary_tier: ModelTier,
    analysis_type: AnalysisType,
    candidates: Vec<RouteCandidate>,
}

impl RoutingDecision {
    /// Create a new routing decision
    pub fn new(
        primary_tier: ModelTier,
        analysis_type: AnalysisType,
        candidates: Vec<RouteCandidate>,
    ) -> Self {
        Self {
            primary_tier,
            analysis_type,
            candidates,
        }
    }

    /// The tier chosen from the complexity score
    pub fn primary_tier(&self) -> ModelTier {
        self.primary_tier
    }

    /// The analysis type this decision was made for
    pub fn analysis_type(&self) -> AnalysisType {
        self.analysis_type
    }

    /// Ordered candidates, most-preferred first
    pub fn candidates(&self) -> &[RouteCandidate] {
        &self.candidates
    }

    /// True when zero providers were eligible; the caller must treat this as a
    /// configuration error rather than attempt dispatch
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

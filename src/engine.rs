//! Analysis engine: score, route, dispatch, fall back, normalize
//!
//! The engine owns the whole request lifecycle. It scores the text, asks the
//! selector for an ordered candidate chain, then walks the chain attempting
//! each candidate at most once. The first success wins; if every candidate
//! fails the request terminates with a single exhaustion error. Callers always
//! receive a normalized [`AnalysisResult`], never a raw provider failure.

use crate::complexity::{ComplexityReport, ComplexityScorer};
use crate::config::Config;
use crate::error::AppResult;
use crate::providers::{Dispatcher, ProviderRegistry};
use crate::request_id::RequestId;
use crate::router::{AnalysisType, ModelSelector, RoutingDecision};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Progress of one request through its candidate chain
///
/// Transitions are strictly forward: NotStarted, then Trying(0..n) in order,
/// ending in either Succeeded or Exhausted. A request never revisits a
/// candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    NotStarted,
    /// Attempting the candidate at this chain index
    Trying(usize),
    /// The candidate at this chain index produced the result
    Succeeded(usize),
    /// Every candidate was attempted and failed
    Exhausted,
}

impl FallbackState {
    /// Move to attempting the candidate at `index`
    pub fn trying(self, index: usize) -> Self {
        debug_assert!(
            matches!(self, Self::NotStarted | Self::Trying(_)),
            "cannot resume a finished chain"
        );
        Self::Trying(index)
    }

    /// Mark the current attempt as the winner
    pub fn succeeded(self) -> Self {
        match self {
            Self::Trying(index) => Self::Succeeded(index),
            other => other,
        }
    }

    /// True once the chain has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Exhausted)
    }
}

/// Terminal error surfaced to callers
///
/// Attempt-level failures never escape the engine; the only error a caller can
/// see is that the entire chain was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AllProvidersExhausted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllProvidersExhausted => "all_providers_exhausted",
        }
    }
}

/// Normalized outcome of one analysis request
///
/// Invariant: exactly one of `content` and `error` is present, and `success`
/// agrees with which one. Construction goes through [`AnalysisResult::succeeded`]
/// and [`AnalysisResult::exhausted`] so the invariant cannot be violated.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    success: bool,
    content: Option<String>,
    /// "provider/model" identifier of the winning candidate
    model_used: Option<String>,
    complexity: ComplexityReport,
    /// True when the winning candidate was not the first in the chain
    fallback_used: bool,
    error: Option<ErrorKind>,
}

impl AnalysisResult {
    fn succeeded(
        content: String,
        model_used: String,
        complexity: ComplexityReport,
        fallback_used: bool,
    ) -> Self {
        Self {
            success: true,
            content: Some(content),
            model_used: Some(model_used),
            complexity,
            fallback_used,
            error: None,
        }
    }

    fn exhausted(complexity: ComplexityReport, fallback_used: bool) -> Self {
        Self {
            success: false,
            content: None,
            model_used: None,
            complexity,
            fallback_used,
            error: Some(ErrorKind::AllProvidersExhausted),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn model_used(&self) -> Option<&str> {
        self.model_used.as_deref()
    }

    pub fn complexity(&self) -> &ComplexityReport {
        &self.complexity
    }

    pub fn fallback_used(&self) -> bool {
        self.fallback_used
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }
}

/// The top-level analysis service
///
/// Cheap to clone and safe to share across tasks; all state is read-only
/// configuration plus a connection-pooled HTTP client.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    scorer: ComplexityScorer,
    selector: ModelSelector,
    dispatcher: Dispatcher,
}

impl AnalysisEngine {
    /// Build an engine from validated configuration
    ///
    /// Constructs real HTTP backends for every provider with credentials.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let registry = ProviderRegistry::from_config(&config)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Build an engine over an explicit backend registry
    ///
    /// Seam for embedders and tests that supply their own
    /// [`crate::providers::CompletionBackend`] implementations.
    pub fn with_registry(config: Arc<Config>, registry: ProviderRegistry) -> Self {
        let scorer = ComplexityScorer::new(&config.scoring);
        let timeout = Duration::from_secs(config.timeouts.per_attempt_seconds());

        Self {
            scorer,
            selector: ModelSelector::new(config),
            dispatcher: Dispatcher::new(registry, timeout),
        }
    }

    /// Analyze a text, returning the normalized result
    ///
    /// Never returns an error: attempt failures are absorbed by the fallback
    /// chain and total failure is reported inside the result. Cancelling the
    /// returned future abandons any in-flight attempt.
    pub async fn analyze(&self, text: &str, analysis_type: AnalysisType) -> AnalysisResult {
        let request_id = RequestId::new();
        let span = tracing::info_span!(
            "analyze",
            request_id = %request_id,
            analysis_type = analysis_type.as_str()
        );

        async {
            let report = self.scorer.report(text);
            let decision = self.selector.select(report.score, analysis_type);
            self.run_chain(&decision, text, report).await
        }
        .instrument(span)
        .await
    }

    /// Walk the candidate chain until a success or exhaustion
    async fn run_chain(
        &self,
        decision: &RoutingDecision,
        text: &str,
        report: ComplexityReport,
    ) -> AnalysisResult {
        if decision.is_empty() {
            // No eligible provider; terminal without any network attempt
            tracing::error!(
                score = report.score,
                "No providers configured; request cannot be dispatched"
            );
            return AnalysisResult::exhausted(report, false);
        }

        let candidates = decision.candidates();
        let mut state = FallbackState::NotStarted;

        for (index, candidate) in candidates.iter().enumerate() {
            state = state.trying(index);

            match self
                .dispatcher
                .dispatch(candidate, decision.analysis_type(), text)
                .await
            {
                Ok(content) => {
                    state = state.succeeded();
                    let fallback_used = index > 0;
                    tracing::info!(
                        model_used = %candidate.identifier(),
                        tier = candidate.tier().as_str(),
                        attempt = index + 1,
                        fallback_used = fallback_used,
                        state = ?state,
                        "Analysis completed"
                    );
                    return AnalysisResult::succeeded(
                        content,
                        candidate.identifier(),
                        report,
                        fallback_used,
                    );
                }
                Err(error) if error.is_configuration_defect() => {
                    // Bad credential. Still advance the chain, but make sure
                    // an operator sees this distinctly from transient faults.
                    tracing::error!(
                        provider = error.provider().as_str(),
                        model = candidate.model(),
                        error_kind = error.kind(),
                        attempt = index + 1,
                        "Attempt failed with a credential error: {}",
                        error
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        provider = error.provider().as_str(),
                        model = candidate.model(),
                        error_kind = error.kind(),
                        attempt = index + 1,
                        "Attempt failed, advancing fallback chain: {}",
                        error
                    );
                }
            }
        }

        state = FallbackState::Exhausted;
        tracing::error!(
            attempts = candidates.len(),
            score = report.score,
            state = ?state,
            "All candidates failed"
        );
        // Fallback was engaged whenever more than one candidate was attempted
        AnalysisResult::exhausted(report, candidates.len() > 1)
    }
}

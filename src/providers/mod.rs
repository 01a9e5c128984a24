//! Provider backends and dispatch
//!
//! Each supported vendor gets a backend that speaks its wire format and maps
//! vendor-specific failures into the shared [`ProviderError`] taxonomy. The
//! [`Dispatcher`] is the only component that performs network attempts; it
//! enforces the per-attempt timeout and knows nothing about fallback order.

pub mod anthropic;
pub mod openai;
pub mod prompt;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::router::{AnalysisType, RouteCandidate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderId {
    /// Convert to string representation for logging and serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one dispatch attempt failed
///
/// Every variant is non-terminal from the caller's point of view: any attempt
/// failure advances the fallback chain to the next candidate. The distinction
/// matters for logging and for operators diagnosing which provider misbehaved.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Credential rejected (HTTP 401/403). A configuration defect, not a
    /// transient fault; logged louder than the other variants.
    #[error("{provider} rejected the configured credential")]
    AuthenticationFailed { provider: ProviderId },

    /// Provider throttled the request (HTTP 429)
    #[error("{provider} rate limited the request")]
    RateLimited { provider: ProviderId },

    /// Attempt exceeded the per-attempt timeout
    #[error("{provider} did not respond within {seconds}s")]
    Timeout { provider: ProviderId, seconds: u64 },

    /// Response arrived but could not be decoded into completion text
    #[error("{provider} returned a malformed response: {reason}")]
    MalformedResponse { provider: ProviderId, reason: String },

    /// Transport failure or unexpected HTTP status
    #[error("{provider} unavailable: {reason}")]
    Unavailable { provider: ProviderId, reason: String },
}

impl ProviderError {
    /// The provider the failed attempt targeted
    pub fn provider(&self) -> ProviderId {
        match self {
            Self::AuthenticationFailed { provider }
            | Self::RateLimited { provider }
            | Self::Timeout { provider, .. }
            | Self::MalformedResponse { provider, .. }
            | Self::Unavailable { provider, .. } => *provider,
        }
    }

    /// Stable kind label for structured logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::RateLimited { .. } => "rate_limited",
            Self::Timeout { .. } => "timeout",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    /// True for failures an operator must fix in configuration rather than
    /// wait out (bad credentials)
    pub fn is_configuration_defect(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

/// Map an HTTP status into the attempt error taxonomy
///
/// 401/403 mean the credential is bad; 429 means throttling. Anything else
/// non-successful is treated as the provider being unavailable.
pub(crate) fn classify_status(provider: ProviderId, status: reqwest::StatusCode) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationFailed { provider },
        429 => ProviderError::RateLimited { provider },
        code => ProviderError::Unavailable {
            provider,
            reason: format!("unexpected HTTP status {}", code),
        },
    }
}

/// One completion call, already reduced to provider-agnostic terms
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A backend that can execute completion requests against one provider
///
/// Implementations translate the request into the vendor wire format and map
/// failures into [`ProviderError`]. They must not retry internally; retry
/// policy belongs to the fallback chain.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Which provider this backend speaks for
    fn provider(&self) -> ProviderId;

    /// Execute one completion attempt, returning the completion text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Registry of constructed backends, one per configured provider
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    backends: HashMap<ProviderId, Arc<dyn CompletionBackend>>,
}

impl ProviderRegistry {
    /// Build backends for every provider with credentials in the configuration
    ///
    /// A single HTTP client is shared across backends for connection reuse.
    /// Per-attempt timeouts are enforced by the dispatcher, not the client.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;

        let mut registry = Self::default();

        if let Some(credentials) = config.providers.credentials(ProviderId::Anthropic) {
            registry.register(Arc::new(anthropic::AnthropicBackend::new(
                client.clone(),
                credentials,
            )));
        }

        if let Some(credentials) = config.providers.credentials(ProviderId::OpenAi) {
            registry.register(Arc::new(openai::OpenAiBackend::new(
                client.clone(),
                credentials,
            )));
        }

        tracing::info!(
            provider_count = registry.backends.len(),
            "Provider registry initialized"
        );

        Ok(registry)
    }

    /// Register a backend, replacing any existing backend for the same provider
    pub fn register(&mut self, backend: Arc<dyn CompletionBackend>) {
        self.backends.insert(backend.provider(), backend);
    }

    /// Look up the backend for a provider
    pub fn get(&self, provider: ProviderId) -> Option<&Arc<dyn CompletionBackend>> {
        self.backends.get(&provider)
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Executes a single routed attempt with the per-attempt timeout
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: ProviderRegistry,
    per_attempt_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher over a registry
    pub fn new(registry: ProviderRegistry, per_attempt_timeout: Duration) -> Self {
        Self {
            registry,
            per_attempt_timeout,
        }
    }

    /// Whether any backend is available for dispatch
    pub fn has_backends(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Execute one attempt against a candidate
    ///
    /// Builds the type-appropriate prompt, resolves the backend, and races the
    /// completion call against the per-attempt timeout. A candidate whose
    /// provider has no backend fails as unavailable without a network call.
    pub async fn dispatch(
        &self,
        candidate: &RouteCandidate,
        analysis_type: AnalysisType,
        text: &str,
    ) -> Result<String, ProviderError> {
        let provider = candidate.provider();

        let Some(backend) = self.registry.get(provider) else {
            return Err(ProviderError::Unavailable {
                provider,
                reason: "no backend registered for provider".to_string(),
            });
        };

        let prompt = prompt::AnalysisPrompt::build(analysis_type, text);
        let request = CompletionRequest {
            model: candidate.model().to_string(),
            system: prompt.system,
            user: prompt.user,
            max_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
        };

        tracing::debug!(
            provider = provider.as_str(),
            model = candidate.model(),
            tier = candidate.tier().as_str(),
            analysis_type = analysis_type.as_str(),
            "Dispatching completion attempt"
        );

        match tokio::time::timeout(self.per_attempt_timeout, backend.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider,
                seconds: self.per_attempt_timeout.as_secs(),
            }),
        }
    }
}

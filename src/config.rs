//! Configuration management for Mailroute
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Configuration is read-only after validation; the engine shares it via `Arc`.

use crate::providers::ProviderId;
use crate::router::ModelTier;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub bindings: BindingsConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

/// Routing configuration
///
/// Fields are private to enforce invariants. Configuration is loaded via
/// deserialization and validated via Config::validate(). After construction,
/// fields cannot be mutated, ensuring validated data remains valid.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    /// Complexity cutoff between the fast-cheap and high-capability tiers
    #[serde(default = "default_threshold")]
    threshold: f64,
    /// Providers in the order their bindings should be preferred
    #[serde(default = "default_provider_priority")]
    provider_priority: Vec<ProviderId>,
}

impl RoutingConfig {
    /// Get the complexity threshold separating simple from complex requests
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Get the provider priority order
    pub fn provider_priority(&self) -> &[ProviderId] {
        &self.provider_priority
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            provider_priority: default_provider_priority(),
        }
    }
}

fn default_threshold() -> f64 {
    100.0
}

fn default_provider_priority() -> Vec<ProviderId> {
    vec![ProviderId::Anthropic, ProviderId::OpenAi]
}

/// Complexity scoring weights and lexicons
///
/// The aggregate score is a weighted linear combination of six factors. Length
/// contributes proportionally only up to `length_cap_chars` so that very long
/// quoted threads cannot dominate the semantic signals.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringConfig {
    #[serde(default = "default_length_weight")]
    length_weight: f64,
    #[serde(default = "default_length_cap_chars")]
    length_cap_chars: usize,
    #[serde(default = "default_sentence_weight")]
    sentence_weight: f64,
    #[serde(default = "default_question_weight")]
    question_weight: f64,
    #[serde(default = "default_action_weight")]
    action_weight: f64,
    #[serde(default = "default_technical_weight")]
    technical_weight: f64,
    #[serde(default = "default_emotional_weight")]
    emotional_weight: f64,
    /// Urgency/importance lexicon
    #[serde(default = "default_action_words")]
    action_words: Vec<String>,
    /// Technical-vocabulary lexicon
    #[serde(default = "default_technical_terms")]
    technical_terms: Vec<String>,
    /// Emotional-register lexicon
    #[serde(default = "default_emotional_terms")]
    emotional_terms: Vec<String>,
}

impl ScoringConfig {
    pub fn length_weight(&self) -> f64 {
        self.length_weight
    }

    pub fn length_cap_chars(&self) -> usize {
        self.length_cap_chars
    }

    pub fn sentence_weight(&self) -> f64 {
        self.sentence_weight
    }

    pub fn question_weight(&self) -> f64 {
        self.question_weight
    }

    pub fn action_weight(&self) -> f64 {
        self.action_weight
    }

    pub fn technical_weight(&self) -> f64 {
        self.technical_weight
    }

    pub fn emotional_weight(&self) -> f64 {
        self.emotional_weight
    }

    pub fn action_words(&self) -> &[String] {
        &self.action_words
    }

    pub fn technical_terms(&self) -> &[String] {
        &self.technical_terms
    }

    pub fn emotional_terms(&self) -> &[String] {
        &self.emotional_terms
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            length_weight: default_length_weight(),
            length_cap_chars: default_length_cap_chars(),
            sentence_weight: default_sentence_weight(),
            question_weight: default_question_weight(),
            action_weight: default_action_weight(),
            technical_weight: default_technical_weight(),
            emotional_weight: default_emotional_weight(),
            action_words: default_action_words(),
            technical_terms: default_technical_terms(),
            emotional_terms: default_emotional_terms(),
        }
    }
}

fn default_length_weight() -> f64 {
    0.05
}

fn default_length_cap_chars() -> usize {
    2_000
}

fn default_sentence_weight() -> f64 {
    2.0
}

fn default_question_weight() -> f64 {
    10.0
}

fn default_action_weight() -> f64 {
    25.0
}

fn default_technical_weight() -> f64 {
    15.0
}

fn default_emotional_weight() -> f64 {
    10.0
}

fn default_action_words() -> Vec<String> {
    [
        "urgent",
        "asap",
        "critical",
        "emergency",
        "immediate",
        "immediately",
        "deadline",
        "important",
        "priority",
        "required",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_technical_terms() -> Vec<String> {
    [
        "api",
        "server",
        "database",
        "production",
        "deployment",
        "authentication",
        "integration",
        "endpoint",
        "failure",
        "rollback",
        "bug",
        "crash",
        "security",
        "downtime",
        "middleware",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_emotional_terms() -> Vec<String> {
    [
        "frustrated",
        "disappointed",
        "angry",
        "upset",
        "excited",
        "thrilled",
        "concerned",
        "worried",
        "unacceptable",
        "appreciate",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Per-provider credentials and endpoint overrides
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    anthropic: Option<ProviderCredentials>,
    openai: Option<ProviderCredentials>,
}

impl ProvidersConfig {
    /// Get credentials for a provider, if configured
    pub fn credentials(&self, provider: ProviderId) -> Option<&ProviderCredentials> {
        match provider {
            ProviderId::Anthropic => self.anthropic.as_ref(),
            ProviderId::OpenAi => self.openai.as_ref(),
        }
    }

    /// Whether the provider has a credential and is therefore eligible for dispatch
    pub fn is_configured(&self, provider: ProviderId) -> bool {
        self.credentials(provider).is_some()
    }
}

/// Credential and optional base URL override for one provider
///
/// The API key is an opaque secret; it is never logged and is only handed to
/// the backend that speaks this provider's wire format.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderCredentials {
    api_key: String,
    /// Override for the provider API origin (primarily for tests)
    base_url: Option<String>,
}

impl ProviderCredentials {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    #[cfg(test)]
    pub fn for_tests(api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.map(|s| s.to_string()),
        }
    }
}

/// Tier-to-provider bindings (multi-provider support)
///
/// Each capability tier can carry bindings from multiple providers; within a
/// tier, the `routing.provider_priority` order decides which binding is
/// preferred. Multiple providers per tier is what enables cross-provider
/// fallback, not just cross-tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BindingsConfig {
    #[serde(default)]
    pub fast_cheap: Vec<ProviderBinding>,
    #[serde(default)]
    pub balanced: Vec<ProviderBinding>,
    #[serde(default)]
    pub high_capability: Vec<ProviderBinding>,
}

impl BindingsConfig {
    /// Get the configured bindings for a tier
    pub fn for_tier(&self, tier: ModelTier) -> &[ProviderBinding] {
        match tier {
            ModelTier::FastCheap => &self.fast_cheap,
            ModelTier::Balanced => &self.balanced,
            ModelTier::HighCapability => &self.high_capability,
        }
    }
}

/// Individual (provider, model) binding within a tier
///
/// Fields are private to enforce invariants; instances are created via
/// deserialization and validated by Config::validate().
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderBinding {
    provider: ProviderId,
    model: String,
    #[serde(default = "default_cost_per_1k_tokens")]
    cost_per_1k_tokens: f64,
}

impl ProviderBinding {
    /// Get the provider this binding belongs to
    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    /// Get the model identifier sent on the wire
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the estimated cost per 1K tokens (for transparency, not billing)
    pub fn cost_per_1k_tokens(&self) -> f64 {
        self.cost_per_1k_tokens
    }
}

fn default_cost_per_1k_tokens() -> f64 {
    0.0
}

/// Dispatch timeout configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutsConfig {
    /// Timeout per candidate dispatch attempt, in seconds
    ///
    /// Worst-case request latency is bounded by this value times the candidate
    /// list length (at most 3 candidates).
    #[serde(default = "default_per_attempt_timeout")]
    per_attempt_seconds: u64,
}

impl TimeoutsConfig {
    pub fn per_attempt_seconds(&self) -> u64 {
        self.per_attempt_seconds
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            per_attempt_seconds: default_per_attempt_timeout(),
        }
    }
}

fn default_per_attempt_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            crate::error::AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self = toml::from_str(&content).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 3: Validate parsed config (provides contextual reason)
        config
            .validate()
            .map_err(|e| crate::error::AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()`, but can also be called
    /// explicitly when constructing Config via other means (e.g., in tests).
    ///
    /// Note that bindings and credentials are allowed to be absent: the selector
    /// handles zero eligible providers by returning an empty candidate list, and
    /// the engine reports that as a terminal failure without any network attempt.
    pub fn validate(&self) -> crate::error::AppResult<()> {
        // Threshold must be a finite, non-negative number
        if !self.routing.threshold.is_finite() || self.routing.threshold < 0.0 {
            return Err(crate::error::AppError::Config(format!(
                "routing.threshold must be a non-negative finite number, got {}",
                self.routing.threshold
            )));
        }

        // Priority list must be non-empty and free of duplicates
        if self.routing.provider_priority.is_empty() {
            return Err(crate::error::AppError::Config(
                "routing.provider_priority must list at least one provider".to_string(),
            ));
        }
        for (i, provider) in self.routing.provider_priority.iter().enumerate() {
            if self.routing.provider_priority[..i].contains(provider) {
                return Err(crate::error::AppError::Config(format!(
                    "routing.provider_priority lists provider '{}' more than once",
                    provider
                )));
            }
        }

        // Scoring weights must be finite and non-negative
        for (name, weight) in [
            ("length_weight", self.scoring.length_weight),
            ("sentence_weight", self.scoring.sentence_weight),
            ("question_weight", self.scoring.question_weight),
            ("action_weight", self.scoring.action_weight),
            ("technical_weight", self.scoring.technical_weight),
            ("emotional_weight", self.scoring.emotional_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(crate::error::AppError::Config(format!(
                    "scoring.{} must be a non-negative finite number, got {}",
                    name, weight
                )));
            }
        }

        if self.scoring.length_cap_chars == 0 {
            return Err(crate::error::AppError::Config(
                "scoring.length_cap_chars must be greater than 0".to_string(),
            ));
        }

        // Validate ProviderBinding fields across all tiers
        for (tier_name, bindings) in [
            ("fast_cheap", &self.bindings.fast_cheap),
            ("balanced", &self.bindings.balanced),
            ("high_capability", &self.bindings.high_capability),
        ] {
            for binding in bindings {
                if binding.model.trim().is_empty() {
                    return Err(crate::error::AppError::Config(format!(
                        "Configuration error: a binding in tier '{}' for provider '{}' has an empty model identifier",
                        tier_name,
                        binding.provider()
                    )));
                }

                if !binding.cost_per_1k_tokens.is_finite() || binding.cost_per_1k_tokens < 0.0 {
                    return Err(crate::error::AppError::Config(format!(
                        "Configuration error: binding '{}' in tier '{}' has invalid cost_per_1k_tokens {}. \
                        Cost must be a non-negative finite number.",
                        binding.model(),
                        tier_name,
                        binding.cost_per_1k_tokens
                    )));
                }
            }
        }

        // Validate credentials for every configured provider
        for provider in [ProviderId::Anthropic, ProviderId::OpenAi] {
            if let Some(credentials) = self.providers.credentials(provider) {
                if credentials.api_key.trim().is_empty() {
                    return Err(crate::error::AppError::Config(format!(
                        "Configuration error: providers.{} has an empty api_key. \
                        Remove the section entirely to mark the provider as unconfigured.",
                        provider
                    )));
                }

                if let Some(base_url) = credentials.base_url()
                    && !base_url.starts_with("http://")
                    && !base_url.starts_with("https://")
                {
                    return Err(crate::error::AppError::Config(format!(
                        "Configuration error: providers.{} has invalid base_url '{}'. \
                        base_url must start with 'http://' or 'https://'.",
                        provider, base_url
                    )));
                }
            }
        }

        // Validate per-attempt timeout
        if self.timeouts.per_attempt_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "timeouts.per_attempt_seconds must be greater than 0".to_string(),
            ));
        }
        if self.timeouts.per_attempt_seconds > 300 {
            return Err(crate::error::AppError::Config(format!(
                "timeouts.per_attempt_seconds cannot exceed 300 seconds (5 minutes), got {}",
                self.timeouts.per_attempt_seconds
            )));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = crate::error::AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(toml_str).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            }
        })?;

        // Validate config before returning
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"
[routing]
threshold = 100.0
provider_priority = ["anthropic", "openai"]

[providers.anthropic]
api_key = "sk-ant-test"

[providers.openai]
api_key = "sk-test"

[[bindings.fast_cheap]]
provider = "anthropic"
model = "claude-3-5-haiku-20241022"
cost_per_1k_tokens = 0.001

[[bindings.fast_cheap]]
provider = "openai"
model = "gpt-4o-mini"
cost_per_1k_tokens = 0.00015

[[bindings.balanced]]
provider = "openai"
model = "gpt-4o"
cost_per_1k_tokens = 0.0025

[[bindings.balanced]]
provider = "anthropic"
model = "claude-3-5-sonnet-20241022"
cost_per_1k_tokens = 0.003

[[bindings.high_capability]]
provider = "anthropic"
model = "claude-3-7-sonnet-20250219"
cost_per_1k_tokens = 0.003

[[bindings.high_capability]]
provider = "openai"
model = "gpt-4o"
cost_per_1k_tokens = 0.0025

[timeouts]
per_attempt_seconds = 30
"#;

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.routing.threshold(), 100.0);
        assert_eq!(
            config.routing.provider_priority(),
            &[ProviderId::Anthropic, ProviderId::OpenAi]
        );
        assert_eq!(config.timeouts.per_attempt_seconds(), 30);
    }

    #[test]
    fn test_config_parses_bindings() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");

        let fast = config.bindings.for_tier(ModelTier::FastCheap);
        assert_eq!(fast.len(), 2);
        assert_eq!(fast[0].provider(), ProviderId::Anthropic);
        assert_eq!(fast[0].model(), "claude-3-5-haiku-20241022");
        assert_eq!(fast[0].cost_per_1k_tokens(), 0.001);

        let high = config.bindings.for_tier(ModelTier::HighCapability);
        assert_eq!(high.len(), 2);
        assert_eq!(high[1].provider(), ProviderId::OpenAi);
    }

    #[test]
    fn test_config_parses_credentials() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert!(config.providers.is_configured(ProviderId::Anthropic));
        assert!(config.providers.is_configured(ProviderId::OpenAi));
        let anthropic = config
            .providers
            .credentials(ProviderId::Anthropic)
            .expect("anthropic credentials");
        assert_eq!(anthropic.api_key(), "sk-ant-test");
        assert_eq!(anthropic.base_url(), None);
    }

    #[test]
    fn test_config_defaults_apply_for_missing_sections() {
        let minimal = r#"
[[bindings.fast_cheap]]
provider = "anthropic"
model = "claude-3-5-haiku-20241022"
"#;
        let config = Config::from_str(minimal).expect("should parse minimal config");
        assert_eq!(config.routing.threshold(), 100.0);
        assert_eq!(config.timeouts.per_attempt_seconds(), 30);
        assert_eq!(config.scoring.length_cap_chars(), 2_000);
        assert_eq!(
            config.bindings.fast_cheap[0].cost_per_1k_tokens(),
            0.0,
            "cost defaults to zero when omitted"
        );
        assert!(!config.providers.is_configured(ProviderId::Anthropic));
    }

    #[test]
    fn test_config_allows_zero_bindings_and_zero_providers() {
        // Empty candidate lists are a runtime concern (selector returns an empty
        // decision), not a parse-time error.
        let empty = r#"
[bindings]
"#;
        let config = Config::from_str(empty).expect("should parse empty bindings");
        assert!(config.bindings.for_tier(ModelTier::FastCheap).is_empty());
        assert!(
            config
                .bindings
                .for_tier(ModelTier::HighCapability)
                .is_empty()
        );
    }

    #[test]
    fn test_config_validation_negative_threshold_fails() {
        let bad = r#"
[routing]
threshold = -1.0

[bindings]
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("threshold"));
        assert!(err_msg.contains("non-negative"));
    }

    #[test]
    fn test_config_validation_nan_threshold_fails() {
        let bad = r#"
[routing]
threshold = nan

[bindings]
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation_duplicate_priority_fails() {
        let bad = r#"
[routing]
provider_priority = ["anthropic", "anthropic"]

[bindings]
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("provider_priority"));
        assert!(err_msg.contains("more than once"));
    }

    #[test]
    fn test_config_validation_empty_priority_fails() {
        let bad = r#"
[routing]
provider_priority = []

[bindings]
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("at least one provider"));
    }

    #[test]
    fn test_config_validation_empty_model_fails() {
        let bad = r#"
[[bindings.balanced]]
provider = "openai"
model = "  "
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("balanced"));
        assert!(err_msg.contains("model"));
    }

    #[test]
    fn test_config_validation_negative_cost_fails() {
        let bad = r#"
[[bindings.fast_cheap]]
provider = "openai"
model = "gpt-4o-mini"
cost_per_1k_tokens = -0.5
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("cost_per_1k_tokens"));
    }

    #[test]
    fn test_config_validation_empty_api_key_fails() {
        let bad = r#"
[providers.openai]
api_key = ""

[bindings]
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("api_key"));
    }

    #[test]
    fn test_config_validation_invalid_base_url_fails() {
        let bad = r#"
[providers.anthropic]
api_key = "sk-ant-test"
base_url = "ftp://invalid.example"

[bindings]
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("base_url"));
        assert!(err_msg.contains("http"));
    }

    #[test]
    fn test_config_validation_zero_timeout_fails() {
        let bad = r#"
[bindings]

[timeouts]
per_attempt_seconds = 0
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("per_attempt_seconds"));
        assert!(err_msg.contains("greater than 0"));
    }

    #[test]
    fn test_config_validation_excessive_timeout_fails() {
        let bad = r#"
[bindings]

[timeouts]
per_attempt_seconds = 301
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("300"));
    }

    #[test]
    fn test_config_validation_boundary_timeouts_succeed() {
        for timeout in [1, 300] {
            let toml = format!(
                r#"
[bindings]

[timeouts]
per_attempt_seconds = {timeout}
"#
            );
            let config = Config::from_str(&toml).expect("boundary timeout should validate");
            assert_eq!(config.timeouts.per_attempt_seconds(), timeout);
        }
    }

    #[test]
    fn test_config_validation_negative_weight_fails() {
        let bad = r#"
[scoring]
action_weight = -5.0

[bindings]
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("action_weight"));
    }

    #[test]
    fn test_config_validation_zero_length_cap_fails() {
        let bad = r#"
[scoring]
length_cap_chars = 0

[bindings]
"#;
        let result = Config::from_str(bad);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("length_cap_chars"));
    }

    #[test]
    fn test_scoring_lexicons_are_overridable() {
        let toml = r#"
[scoring]
action_words = ["mayday"]

[bindings]
"#;
        let config = Config::from_str(toml).expect("should parse lexicon override");
        assert_eq!(config.scoring.action_words(), &["mayday".to_string()]);
        // Untouched lexicons keep their defaults
        assert!(
            config
                .scoring
                .technical_terms()
                .contains(&"database".to_string())
        );
    }
}

//! Scoring and selection performance benchmarks
//!
//! Measures the non-I/O half of the request path (excludes network dispatch).
//!
//! ## Expected Performance Characteristics
//!
//! - Complexity scoring: Single-digit microseconds for typical emails (one
//!   tokenization pass over the text plus hash-set lookups)
//! - Candidate selection: Sub-microsecond (a handful of slice scans over
//!   validated configuration)
//! - Config parsing: Single-digit microseconds (one-time startup cost)
//!
//! **Note**: Actual measurements vary with compiler version, CPU architecture,
//! and system load. Run `cargo bench` to measure on your system.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mailroute::{
    complexity::ComplexityScorer,
    config::{Config, ScoringConfig},
    router::{AnalysisType, ModelSelector},
};
use std::sync::Arc;

const CONFIG: &str = r#"
[providers.anthropic]
api_key = "sk-ant-bench"

[providers.openai]
api_key = "sk-bench"

[[bindings.fast_cheap]]
provider = "anthropic"
model = "claude-3-5-haiku-20241022"

[[bindings.fast_cheap]]
provider = "openai"
model = "gpt-4o-mini"

[[bindings.balanced]]
provider = "openai"
model = "gpt-4o"

[[bindings.high_capability]]
provider = "anthropic"
model = "claude-3-7-sonnet-20250219"
"#;

/// Benchmark the complexity scorer over emails of varying size and density
fn bench_complexity_scoring(c: &mut Criterion) {
    let scorer = ComplexityScorer::new(&ScoringConfig::default());

    let long_thread = "Following up on the deployment discussion. ".repeat(120);
    let emails = vec![
        ("short", "Hi, just checking in on the project status. Thanks!"),
        (
            "urgent",
            "URGENT: Critical production database failure affecting 1000+ users, \
             need immediate response",
        ),
        ("long_thread", long_thread.as_str()),
    ];

    let mut group = c.benchmark_group("complexity_scoring");

    for (name, email) in emails {
        group.bench_with_input(BenchmarkId::from_parameter(name), &email, |b, e| {
            b.iter(|| scorer.report(e));
        });
    }

    group.finish();
}

/// Benchmark candidate chain construction for both sides of the threshold
fn bench_candidate_selection(c: &mut Criterion) {
    let config: Arc<Config> = Arc::new(CONFIG.parse().unwrap());
    let selector = ModelSelector::new(config);

    let mut group = c.benchmark_group("candidate_selection");

    for (name, score) in [("simple", 10.0), ("complex", 250.0)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &score, |b, s| {
            b.iter(|| selector.select(*s, AnalysisType::Summary));
        });
    }

    group.finish();
}

/// Benchmark configuration parsing and validation
///
/// This runs once at startup, so even milliseconds would be acceptable.
fn bench_config_parsing(c: &mut Criterion) {
    c.bench_function("config_parsing", |b| {
        b.iter(|| CONFIG.parse::<Config>().unwrap());
    });
}

criterion_group!(
    benches,
    bench_complexity_scoring,
    bench_candidate_selection,
    bench_config_parsing,
);
criterion_main!(benches);

//! Failover chains with exactly one fallback tier.
//!
//! A chain holds engines in priority order (index 0 = primary). On a
//! recoverable failure (see [`Error::is_fallback_trigger`]) the next tier is
//! tried once; permanent errors are terminal and stop the chain. There is no
//! retry of the same tier and no backoff loop: engine failures are assumed
//! either deterministic for the input or too expensive to retry blindly.
//!
//! The tier that produced the output is recorded in [`Engined::engine`] and
//! counted in metrics, so callers can distinguish degraded responses.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use crate::telemetry;
use crate::{Error, Result};

use super::traits::{SpeechEngine, SummaryBounds, SummaryEngine, VoiceSpec};

/// An engine output together with the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Engined<T> {
    /// The engine output.
    pub value: T,
    /// Name of the engine that answered.
    pub engine: String,
    /// True when a non-primary tier answered.
    pub fell_back: bool,
}

/// Summary engines in priority order.
pub struct SummaryChain {
    service: &'static str,
    engines: Vec<Arc<dyn SummaryEngine>>,
}

impl SummaryChain {
    /// Build a chain from a primary engine and an optional fallback tier.
    pub fn new(primary: Arc<dyn SummaryEngine>, fallback: Option<Arc<dyn SummaryEngine>>) -> Self {
        let mut engines = vec![primary];
        engines.extend(fallback);
        Self {
            service: "summarizer",
            engines,
        }
    }

    /// Engine names in priority order.
    pub fn engine_names(&self) -> Vec<String> {
        self.engines.iter().map(|e| e.name().to_string()).collect()
    }

    /// Summarize through the chain, recording the answering tier.
    pub async fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<Engined<String>> {
        let start = Instant::now();
        let mut last_err = None;
        for (tier, engine) in self.engines.iter().enumerate() {
            match engine.summarize(text, bounds).await {
                Ok(summary) => {
                    record_request(self.service, "summarize", start, true);
                    if tier > 0 {
                        record_fallback(self.service, engine.name());
                    }
                    return Ok(Engined {
                        value: summary,
                        engine: engine.name().to_string(),
                        fell_back: tier > 0,
                    });
                }
                Err(e) if e.is_fallback_trigger() => {
                    warn!(engine = engine.name(), error = %e, "summary engine failed, trying next tier");
                    last_err = Some(e);
                }
                Err(e) => {
                    record_request(self.service, "summarize", start, false);
                    return Err(e);
                }
            }
        }
        record_request(self.service, "summarize", start, false);
        Err(exhausted(last_err))
    }
}

/// Speech engines in priority order.
///
/// The source system ships a single synthesis engine, so the common case is
/// a one-tier chain; the failover mechanics stay available for deployments
/// that configure a backup engine.
pub struct SpeechChain {
    service: &'static str,
    engines: Vec<Arc<dyn SpeechEngine>>,
}

impl SpeechChain {
    /// Build a chain from a primary engine and an optional fallback tier.
    pub fn new(primary: Arc<dyn SpeechEngine>, fallback: Option<Arc<dyn SpeechEngine>>) -> Self {
        let mut engines = vec![primary];
        engines.extend(fallback);
        Self {
            service: "speech",
            engines,
        }
    }

    /// Engine names in priority order.
    pub fn engine_names(&self) -> Vec<String> {
        self.engines.iter().map(|e| e.name().to_string()).collect()
    }

    /// Whether the primary engine reports itself usable.
    pub async fn ready(&self) -> bool {
        match self.engines.first() {
            Some(engine) => engine.ready().await,
            None => false,
        }
    }

    /// Synthesize through the chain, recording the answering tier.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSpec,
        output: &Path,
    ) -> Result<Engined<()>> {
        let start = Instant::now();
        let mut last_err = None;
        for (tier, engine) in self.engines.iter().enumerate() {
            match engine.synthesize(text, voice, output).await {
                Ok(()) => {
                    record_request(self.service, "synthesize", start, true);
                    if tier > 0 {
                        record_fallback(self.service, engine.name());
                    }
                    return Ok(Engined {
                        value: (),
                        engine: engine.name().to_string(),
                        fell_back: tier > 0,
                    });
                }
                Err(e) if e.is_fallback_trigger() => {
                    warn!(engine = engine.name(), error = %e, "speech engine failed, trying next tier");
                    last_err = Some(e);
                }
                Err(e) => {
                    record_request(self.service, "synthesize", start, false);
                    return Err(e);
                }
            }
        }
        record_request(self.service, "synthesize", start, false);
        Err(exhausted(last_err))
    }
}

fn exhausted(last_err: Option<Error>) -> Error {
    Error::EnginesExhausted(
        last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no engines configured".to_string()),
    )
}

fn record_request(service: &'static str, operation: &'static str, start: Instant, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(telemetry::REQUESTS_TOTAL,
        "service" => service,
        "operation" => operation,
        "status" => status,
    )
    .increment(1);
    metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
        "service" => service,
        "operation" => operation,
    )
    .record(start.elapsed().as_secs_f64());
}

fn record_fallback(service: &'static str, engine: &str) {
    metrics::counter!(telemetry::ENGINE_FALLBACKS_TOTAL,
        "service" => service,
        "engine" => engine.to_owned(),
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubSummaryEngine {
        name: &'static str,
        outcome: fn() -> Result<String>,
    }

    #[async_trait]
    impl SummaryEngine for StubSummaryEngine {
        fn name(&self) -> &str {
            self.name
        }

        async fn summarize(&self, _text: &str, _bounds: SummaryBounds) -> Result<String> {
            (self.outcome)()
        }
    }

    const BOUNDS: SummaryBounds = SummaryBounds {
        min_words: 30,
        max_words: 150,
    };

    fn ok_engine(name: &'static str) -> Arc<dyn SummaryEngine> {
        Arc::new(StubSummaryEngine {
            name,
            outcome: || Ok("a short summary".to_string()),
        })
    }

    fn failing_engine(name: &'static str) -> Arc<dyn SummaryEngine> {
        Arc::new(StubSummaryEngine {
            name,
            outcome: || Err(Error::Engine("boom".to_string())),
        })
    }

    #[tokio::test]
    async fn primary_success_records_primary() {
        let chain = SummaryChain::new(ok_engine("primary"), Some(ok_engine("fallback")));
        let result = chain.summarize("text", BOUNDS).await.unwrap();
        assert_eq!(result.engine, "primary");
        assert!(!result.fell_back);
    }

    #[tokio::test]
    async fn failed_primary_falls_back_once() {
        let chain = SummaryChain::new(failing_engine("primary"), Some(ok_engine("fallback")));
        let result = chain.summarize("text", BOUNDS).await.unwrap();
        assert_eq!(result.engine, "fallback");
        assert!(result.fell_back);
    }

    #[tokio::test]
    async fn both_tiers_failing_is_exhaustion() {
        let chain = SummaryChain::new(failing_engine("primary"), Some(failing_engine("fallback")));
        let result = chain.summarize("text", BOUNDS).await;
        assert!(matches!(result, Err(Error::EnginesExhausted(_))));
    }

    #[tokio::test]
    async fn terminal_errors_skip_the_fallback() {
        let primary: Arc<dyn SummaryEngine> = Arc::new(StubSummaryEngine {
            name: "primary",
            outcome: || {
                Err(Error::Api {
                    status: 401,
                    message: "bad key".to_string(),
                })
            },
        });
        let chain = SummaryChain::new(primary, Some(ok_engine("fallback")));
        let result = chain.summarize("text", BOUNDS).await;
        assert!(matches!(result, Err(Error::Api { status: 401, .. })));
    }

    #[tokio::test]
    async fn single_tier_chain_reports_its_engine() {
        let chain = SummaryChain::new(ok_engine("only"), None);
        assert_eq!(chain.engine_names(), vec!["only"]);
        let result = chain.summarize("text", BOUNDS).await.unwrap();
        assert_eq!(result.engine, "only");
    }
}

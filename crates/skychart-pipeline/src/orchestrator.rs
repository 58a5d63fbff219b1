use crate::error::Result;
use chrono::Utc;
use dashmap::DashMap;
use skychart_ai::{
    GenerationConfig, LLMProvider, LLMProviderFactory, LLMResponse, Message, PromptTemplateEngine,
};
use skychart_cache::AnalysisCache;
use skychart_core::{
    AnalysisMetadata, AnalysisResult, BirthData, BirthDataNormalizer, ChartSubject,
    FingerprintScope, LifeMission, NatalChart, PipelineSettings, SkychartConfig,
};
use skychart_parser::PositionParser;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Drives one analysis from raw birth data to a cached result.
///
/// A run is normalize, cache lookup, chart stage, narrative stage, parse,
/// assemble and store. A failed stage aborts the run and nothing is cached.
pub struct PipelineOrchestrator {
    provider: Arc<dyn LLMProvider>,
    cache: Arc<AnalysisCache>,
    settings: PipelineSettings,
    scope: FingerprintScope,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl PipelineOrchestrator {
    pub fn new(provider: Arc<dyn LLMProvider>, cache: Arc<AnalysisCache>) -> Self {
        Self {
            provider,
            cache,
            settings: PipelineSettings::default(),
            scope: FingerprintScope::default(),
            in_flight: DashMap::new(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_fingerprint_scope(mut self, scope: FingerprintScope) -> Self {
        self.scope = scope;
        self
    }

    /// Wire up provider and cache from a loaded configuration
    pub fn from_config(config: &SkychartConfig) -> Result<Self> {
        let provider = LLMProviderFactory::create_from_config(&config.llm)?;
        let cache = Arc::new(AnalysisCache::new(
            Duration::from_secs(config.cache.ttl_secs),
            config.cache.sweep_threshold,
        ));

        Ok(Self::new(provider, cache)
            .with_settings(config.pipeline.clone())
            .with_fingerprint_scope(config.cache.fingerprint_scope))
    }

    pub fn cache(&self) -> &Arc<AnalysisCache> {
        &self.cache
    }

    pub async fn generate(&self, input: BirthData) -> Result<AnalysisResult> {
        let started = Instant::now();
        let birth = BirthDataNormalizer::normalize(&input)?;
        let fingerprint = birth.fingerprint(self.scope);

        if let Some(hit) = self.cache_hit(&fingerprint) {
            return Ok(hit);
        }

        if !self.settings.coalesce_in_flight {
            return self.run_stages(&birth, fingerprint, started).await;
        }

        let slot = InFlightSlot::join(&self.in_flight, &fingerprint);
        let _guard = slot.lock.lock().await;
        let outcome = match self.cache_hit(&fingerprint) {
            Some(hit) => Ok(hit),
            None => self.run_stages(&birth, fingerprint.clone(), started).await,
        };
        outcome
    }

    fn cache_hit(&self, fingerprint: &str) -> Option<AnalysisResult> {
        let hit = self.cache.get(fingerprint)?;
        info!(fingerprint, "Serving analysis from cache");
        Some(hit.refreshed_from_cache())
    }

    async fn run_stages(
        &self,
        birth: &BirthData,
        fingerprint: String,
        started: Instant,
    ) -> Result<AnalysisResult> {
        info!(fingerprint = %fingerprint, "Starting chart stage");
        let chart = self
            .complete(
                "chart",
                PromptTemplateEngine::chart_messages(birth),
                GenerationConfig::new(
                    self.settings.chart_temperature,
                    self.settings.chart_max_tokens,
                ),
            )
            .await?;

        info!(fingerprint = %fingerprint, "Starting narrative stage");
        let narrative = self
            .complete(
                "narrative",
                PromptTemplateEngine::narrative_messages(birth, &chart.content),
                GenerationConfig::new(
                    self.settings.narrative_temperature,
                    self.settings.narrative_max_tokens,
                ),
            )
            .await?;

        let positions = PositionParser::parse(&chart.content);
        if positions.is_empty() {
            warn!(fingerprint = %fingerprint, "No positions recognized in chart text");
        }

        let tokens_used =
            chart.total_tokens.unwrap_or(0) + narrative.total_tokens.unwrap_or(0);
        let model = if narrative.model.is_empty() {
            self.provider.model_name().to_string()
        } else {
            narrative.model.clone()
        };

        let result = AnalysisResult {
            session_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            chart: NatalChart {
                subject: ChartSubject::from(birth),
                positions,
                raw_text: chart.content,
            },
            mission: LifeMission {
                title: PromptTemplateEngine::mission_title(birth),
                content: narrative.content,
            },
            metadata: AnalysisMetadata {
                processing_time: started.elapsed().as_millis() as u64,
                tokens_used,
                model,
                cached: false,
            },
        };

        info!(
            fingerprint = %fingerprint,
            positions = result.chart.positions.len(),
            tokens_used,
            processing_time_ms = result.metadata.processing_time,
            "Analysis complete"
        );
        self.cache.put(fingerprint, result.clone());
        Ok(result)
    }

    async fn complete(
        &self,
        stage: &str,
        messages: Vec<Message>,
        config: GenerationConfig,
    ) -> Result<LLMResponse> {
        match self.provider.generate_chat(&messages, &config).await {
            Ok(response) => {
                debug!(stage, tokens = ?response.total_tokens, "Stage finished");
                Ok(response)
            }
            Err(err) => {
                warn!(stage, error = %err, "Stage failed; aborting run");
                Err(err.into())
            }
        }
    }
}

/// A caller's share of the per-fingerprint lock. Dropping the last share
/// removes the map entry, including when the owning future is cancelled.
struct InFlightSlot<'a> {
    in_flight: &'a DashMap<String, Arc<Mutex<()>>>,
    fingerprint: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> InFlightSlot<'a> {
    fn join(in_flight: &'a DashMap<String, Arc<Mutex<()>>>, fingerprint: &'a str) -> Self {
        let lock = in_flight
            .entry(fingerprint.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self {
            in_flight,
            fingerprint,
            lock,
        }
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        // Map entry plus this slot means no other caller shares the lock
        self.in_flight
            .remove_if(self.fingerprint, |_, entry| Arc::strong_count(entry) <= 2);
    }
}

//! The five-phase briefing pipeline.
//!
//! | Phase       | Mode       | Agents                                 |
//! |-------------|------------|----------------------------------------|
//! | analysis    | parallel   | curator, impact-analyzer               |
//! | selection   | sequential | selector                               |
//! | writing     | sequential | writer                                 |
//! | enhancement | parallel   | entertainment-curator, media-enhancer  |
//! | aggregation | none       |                                        |
//!
//! Phases run strictly in order and none is skipped. A failed agent's
//! fallback output flows downstream like any other output.

pub mod aggregate;
pub mod phase;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agents::{AgentInvoker, AgentKind, panic_message};
use crate::core::config::PipelineConfig;
use crate::core::models::{ContentBundle, RawItem};
use crate::core::trace::TraceLog;
use crate::errors::BriefingError;
use crate::telemetry::{RunRecorder, RunSummary};

pub use aggregate::{PhaseOutputs, aggregate, build_fallback};
pub use phase::{Phase, PhaseExecutor, PhaseResults, PhaseSpec};

use aggregate::{select_favorite_story, select_news_items, select_script};

pub const ALL_AGENTS_FAILED: &str = "All agent invocations failed; serving unprocessed news items";

// Upper bound on the time recording adds to a response.
const RECORD_TIMEOUT: Duration = Duration::from_secs(1);

pub struct Orchestrator {
    invoker: Arc<dyn AgentInvoker>,
    config: PipelineConfig,
    recorder: Option<Arc<dyn RunRecorder>>,
}

impl Orchestrator {
    pub fn new(invoker: Arc<dyn AgentInvoker>, config: PipelineConfig) -> Self {
        Self {
            invoker,
            config,
            recorder: None,
        }
    }

    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn RunRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the whole pipeline over `raw_items`.
    ///
    /// Always returns a complete bundle. A panicking agent only loses its
    /// own output. Errors and panics outside agent calls turn into a fallback
    /// bundle built from `raw_items`, with the failure reported in `error`.
    #[tracing::instrument(level = "info", skip(self, raw_items), fields(items = raw_items.len()))]
    pub async fn orchestrate(&self, raw_items: Vec<RawItem>) -> ContentBundle {
        let session_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let mut trace = TraceLog::new();

        info!(session_id = %session_id, "Starting briefing run");

        let outcome = AssertUnwindSafe(self.run_pipeline(&session_id, &raw_items, &mut trace))
            .catch_unwind()
            .await;

        let mut bundle = match outcome {
            Ok(Ok(bundle)) => bundle,
            Ok(Err(e)) => {
                error!(session_id = %session_id, error = %e, "Briefing pipeline failed");
                build_fallback(&raw_items, &e.to_string(), self.config.max_news_items)
            }
            Err(panic) => {
                let e = BriefingError::Pipeline(panic_message(panic.as_ref()));
                error!(session_id = %session_id, error = %e, "Briefing pipeline panicked");
                build_fallback(&raw_items, &e.to_string(), self.config.max_news_items)
            }
        };

        let elapsed = started.elapsed();
        bundle.run_id = session_id;
        bundle.trace = trace;
        bundle.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        if elapsed > self.config.target_duration {
            warn!(
                session_id = %bundle.run_id,
                elapsed_ms = bundle.duration_ms,
                target_ms = u64::try_from(self.config.target_duration.as_millis()).unwrap_or(u64::MAX),
                "Briefing run exceeded its target duration"
            );
        }

        info!(
            session_id = %bundle.run_id,
            elapsed_ms = bundle.duration_ms,
            news_items = bundle.news_items.len(),
            fallback = bundle.is_fallback(),
            "Briefing run completed"
        );

        // Lambda freezes the sandbox once the handler returns, so a detached
        // task might never send. Recording stays on the request path, bounded.
        self.record(&bundle).await;
        bundle
    }

    async fn run_pipeline(
        &self,
        session_id: &str,
        raw_items: &[RawItem],
        trace: &mut TraceLog,
    ) -> Result<ContentBundle, BriefingError> {
        let max_items = self.config.max_news_items;
        let executor = PhaseExecutor::new(Arc::clone(&self.invoker), session_id, self.config.clone());
        let items = serde_json::to_value(raw_items)?;

        // Phase 1: analysis
        let mut analysis = executor
            .run_phase(
                PhaseSpec::new(
                    Phase::Analysis,
                    vec![
                        (AgentKind::Curator, json!({ "items": items, "max_items": max_items })),
                        (AgentKind::ImpactAnalyzer, json!({ "items": items })),
                    ],
                ),
                trace,
            )
            .await;
        let curator = analysis.take(AgentKind::Curator);
        let impact = analysis.take(AgentKind::ImpactAnalyzer);

        let news_items = select_news_items(&curator, raw_items, max_items);
        let news_json = serde_json::to_value(&news_items)?;
        let impact_json = impact
            .get(AgentKind::ImpactAnalyzer.output_key())
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));

        // Phase 2: selection
        let mut selection = executor
            .run_phase(
                PhaseSpec::new(
                    Phase::Selection,
                    vec![(
                        AgentKind::Selector,
                        json!({ "news_items": news_json, "impact_analysis": impact_json }),
                    )],
                ),
                trace,
            )
            .await;
        let selector = selection.take(AgentKind::Selector);
        let favorite_json = serde_json::to_value(select_favorite_story(&selector, &news_items))?;

        // Phase 3: writing
        let mut writing = executor
            .run_phase(
                PhaseSpec::new(
                    Phase::Writing,
                    vec![(
                        AgentKind::Writer,
                        json!({ "news_items": news_json, "favorite_story": favorite_json }),
                    )],
                ),
                trace,
            )
            .await;
        let writer = writing.take(AgentKind::Writer);
        let script = select_script(&writer, &news_items);

        // Phase 4: enhancement
        let mut enhancement = executor
            .run_phase(
                PhaseSpec::new(
                    Phase::Enhancement,
                    vec![
                        (
                            AgentKind::EntertainmentCurator,
                            json!({ "news_items": news_json, "impact_analysis": impact_json }),
                        ),
                        (
                            AgentKind::MediaEnhancer,
                            json!({
                                "news_items": news_json,
                                "favorite_story": favorite_json,
                                "script": script,
                            }),
                        ),
                    ],
                ),
                trace,
            )
            .await;

        // Phase 5: aggregation
        let outputs = PhaseOutputs {
            curator,
            impact,
            selector,
            writer,
            entertainment: enhancement.take(AgentKind::EntertainmentCurator),
            media: enhancement.take(AgentKind::MediaEnhancer),
        };

        if trace.successful_agents() == 0 {
            warn!(session_id = %session_id, "No agent succeeded; building fallback bundle");
            return Ok(build_fallback(raw_items, ALL_AGENTS_FAILED, max_items));
        }

        Ok(aggregate(raw_items, &outputs, max_items))
    }

    async fn record(&self, bundle: &ContentBundle) {
        let Some(recorder) = &self.recorder else {
            return;
        };
        let summary = RunSummary::from_bundle(bundle);

        match tokio::time::timeout(RECORD_TIMEOUT, recorder.record_run(&summary)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(session_id = %summary.session_id, error = %e, "Failed to record run"),
            Err(_) => warn!(session_id = %summary.session_id, "Recording run timed out"),
        }
    }
}

mod common;

use std::sync::Arc;
use std::time::Duration;

use briefing::agents::AgentKind;
use briefing::core::config::PipelineConfig;
use briefing::core::trace::{AgentStatus, ExecutionMode, TraceEntry, TraceLog};
use briefing::pipeline::{Phase, PhaseExecutor, PhaseSpec};
use common::{Behavior, ScriptedInvoker};
use serde_json::json;

fn executor(invoker: ScriptedInvoker, config: PipelineConfig) -> (Arc<ScriptedInvoker>, PhaseExecutor) {
    let invoker = Arc::new(invoker);
    let executor = PhaseExecutor::new(invoker.clone(), "session-1", config);
    (invoker, executor)
}

fn enhancement_spec() -> PhaseSpec {
    PhaseSpec::new(
        Phase::Enhancement,
        vec![
            (AgentKind::EntertainmentCurator, json!({ "news_items": [] })),
            (AgentKind::MediaEnhancer, json!({ "news_items": [] })),
        ],
    )
}

#[tokio::test]
async fn test_failed_agent_gets_fallback_output() {
    let (_, executor) = executor(
        ScriptedInvoker::new(Behavior::Respond(json!({ "media_enhancements": { "images": [] } })))
            .with(AgentKind::EntertainmentCurator, Behavior::Fail),
        PipelineConfig::default(),
    );
    let mut trace = TraceLog::new();

    let results = executor.run_phase(enhancement_spec(), &mut trace).await;

    assert_eq!(
        results.output(AgentKind::EntertainmentCurator),
        Some(&AgentKind::EntertainmentCurator.fallback_output())
    );
    assert_eq!(results.failed(), [AgentKind::EntertainmentCurator]);
    assert!(results.is_degraded());

    let failed = trace
        .agents()
        .find(|agent| agent.agent_name == AgentKind::EntertainmentCurator)
        .unwrap();
    assert!(!failed.success);
    assert_eq!(failed.status, AgentStatus::Failed);
    assert_eq!(failed.output_summary, "Recommended 0 weekend items");
    assert!(failed.error.as_deref().unwrap().contains("service unavailable"));
}

#[tokio::test]
async fn test_phase_trace_precedes_agent_traces_in_request_order() {
    let (_, executor) = executor(
        ScriptedInvoker::new(Behavior::Respond(json!({})))
            .with(
                AgentKind::EntertainmentCurator,
                Behavior::RespondAfter(Duration::from_millis(40), json!({})),
            ),
        PipelineConfig::default(),
    );
    let mut trace = TraceLog::new();

    executor.run_phase(enhancement_spec(), &mut trace).await;

    let entries = trace.entries();
    assert_eq!(entries.len(), 3);
    let TraceEntry::Phase(phase) = &entries[0] else {
        panic!("first entry should be the phase trace");
    };
    assert_eq!(phase.phase_name, "enhancement");
    assert_eq!(phase.execution_mode, ExecutionMode::Parallel);
    assert_eq!(
        phase.agent_names,
        [AgentKind::EntertainmentCurator, AgentKind::MediaEnhancer]
    );
    assert!(!phase.degraded);

    let agents: Vec<AgentKind> = trace.agents().map(|agent| agent.agent_name).collect();
    assert_eq!(agents, [AgentKind::EntertainmentCurator, AgentKind::MediaEnhancer]);
    assert!(trace.agents().next().unwrap().execution_time_ms >= 40);
}

#[tokio::test]
async fn test_phase_metadata_counts_failures() {
    let (_, executor) = executor(
        ScriptedInvoker::new(Behavior::Respond(json!({})))
            .with(AgentKind::MediaEnhancer, Behavior::TimeOut),
        PipelineConfig::default(),
    );
    let mut trace = TraceLog::new();

    executor.run_phase(enhancement_spec(), &mut trace).await;

    let phase = trace.phases().next().unwrap();
    assert!(phase.degraded);
    assert_eq!(phase.metadata["succeeded"], 1);
    assert_eq!(phase.metadata["failed"], json!(["media-enhancer"]));
    assert_eq!(
        phase.metadata["summaries"]["media-enhancer"],
        "Prepared 0 media enhancements"
    );

    let media = trace
        .agents()
        .find(|agent| agent.agent_name == AgentKind::MediaEnhancer)
        .unwrap();
    assert_eq!(media.status, AgentStatus::TimedOut);
}

#[tokio::test]
async fn test_sequential_mode_runs_one_at_a_time() {
    let delay = Duration::from_millis(80);
    let (invoker, executor) = executor(
        ScriptedInvoker::new(Behavior::RespondAfter(delay, json!({}))),
        PipelineConfig::default(),
    );
    let mut trace = TraceLog::new();

    executor
        .run_phase(enhancement_spec().with_mode(ExecutionMode::Sequential), &mut trace)
        .await;

    let calls = invoker.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].started.duration_since(calls[0].started) >= delay);
    assert_eq!(
        trace.phases().next().unwrap().execution_mode,
        ExecutionMode::Sequential
    );
}

#[tokio::test]
async fn test_concurrency_limit_serializes_parallel_phase() {
    let delay = Duration::from_millis(80);
    let config = PipelineConfig {
        max_concurrent_invocations: 1,
        ..PipelineConfig::default()
    };
    let (invoker, executor) = executor(
        ScriptedInvoker::new(Behavior::RespondAfter(delay, json!({}))),
        config,
    );
    let mut trace = TraceLog::new();

    executor.run_phase(enhancement_spec(), &mut trace).await;

    let calls = invoker.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].started.duration_since(calls[0].started) >= delay);
}

#[tokio::test]
async fn test_requests_carry_session_and_per_agent_timeout() {
    struct TimeoutProbe;

    #[async_trait::async_trait]
    impl briefing::agents::AgentInvoker for TimeoutProbe {
        async fn invoke(
            &self,
            request: &briefing::agents::InvocationRequest,
        ) -> Result<serde_json::Value, briefing::errors::AgentError> {
            Ok(json!({
                "session": request.session_id,
                "timeout_ms": request.timeout.as_millis() as u64,
            }))
        }
    }

    let mut config = PipelineConfig::default();
    config
        .agent_timeouts
        .insert(AgentKind::MediaEnhancer, Duration::from_secs(5));
    let executor = PhaseExecutor::new(Arc::new(TimeoutProbe), "session-42", config);
    let mut trace = TraceLog::new();

    let results = executor.run_phase(enhancement_spec(), &mut trace).await;

    let media = results.output(AgentKind::MediaEnhancer).unwrap();
    assert_eq!(media["session"], "session-42");
    assert_eq!(media["timeout_ms"], 5_000);
    let entertainment = results.output(AgentKind::EntertainmentCurator).unwrap();
    assert_eq!(entertainment["timeout_ms"], 25_000);
}

#[tokio::test]
async fn test_take_returns_fallback_for_absent_agent() {
    let (_, executor) = executor(
        ScriptedInvoker::new(Behavior::Respond(json!({ "script": "Hello" }))),
        PipelineConfig::default(),
    );
    let mut trace = TraceLog::new();

    let mut results = executor
        .run_phase(
            PhaseSpec::new(Phase::Writing, vec![(AgentKind::Writer, json!({}))]),
            &mut trace,
        )
        .await;

    assert_eq!(results.take(AgentKind::Writer), json!({ "script": "Hello" }));
    assert_eq!(results.take(AgentKind::Selector), AgentKind::Selector.fallback_output());
}

#[tokio::test]
async fn test_panicking_agent_gets_fallback_output() {
    let (_, executor) = executor(
        ScriptedInvoker::new(Behavior::Respond(json!({ "media_enhancements": { "images": ["a.jpg"] } })))
            .with(AgentKind::EntertainmentCurator, Behavior::Panic),
        PipelineConfig::default(),
    );
    let mut trace = TraceLog::new();

    let results = executor.run_phase(enhancement_spec(), &mut trace).await;

    assert_eq!(
        results.output(AgentKind::EntertainmentCurator),
        Some(&AgentKind::EntertainmentCurator.fallback_output())
    );
    assert_eq!(
        results.output(AgentKind::MediaEnhancer),
        Some(&json!({ "media_enhancements": { "images": ["a.jpg"] } }))
    );
    assert_eq!(results.failed(), [AgentKind::EntertainmentCurator]);

    assert_eq!(trace.phases().count(), 1);
    let failed = trace
        .agents()
        .find(|agent| agent.agent_name == AgentKind::EntertainmentCurator)
        .unwrap();
    assert_eq!(failed.status, AgentStatus::Failed);
    assert!(
        failed
            .error
            .as_deref()
            .unwrap()
            .contains("agent panicked: scripted panic for entertainment-curator")
    );
}

//! Running one phase: a group of agent invocations under one execution mode.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde_json::{Map, Value, json};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::agents::{AgentInvoker, AgentKind, InvocationOutcome, InvocationRequest, run_invocation};
use crate::core::config::PipelineConfig;
use crate::core::trace::{AgentStatus, AgentTrace, ExecutionMode, PhaseTrace, TraceEntry, TraceLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Analysis,
    Selection,
    Writing,
    Enhancement,
}

impl Phase {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Analysis => "analysis",
            Phase::Selection => "selection",
            Phase::Writing => "writing",
            Phase::Enhancement => "enhancement",
        }
    }

    #[must_use]
    pub const fn mode(self) -> ExecutionMode {
        match self {
            Phase::Analysis | Phase::Enhancement => ExecutionMode::Parallel,
            Phase::Selection | Phase::Writing => ExecutionMode::Sequential,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Invocations making up one phase, in request order.
#[derive(Debug, Clone)]
pub struct PhaseSpec {
    pub phase: Phase,
    pub mode: ExecutionMode,
    pub invocations: Vec<(AgentKind, Value)>,
}

impl PhaseSpec {
    /// Uses the phase's standard execution mode.
    #[must_use]
    pub fn new(phase: Phase, invocations: Vec<(AgentKind, Value)>) -> Self {
        Self {
            phase,
            mode: phase.mode(),
            invocations,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Per-agent outputs of a phase. Failed agents hold their fallback output.
#[derive(Debug, Default)]
pub struct PhaseResults {
    outputs: HashMap<AgentKind, Value>,
    failed: Vec<AgentKind>,
}

impl PhaseResults {
    #[must_use]
    pub fn output(&self, agent: AgentKind) -> Option<&Value> {
        self.outputs.get(&agent)
    }

    /// Removes an agent's output, or its fallback if the agent was not in the phase.
    pub fn take(&mut self, agent: AgentKind) -> Value {
        self.outputs
            .remove(&agent)
            .unwrap_or_else(|| agent.fallback_output())
    }

    #[must_use]
    pub fn failed(&self) -> &[AgentKind] {
        &self.failed
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Executes phases for a single run, sharing one session id.
pub struct PhaseExecutor {
    invoker: Arc<dyn AgentInvoker>,
    session_id: String,
    config: PipelineConfig,
    permits: Semaphore,
}

impl PhaseExecutor {
    pub fn new(
        invoker: Arc<dyn AgentInvoker>,
        session_id: impl Into<String>,
        config: PipelineConfig,
    ) -> Self {
        let permits = Semaphore::new(config.max_concurrent_invocations.max(1));
        Self {
            invoker,
            session_id: session_id.into(),
            config,
            permits,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Runs every invocation of the phase and records its trace.
    ///
    /// Never fails: a failed invocation contributes its agent's fallback
    /// output. After all invocations finish, one [`PhaseTrace`] and then one
    /// [`AgentTrace`] per invocation are appended to `trace`, in request
    /// order.
    pub async fn run_phase(&self, spec: PhaseSpec, trace: &mut TraceLog) -> PhaseResults {
        let started = Instant::now();
        let agent_names: Vec<AgentKind> = spec.invocations.iter().map(|(agent, _)| *agent).collect();

        info!(
            phase = %spec.phase,
            mode = ?spec.mode,
            agents = ?agent_names,
            session_id = %self.session_id,
            "Starting phase"
        );

        let outcomes = match spec.mode {
            ExecutionMode::Parallel => {
                join_all(
                    spec.invocations
                        .into_iter()
                        .map(|(agent, payload)| self.invoke_one(agent, payload)),
                )
                .await
            }
            ExecutionMode::Sequential => {
                let mut outcomes = Vec::with_capacity(spec.invocations.len());
                for (agent, payload) in spec.invocations {
                    outcomes.push(self.invoke_one(agent, payload).await);
                }
                outcomes
            }
        };

        let duration = started.elapsed();
        let mut results = PhaseResults::default();
        let mut agent_traces = Vec::with_capacity(outcomes.len());
        let mut summaries = Map::new();

        for outcome in outcomes {
            let execution_time_ms = outcome.execution_time_ms();
            let InvocationOutcome { agent, result, .. } = outcome;

            let (output, status, error) = match result {
                Ok(output) => (output, AgentStatus::Success, None),
                Err(e) => {
                    warn!(
                        phase = %spec.phase,
                        agent = %agent,
                        error = %e,
                        "Agent failed; substituting fallback output"
                    );
                    results.failed.push(agent);
                    (agent.fallback_output(), e.status(), Some(e.to_string()))
                }
            };

            let output_summary = agent.summarize(&output);
            summaries.insert(agent.to_string(), Value::String(output_summary.clone()));
            agent_traces.push(AgentTrace {
                agent_name: agent,
                status,
                success: status.is_success(),
                execution_time_ms,
                input_sources: agent
                    .input_sources()
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect(),
                output_summary,
                error,
            });
            results.outputs.insert(agent, output);
        }

        let failed_names: Vec<&str> = results.failed.iter().map(|a| a.as_str()).collect();
        let phase_trace = PhaseTrace {
            phase_name: spec.phase.name().to_string(),
            agent_names,
            execution_mode: spec.mode,
            duration_seconds: duration.as_secs_f64(),
            degraded: results.is_degraded(),
            metadata: json!({
                "succeeded": agent_traces.len() - results.failed.len(),
                "failed": failed_names,
                "summaries": summaries,
            }),
        };

        info!(
            phase = %spec.phase,
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            degraded = phase_trace.degraded,
            "Phase completed"
        );

        trace.append(TraceEntry::Phase(phase_trace));
        for agent_trace in agent_traces {
            trace.append(TraceEntry::Agent(agent_trace));
        }

        results
    }

    async fn invoke_one(&self, agent: AgentKind, payload: Value) -> InvocationOutcome {
        let request = InvocationRequest {
            agent,
            payload,
            session_id: self.session_id.clone(),
            timeout: self.config.timeout_for(agent),
        };
        // Acquire only errors on a closed semaphore.
        let _permit = self.permits.acquire().await.ok();
        run_invocation(self.invoker.as_ref(), &request).await
    }
}

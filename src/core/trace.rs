//! Append-only execution trace for one orchestrator run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::AgentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Parallel,
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Success,
    Failed,
    TimedOut,
}

impl AgentStatus {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTrace {
    pub phase_name: String,
    /// Agents in the order they were requested, not completion order.
    pub agent_names: Vec<AgentKind>,
    pub execution_mode: ExecutionMode,
    pub duration_seconds: f64,
    /// True when at least one agent in the phase fell back.
    pub degraded: bool,
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTrace {
    pub agent_name: AgentKind,
    pub status: AgentStatus,
    pub success: bool,
    pub execution_time_ms: u64,
    pub input_sources: Vec<String>,
    pub output_summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEntry {
    Phase(PhaseTrace),
    Agent(AgentTrace),
}

/// Ordered audit log. Entries can be appended but never changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceLog {
    entries: Vec<TraceEntry>,
}

impl TraceLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn phases(&self) -> impl Iterator<Item = &PhaseTrace> {
        self.entries.iter().filter_map(|entry| match entry {
            TraceEntry::Phase(phase) => Some(phase),
            TraceEntry::Agent(_) => None,
        })
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentTrace> {
        self.entries.iter().filter_map(|entry| match entry {
            TraceEntry::Agent(agent) => Some(agent),
            TraceEntry::Phase(_) => None,
        })
    }

    /// Number of agent invocations that returned real output.
    #[must_use]
    pub fn successful_agents(&self) -> usize {
        self.agents().filter(|agent| agent.success).count()
    }

    /// Short phase-level digest used by run telemetry.
    #[must_use]
    pub fn summary(&self) -> Vec<Value> {
        self.phases()
            .map(|phase| {
                serde_json::json!({
                    "phase": phase.phase_name,
                    "mode": phase.execution_mode,
                    "duration_seconds": phase.duration_seconds,
                    "degraded": phase.degraded,
                })
            })
            .collect()
    }
}

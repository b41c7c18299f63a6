//! Agent invocation: the capability the pipeline consumes.
//!
//! The orchestrator only sees the [`AgentInvoker`] trait. Concrete clients
//! live in [`bedrock`] (the managed agent runtime) and [`blocking`] (any
//! synchronous client run on the blocking pool).

pub mod bedrock;
pub mod blocking;
pub mod kind;
pub mod registry;
pub mod stream;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;

use crate::errors::AgentError;

pub use bedrock::BedrockAgentClient;
pub use blocking::{BlockingAgentClient, BlockingInvoker};
pub use kind::AgentKind;
pub use registry::{AgentIdentity, AgentRegistry, AgentResolver, EnvAgentResolver, SsmAgentResolver};
pub use stream::{collect_chunks, parse_agent_output};

/// One call to one agent. Built per call and never persisted.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub agent: AgentKind,
    pub payload: Value,
    pub session_id: String,
    pub timeout: Duration,
}

impl InvocationRequest {
    /// Compact JSON rendering of the payload sent over the wire.
    ///
    /// # Errors
    ///
    /// Returns an invocation error if the payload cannot be serialized.
    pub fn input_text(&self) -> Result<String, AgentError> {
        serde_json::to_string(&self.payload)
            .map_err(|e| AgentError::invocation(self.agent, format!("payload serialization: {e}")))
    }
}

/// Result of one call, consumed immediately by the phase executor.
#[derive(Debug)]
pub struct InvocationOutcome {
    pub agent: AgentKind,
    pub result: Result<Value, AgentError>,
    pub execution_time: Duration,
}

impl InvocationOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    #[must_use]
    pub fn execution_time_ms(&self) -> u64 {
        u64::try_from(self.execution_time.as_millis()).unwrap_or(u64::MAX)
    }
}

#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Invokes an agent and returns its parsed output.
    ///
    /// Implementations must not swallow failures or retry: the caller decides
    /// what to substitute.
    async fn invoke(&self, request: &InvocationRequest) -> Result<Value, AgentError>;
}

/// Runs one invocation and measures it.
///
/// A panicking invoker is reported as an invocation error for that agent.
pub async fn run_invocation(
    invoker: &dyn AgentInvoker,
    request: &InvocationRequest,
) -> InvocationOutcome {
    let started = Instant::now();
    let result = match AssertUnwindSafe(invoker.invoke(request)).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(AgentError::invocation(
            request.agent,
            format!("agent panicked: {}", panic_message(panic.as_ref())),
        )),
    };
    InvocationOutcome {
        agent: request.agent,
        result,
        execution_time: started.elapsed(),
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

//! Adapter for synchronous agent clients.
//!
//! A blocking call must not stall the cooperative scheduler, so each call is
//! moved onto tokio's blocking pool and awaited under the agent's timeout. A
//! call that overruns is reported as a timeout; the worker thread finishes on
//! its own and its result is dropped.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::stream::parse_agent_output;
use super::{AgentInvoker, AgentKind, InvocationRequest};
use crate::errors::AgentError;

pub trait BlockingAgentClient: Send + Sync + 'static {
    /// Sends compact JSON input and returns the agent's raw text output.
    fn invoke_blocking(
        &self,
        agent: AgentKind,
        session_id: &str,
        input_text: &str,
    ) -> Result<String, AgentError>;
}

pub struct BlockingInvoker<C> {
    client: Arc<C>,
}

impl<C: BlockingAgentClient> BlockingInvoker<C> {
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl<C: BlockingAgentClient> AgentInvoker for BlockingInvoker<C> {
    async fn invoke(&self, request: &InvocationRequest) -> Result<Value, AgentError> {
        let agent = request.agent;
        let input_text = request.input_text()?;
        let session_id = request.session_id.clone();
        let client = Arc::clone(&self.client);
        let started = Instant::now();

        let handle = tokio::task::spawn_blocking(move || {
            client.invoke_blocking(agent, &session_id, &input_text)
        });

        match tokio::time::timeout(request.timeout, handle).await {
            Err(_) => {
                warn!(agent = %agent, "Blocking agent call exceeded its timeout");
                Err(AgentError::Timeout {
                    agent,
                    elapsed: started.elapsed(),
                    limit: request.timeout,
                })
            }
            Ok(Err(join_error)) => Err(AgentError::invocation(
                agent,
                format!("worker task failed: {join_error}"),
            )),
            Ok(Ok(result)) => result.map(|text| parse_agent_output(&text)),
        }
    }
}

//! Bedrock managed-agent client.

use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_bedrockagentruntime::Client as BedrockAgentRuntimeClient;
use aws_sdk_bedrockagentruntime::types::ResponseStream;
use futures::stream;
use serde_json::Value;
use tracing::{info, warn};

use super::stream::{collect_chunks, parse_agent_output};
use super::{AgentInvoker, AgentRegistry, InvocationRequest};
use crate::errors::AgentError;

/// Invokes agents through `InvokeAgent` and reads the streamed completion.
pub struct BedrockAgentClient {
    client: BedrockAgentRuntimeClient,
    registry: AgentRegistry,
}

impl BedrockAgentClient {
    #[must_use]
    pub fn new(client: BedrockAgentRuntimeClient, registry: AgentRegistry) -> Self {
        Self { client, registry }
    }

    /// Builds the SDK client from the ambient AWS configuration.
    pub async fn from_env(registry: AgentRegistry) -> Self {
        let shared = aws_config::from_env().load().await;
        Self::new(BedrockAgentRuntimeClient::new(&shared), registry)
    }

    #[must_use]
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }
}

#[async_trait]
impl AgentInvoker for BedrockAgentClient {
    async fn invoke(&self, request: &InvocationRequest) -> Result<Value, AgentError> {
        let agent = request.agent;
        let identity = self
            .registry
            .get(agent)
            .ok_or(AgentError::NotConfigured(agent))?;
        let input_text = request.input_text()?;
        let started = Instant::now();

        #[cfg(feature = "debug-logs")]
        info!(agent = %agent, "Invoking agent with input:\n{}", input_text);

        #[cfg(not(feature = "debug-logs"))]
        info!(
            agent = %agent,
            session_id = %request.session_id,
            input_bytes = input_text.len(),
            "Invoking agent"
        );

        let send = self
            .client
            .invoke_agent()
            .agent_id(&identity.agent_id)
            .agent_alias_id(&identity.alias_id)
            .session_id(&request.session_id)
            .input_text(input_text)
            .send();

        let output = tokio::time::timeout(request.timeout, send)
            .await
            .map_err(|_| AgentError::Timeout {
                agent,
                elapsed: started.elapsed(),
                limit: request.timeout,
            })?
            .map_err(|e| {
                AgentError::invocation(
                    agent,
                    aws_sdk_bedrockagentruntime::error::DisplayErrorContext(&e).to_string(),
                )
            })?;

        let chunks = stream::unfold(Some(output.completion), move |receiver| async move {
            let mut receiver = receiver?;
            loop {
                match receiver.recv().await {
                    Ok(Some(ResponseStream::Chunk(part))) => {
                        let bytes = part.bytes().map(|b| b.as_ref().to_vec()).unwrap_or_default();
                        return Some((Ok(bytes), Some(receiver)));
                    }
                    // Trace and return-control events carry no completion text.
                    Ok(Some(_)) => {}
                    Ok(None) => return None,
                    Err(e) => {
                        let err = AgentError::invocation(
                            agent,
                            format!("completion stream: {}", aws_sdk_bedrockagentruntime::error::DisplayErrorContext(&e)),
                        );
                        return Some((Err(err), None));
                    }
                }
            }
        });
        let chunks = std::pin::pin!(chunks);

        let text = collect_chunks(agent, chunks, started, request.timeout).await?;
        let value = parse_agent_output(&text);

        if value.get("raw_output").is_some() {
            warn!(agent = %agent, "Agent returned non-JSON output; wrapped as text");
        }
        info!(
            agent = %agent,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            output_bytes = text.len(),
            "Agent invocation completed"
        );

        Ok(value)
    }
}

//! API Lambda handler: parses the request, runs the pipeline, returns the bundle.

use std::sync::Arc;

use aws_sdk_bedrockagentruntime::Client as BedrockAgentRuntimeClient;
use aws_sdk_sqs::Client as SqsClient;
use aws_sdk_ssm::Client as SsmClient;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{error, info};

use super::{helpers, parsing};
use crate::agents::{AgentRegistry, AgentResolver, BedrockAgentClient, EnvAgentResolver, SsmAgentResolver};
use crate::core::config::AppConfig;
use crate::errors::BriefingError;
use crate::pipeline::Orchestrator;
use crate::telemetry::{RunRecorder, SqsRunRecorder, TracingRecorder};

pub use self::function_handler as handler;

// Built once per warm container.
static ORCHESTRATOR: OnceCell<Orchestrator> = OnceCell::const_new();

/// Builds the production orchestrator from the environment.
///
/// # Errors
///
/// Returns [`BriefingError::Configuration`] if the environment is invalid or
/// any agent cannot be resolved.
pub async fn build_orchestrator() -> Result<Orchestrator, BriefingError> {
    let config = AppConfig::from_env().map_err(BriefingError::Configuration)?;
    let shared = aws_config::from_env().load().await;

    let resolver: Box<dyn AgentResolver> = match &config.agent_param_prefix {
        Some(prefix) => Box::new(SsmAgentResolver::new(SsmClient::new(&shared), prefix.clone())),
        None => Box::new(EnvAgentResolver::from_env()),
    };
    let registry = AgentRegistry::resolve_all(resolver.as_ref()).await?;
    let invoker = Arc::new(BedrockAgentClient::new(
        BedrockAgentRuntimeClient::new(&shared),
        registry,
    ));

    let recorder: Arc<dyn RunRecorder> = match &config.run_queue_url {
        Some(queue_url) => Arc::new(SqsRunRecorder::new(SqsClient::new(&shared), queue_url.clone())),
        None => Arc::new(TracingRecorder),
    };

    Ok(Orchestrator::new(invoker, config.pipeline).with_recorder(recorder))
}

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Fails the invocation only when the orchestrator cannot be configured.
/// Every request that reaches the pipeline gets a 200 with a bundle.
#[tracing::instrument(level = "info", skip(event))]
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let orchestrator = ORCHESTRATOR
        .get_or_try_init(build_orchestrator)
        .await
        .map_err(|e| {
            error!("Config error: {}", e);
            Error::from(e.to_string())
        })?;

    Ok(handle_request(orchestrator, &event.payload).await)
}

/// Routes one proxy event against an orchestrator.
pub async fn handle_request(orchestrator: &Orchestrator, payload: &Value) -> Value {
    if parsing::is_preflight(payload) {
        return helpers::preflight();
    }

    let items = match parsing::parse_raw_items(payload) {
        Ok(items) => items,
        Err(e) => {
            error!("Request parse error: {}", e);
            return helpers::err_response(400, &e.to_string());
        }
    };

    info!(items = items.len(), "Briefing request received");
    let bundle = orchestrator.orchestrate(items).await;
    helpers::ok_json(&bundle)
}

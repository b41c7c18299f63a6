/// Briefing - the orchestration core of a news-briefing service.
///
/// Raw news items go through a fixed five-phase pipeline of managed LLM
/// agents and come back as one content bundle with a full execution trace:
/// 1. Analysis: curator and impact analyzer, in parallel
/// 2. Selection: the selector picks a favorite story
/// 3. Writing: the writer produces the briefing script
/// 4. Enhancement: entertainment curator and media enhancer, in parallel
/// 5. Aggregation into the response bundle
///
/// # Architecture
///
/// The system uses:
/// - AWS Lambda for the HTTP API
/// - Amazon Bedrock agents, invoked through `aws-sdk-bedrockagentruntime`
/// - SSM Parameter Store (optional) for agent identities
/// - SQS (optional) for run summaries
/// - Tokio for async runtime
///
/// A failing agent never fails the run: its fallback output flows downstream
/// and the trace records the failure.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use briefing::agents::{AgentRegistry, BedrockAgentClient, EnvAgentResolver};
/// use briefing::core::config::PipelineConfig;
/// use briefing::core::models::RawItem;
/// use briefing::pipeline::Orchestrator;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     briefing::setup_logging();
///
///     let registry = AgentRegistry::resolve_all(&EnvAgentResolver::from_env()).await?;
///     let invoker = Arc::new(BedrockAgentClient::from_env(registry).await);
///     let orchestrator = Orchestrator::new(invoker, PipelineConfig::default());
///
///     let items = vec![RawItem {
///         title: "Local library opens new wing".into(),
///         source: "City Herald".into(),
///         ..RawItem::default()
///     }];
///     let bundle = orchestrator.orchestrate(items).await;
///     println!("{}", bundle.script);
///     Ok(())
/// }
/// ```
// Module declarations
pub mod agents;
pub mod api;
pub mod core;
pub mod errors;
pub mod pipeline;
pub mod telemetry;

pub use errors::{AgentError, BriefingError};
pub use pipeline::Orchestrator;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. It should be called once at startup; later
/// calls are ignored.
///
/// # Example
///
/// ```
/// briefing::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

use std::time::Duration;

use thiserror::Error;

use crate::agents::AgentKind;
use crate::core::trace::AgentStatus;

/// Failure of a single agent invocation.
///
/// These never escape a phase: the phase executor substitutes the agent's
/// fallback output and records the failure in the trace.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent {0} is not configured")]
    NotConfigured(AgentKind),

    #[error("Failed to invoke agent {agent}: {message}")]
    Invocation { agent: AgentKind, message: String },

    #[error("Agent {agent} timed out after {elapsed:?} (limit {limit:?})")]
    Timeout {
        agent: AgentKind,
        elapsed: Duration,
        limit: Duration,
    },
}

impl AgentError {
    pub fn invocation(agent: AgentKind, message: impl Into<String>) -> Self {
        AgentError::Invocation {
            agent,
            message: message.into(),
        }
    }

    /// Trace status recorded for this failure.
    #[must_use]
    pub fn status(&self) -> AgentStatus {
        match self {
            AgentError::Timeout { .. } => AgentStatus::TimedOut,
            AgentError::NotConfigured(_) | AgentError::Invocation { .. } => AgentStatus::Failed,
        }
    }
}

#[derive(Debug, Error)]
pub enum BriefingError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Briefing pipeline failed: {0}")]
    Pipeline(String),

    #[error("Failed to interact with AWS services: {0}")]
    Aws(String),

    #[error("Failed to serialize payload: {0}")]
    Serialization(String),

    #[error("Failed to parse request: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for BriefingError {
    fn from(error: serde_json::Error) -> Self {
        BriefingError::Serialization(error.to_string())
    }
}

impl From<AgentError> for BriefingError {
    fn from(error: AgentError) -> Self {
        match error {
            AgentError::NotConfigured(agent) => {
                BriefingError::Configuration(format!("agent {agent} is not configured"))
            }
            other => BriefingError::Pipeline(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for BriefingError {
    fn from(error: anyhow::Error) -> Self {
        BriefingError::Pipeline(error.to_string())
    }
}

// Generic implementation for AWS SDK errors
impl<E, R> From<aws_sdk_ssm::error::SdkError<E, R>> for BriefingError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(error: aws_sdk_ssm::error::SdkError<E, R>) -> Self {
        BriefingError::Aws(aws_sdk_ssm::error::DisplayErrorContext(&error).to_string())
    }
}

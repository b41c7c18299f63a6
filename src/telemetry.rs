//! Fire-and-forget run recording.
//!
//! The orchestrator reports one [`RunSummary`] per run. Recording failures are
//! logged and otherwise ignored.

use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::core::models::ContentBundle;
use crate::errors::BriefingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every agent produced output.
    Success,
    /// Some agents fell back.
    Degraded,
    /// The bundle was built from raw items only.
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub session_id: String,
    pub status: RunStatus,
    pub duration_ms: u64,
    pub news_items: usize,
    pub trace_summary: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl RunSummary {
    #[must_use]
    pub fn from_bundle(bundle: &ContentBundle) -> Self {
        let status = if bundle.error.is_some() {
            RunStatus::Fallback
        } else if bundle.trace.phases().any(|phase| phase.degraded) {
            RunStatus::Degraded
        } else {
            RunStatus::Success
        };

        Self {
            session_id: bundle.run_id.clone(),
            status,
            duration_ms: bundle.duration_ms,
            news_items: bundle.news_items.len(),
            trace_summary: bundle.trace.summary(),
            error: bundle.error.clone(),
            recorded_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait RunRecorder: Send + Sync {
    async fn record_run(&self, summary: &RunSummary) -> Result<(), BriefingError>;
}

/// Writes the summary as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecorder;

#[async_trait]
impl RunRecorder for TracingRecorder {
    async fn record_run(&self, summary: &RunSummary) -> Result<(), BriefingError> {
        info!(
            session_id = %summary.session_id,
            status = ?summary.status,
            duration_ms = summary.duration_ms,
            news_items = summary.news_items,
            error = summary.error.as_deref().unwrap_or(""),
            "Briefing run recorded"
        );
        Ok(())
    }
}

/// Sends the summary as JSON to an SQS queue.
pub struct SqsRunRecorder {
    client: SqsClient,
    queue_url: String,
}

impl SqsRunRecorder {
    pub fn new(client: SqsClient, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl RunRecorder for SqsRunRecorder {
    async fn record_run(&self, summary: &RunSummary) -> Result<(), BriefingError> {
        let message_body = serde_json::to_string(summary)?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message_body)
            .send()
            .await
            .map_err(|e| BriefingError::Aws(format!("Failed to send run summary to SQS: {e}")))?;
        Ok(())
    }
}

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::agents::AgentKind;

const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 25;
const DEFAULT_TARGET_SECS: u64 = 8;
const DEFAULT_MAX_NEWS_ITEMS: usize = 7;
const DEFAULT_MAX_CONCURRENT: usize = 4;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    /// SSM parameter prefix holding agent identities; env lookup when unset.
    pub agent_param_prefix: Option<String>,
    /// SQS queue receiving run summaries; log-only recording when unset.
    pub run_queue_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let agent_timeout = Duration::from_secs(parse_or(
            &lookup,
            "AGENT_TIMEOUT_SECONDS",
            DEFAULT_AGENT_TIMEOUT_SECS,
        )?);

        let mut agent_timeouts = HashMap::new();
        for kind in AgentKind::ALL {
            let key = format!("AGENT_TIMEOUT_{}", kind.env_suffix());
            if let Some(raw) = lookup(&key) {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| format!("{key}: {e}"))?;
                agent_timeouts.insert(kind, Duration::from_secs(secs));
            }
        }

        let max_concurrent_invocations =
            parse_or(&lookup, "MAX_CONCURRENT_INVOCATIONS", DEFAULT_MAX_CONCURRENT)?;
        if max_concurrent_invocations == 0 {
            return Err("MAX_CONCURRENT_INVOCATIONS: must be at least 1".to_string());
        }

        Ok(Self {
            pipeline: PipelineConfig {
                agent_timeout,
                agent_timeouts,
                target_duration: Duration::from_secs(parse_or(
                    &lookup,
                    "PIPELINE_TARGET_SECONDS",
                    DEFAULT_TARGET_SECS,
                )?),
                max_news_items: parse_or(&lookup, "MAX_NEWS_ITEMS", DEFAULT_MAX_NEWS_ITEMS)?,
                max_concurrent_invocations,
            },
            agent_param_prefix: lookup("AGENT_PARAM_PREFIX").filter(|s| !s.trim().is_empty()),
            run_queue_url: lookup("RUN_QUEUE_URL").filter(|s| !s.trim().is_empty()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| format!("{key}: {e}")),
        None => Ok(default),
    }
}

/// Orchestrator-facing settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub agent_timeout: Duration,
    pub agent_timeouts: HashMap<AgentKind, Duration>,
    /// Advisory wall-clock budget for a whole run. Never enforced.
    pub target_duration: Duration,
    pub max_news_items: usize,
    pub max_concurrent_invocations: usize,
}

impl PipelineConfig {
    #[must_use]
    pub fn timeout_for(&self, agent: AgentKind) -> Duration {
        self.agent_timeouts
            .get(&agent)
            .copied()
            .unwrap_or(self.agent_timeout)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(DEFAULT_AGENT_TIMEOUT_SECS),
            agent_timeouts: HashMap::new(),
            target_duration: Duration::from_secs(DEFAULT_TARGET_SECS),
            max_news_items: DEFAULT_MAX_NEWS_ITEMS,
            max_concurrent_invocations: DEFAULT_MAX_CONCURRENT,
        }
    }
}

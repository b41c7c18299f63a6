//! Mapping logical agent names to managed agent identities.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_ssm::Client as SsmClient;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AgentKind;
use crate::errors::BriefingError;

/// Alias Bedrock assigns to an agent's working draft.
pub const DRAFT_ALIAS_ID: &str = "TSTALIASID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub agent_id: String,
    #[serde(default = "default_alias")]
    pub alias_id: String,
}

fn default_alias() -> String {
    DRAFT_ALIAS_ID.to_string()
}

#[async_trait]
pub trait AgentResolver: Send + Sync {
    /// Looks up one agent. `Ok(None)` means the agent is simply not configured.
    async fn resolve(&self, agent: AgentKind) -> Result<Option<AgentIdentity>, BriefingError>;
}

/// Resolved identities for every agent the pipeline calls.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    identities: HashMap<AgentKind, AgentIdentity>,
}

impl AgentRegistry {
    /// Resolves all six agents up front.
    ///
    /// # Errors
    ///
    /// Returns [`BriefingError::Configuration`] naming every agent that could
    /// not be resolved, or the resolver's own error.
    pub async fn resolve_all(resolver: &dyn AgentResolver) -> Result<Self, BriefingError> {
        let mut identities = HashMap::new();
        let mut missing = Vec::new();

        for agent in AgentKind::ALL {
            match resolver.resolve(agent).await? {
                Some(identity) => {
                    identities.insert(agent, identity);
                }
                None => missing.push(agent.as_str()),
            }
        }

        if !missing.is_empty() {
            return Err(BriefingError::Configuration(format!(
                "no agent identity for: {}",
                missing.join(", ")
            )));
        }

        info!(agents = identities.len(), "Resolved agent identities");
        Ok(Self { identities })
    }

    pub fn from_identities(identities: impl IntoIterator<Item = (AgentKind, AgentIdentity)>) -> Self {
        Self {
            identities: identities.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn get(&self, agent: AgentKind) -> Option<&AgentIdentity> {
        self.identities.get(&agent)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Reads `BEDROCK_AGENT_ID_<NAME>` and `BEDROCK_AGENT_ALIAS_<NAME>`.
pub struct EnvAgentResolver<F = fn(&str) -> Option<String>> {
    lookup: F,
}

impl EnvAgentResolver {
    #[must_use]
    pub fn from_env() -> Self {
        Self { lookup: env_lookup }
    }
}

impl<F> EnvAgentResolver<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    pub fn with_lookup(lookup: F) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl<F> AgentResolver for EnvAgentResolver<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    async fn resolve(&self, agent: AgentKind) -> Result<Option<AgentIdentity>, BriefingError> {
        let suffix = agent.env_suffix();
        let Some(agent_id) =
            (self.lookup)(&format!("BEDROCK_AGENT_ID_{suffix}")).filter(|s| !s.trim().is_empty())
        else {
            return Ok(None);
        };
        let alias_id = (self.lookup)(&format!("BEDROCK_AGENT_ALIAS_{suffix}"))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(default_alias);

        Ok(Some(AgentIdentity { agent_id, alias_id }))
    }
}

/// Reads `<prefix><agent-name>` from Parameter Store.
///
/// Each parameter holds `{"agent_id": "...", "alias_id": "..."}`.
pub struct SsmAgentResolver {
    client: SsmClient,
    prefix: String,
}

impl SsmAgentResolver {
    pub fn new(client: SsmClient, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    fn key_for(&self, agent: AgentKind) -> String {
        let mut p = self.prefix.clone();
        if !p.ends_with('/') {
            p.push('/');
        }
        format!("{p}{agent}")
    }
}

#[async_trait]
impl AgentResolver for SsmAgentResolver {
    async fn resolve(&self, agent: AgentKind) -> Result<Option<AgentIdentity>, BriefingError> {
        let name = self.key_for(agent);

        match self
            .client
            .get_parameter()
            .name(&name)
            .with_decryption(true)
            .send()
            .await
        {
            Ok(resp) => {
                let Some(value) = resp.parameter().and_then(|p| p.value()) else {
                    return Ok(None);
                };
                let identity: AgentIdentity = serde_json::from_str(value).map_err(|e| {
                    BriefingError::Configuration(format!("parameter {name} is not valid: {e}"))
                })?;
                Ok(Some(identity))
            }
            Err(e) => {
                // Missing parameters mean "not configured"; anything else is a real failure.
                if e
                    .as_service_error()
                    .is_some_and(aws_sdk_ssm::operation::get_parameter::GetParameterError::is_parameter_not_found)
                {
                    warn!(parameter = %name, "Agent parameter not found");
                    Ok(None)
                } else {
                    Err(BriefingError::from(e))
                }
            }
        }
    }
}

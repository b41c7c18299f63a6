use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::trace::TraceLog;

/// A news record produced by the fetch step, handed to the orchestrator as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawItem {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub category: String,
    pub link: String,
    pub published: String,
    #[serde(alias = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A news item as it appears in the final bundle.
///
/// Curator output may carry extra per-item fields (impact notes, tags); those
/// are kept in `extra` and serialized back inline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsItem {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(deserialize_with = "lenient_string")]
    pub link: String,
    #[serde(deserialize_with = "lenient_string")]
    pub published: String,
    #[serde(
        alias = "imageUrl",
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&RawItem> for NewsItem {
    fn from(item: &RawItem) -> Self {
        Self {
            title: item.title.clone(),
            summary: item.summary.clone(),
            source: item.source.clone(),
            category: item.category.clone(),
            link: item.link.clone(),
            published: item.published.clone(),
            image_url: item.image_url.clone(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoriteStory {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(deserialize_with = "lenient_string")]
    pub link: String,
    #[serde(deserialize_with = "lenient_string")]
    pub reasoning: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sections contributed by the selection and enhancement agents.
///
/// All three keys are always serialized, with defaults when the producing
/// agent fell back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOutputs {
    pub favorite_story: FavoriteStory,
    pub media_enhancements: Value,
    pub weekend_recommendations: Value,
}

impl Default for AgentOutputs {
    fn default() -> Self {
        Self {
            favorite_story: FavoriteStory::default(),
            media_enhancements: Value::Object(Map::new()),
            weekend_recommendations: Value::Object(Map::new()),
        }
    }
}

/// Final aggregate returned to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBundle {
    pub script: String,
    pub news_items: Vec<NewsItem>,
    pub sources: BTreeSet<String>,
    pub agent_outputs: AgentOutputs,
    pub generated_at: DateTime<Utc>,
    pub trace: TraceLog,
    pub run_id: String,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContentBundle {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

/// Text field written by an agent: `null` reads as empty, numbers and
/// booleans as their JSON text.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

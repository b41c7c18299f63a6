//! Merging phase outputs into the response bundle, and the last-resort
//! bundle built from raw items alone.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::agents::AgentKind;
use crate::core::models::{AgentOutputs, ContentBundle, FavoriteStory, NewsItem, RawItem};
use crate::core::trace::TraceLog;

pub const DEFAULT_FAVORITE_REASONING: &str =
    "Selected as today's lead story because it tops the curated briefing.";

const NO_STORIES_TITLE: &str = "No stories available";

/// Final outputs of every agent, fallbacks included.
#[derive(Debug, Clone)]
pub struct PhaseOutputs {
    pub curator: Value,
    pub impact: Value,
    pub selector: Value,
    pub writer: Value,
    pub entertainment: Value,
    pub media: Value,
}

impl Default for PhaseOutputs {
    fn default() -> Self {
        Self {
            curator: AgentKind::Curator.fallback_output(),
            impact: AgentKind::ImpactAnalyzer.fallback_output(),
            selector: AgentKind::Selector.fallback_output(),
            writer: AgentKind::Writer.fallback_output(),
            entertainment: AgentKind::EntertainmentCurator.fallback_output(),
            media: AgentKind::MediaEnhancer.fallback_output(),
        }
    }
}

/// News items for the bundle: the curator's list when it produced one,
/// otherwise the raw items. Either way at most `max_items`.
#[must_use]
pub fn select_news_items(curator: &Value, raw_items: &[RawItem], max_items: usize) -> Vec<NewsItem> {
    let curated: Vec<NewsItem> = curator
        .get(AgentKind::Curator.output_key())
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<NewsItem>(item.clone()).ok())
                .filter(|item| !item.title.trim().is_empty())
                .take(max_items)
                .collect()
        })
        .unwrap_or_default();

    if curated.is_empty() {
        debug!("Curator produced no items; using raw items");
        raw_items.iter().take(max_items).map(NewsItem::from).collect()
    } else {
        curated
    }
}

/// The selector's favorite story, or one derived from the first news item.
#[must_use]
pub fn select_favorite_story(selector: &Value, news_items: &[NewsItem]) -> FavoriteStory {
    let selected = selector
        .get(AgentKind::Selector.output_key())
        .filter(|story| story.is_object())
        .and_then(|story| serde_json::from_value::<FavoriteStory>(story.clone()).ok())
        .filter(|story| !story.title.trim().is_empty());

    selected.unwrap_or_else(|| fallback_favorite(news_items))
}

fn fallback_favorite(news_items: &[NewsItem]) -> FavoriteStory {
    match news_items.first() {
        Some(item) => FavoriteStory {
            title: item.title.clone(),
            summary: item.summary.clone(),
            source: item.source.clone(),
            link: item.link.clone(),
            reasoning: DEFAULT_FAVORITE_REASONING.to_string(),
            extra: Map::new(),
        },
        None => FavoriteStory {
            title: NO_STORIES_TITLE.to_string(),
            reasoning: "No news items were available for this briefing.".to_string(),
            ..FavoriteStory::default()
        },
    }
}

/// Writer script, the writer's plain-text answer, or a generated rundown.
#[must_use]
pub fn select_script(writer: &Value, news_items: &[NewsItem]) -> String {
    writer
        .get(AgentKind::Writer.output_key())
        .and_then(Value::as_str)
        .or_else(|| writer.get("response").and_then(Value::as_str))
        .map(str::trim)
        .filter(|script| !script.is_empty())
        .map_or_else(|| headline_script(news_items), ToString::to_string)
}

/// A plain rundown of headlines, used when no writer output is available.
#[must_use]
pub fn headline_script(news_items: &[NewsItem]) -> String {
    if news_items.is_empty() {
        return "Hello and welcome. There are no new stories to report right now. \
                Check back soon for the latest updates."
            .to_string();
    }

    let mut script = String::from("Hello and welcome to today's briefing.");
    for (index, item) in news_items.iter().enumerate() {
        let _ = write!(
            script,
            " Story {}: {}.",
            index + 1,
            item.title.trim().trim_end_matches('.')
        );
        let summary = item.summary.trim();
        if !summary.is_empty() {
            let _ = write!(script, " {}", summary);
        }
    }
    script.push_str(" That's the briefing for now. Thanks for listening.");
    script
}

fn select_section(output: &Value, agent: AgentKind) -> Value {
    match output.get(agent.output_key()) {
        Some(Value::Object(map)) if !map.is_empty() => Value::Object(map.clone()),
        Some(Value::Array(items)) if !items.is_empty() => Value::Array(items.clone()),
        _ => Value::Object(Map::new()),
    }
}

fn collect_sources(news_items: &[NewsItem]) -> BTreeSet<String> {
    news_items
        .iter()
        .map(|item| item.source.trim())
        .filter(|source| !source.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn empty_bundle(news_items: Vec<NewsItem>, script: String, agent_outputs: AgentOutputs) -> ContentBundle {
    ContentBundle {
        script,
        sources: collect_sources(&news_items),
        news_items,
        agent_outputs,
        generated_at: Utc::now(),
        trace: TraceLog::new(),
        run_id: Uuid::new_v4().to_string(),
        duration_ms: 0,
        error: None,
    }
}

/// Builds the bundle from all phase outputs.
///
/// Trace, run id and duration are left for the orchestrator to fill in.
#[must_use]
pub fn aggregate(raw_items: &[RawItem], outputs: &PhaseOutputs, max_items: usize) -> ContentBundle {
    let news_items = select_news_items(&outputs.curator, raw_items, max_items);
    let favorite_story = select_favorite_story(&outputs.selector, &news_items);
    let script = select_script(&outputs.writer, &news_items);

    let agent_outputs = AgentOutputs {
        favorite_story,
        media_enhancements: select_section(&outputs.media, AgentKind::MediaEnhancer),
        weekend_recommendations: select_section(
            &outputs.entertainment,
            AgentKind::EntertainmentCurator,
        ),
    };

    empty_bundle(news_items, script, agent_outputs)
}

/// Builds a complete bundle from the raw items only.
#[must_use]
pub fn build_fallback(raw_items: &[RawItem], error: &str, max_items: usize) -> ContentBundle {
    let news_items: Vec<NewsItem> = raw_items.iter().take(max_items).map(NewsItem::from).collect();
    let agent_outputs = AgentOutputs {
        favorite_story: fallback_favorite(&news_items),
        ..AgentOutputs::default()
    };
    let script = headline_script(&news_items);

    let mut bundle = empty_bundle(news_items, script, agent_outputs);
    bundle.error = Some(error.to_string());
    bundle
}

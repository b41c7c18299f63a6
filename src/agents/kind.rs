//! The six briefing agents and their static per-agent tables.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    Curator,
    ImpactAnalyzer,
    Selector,
    Writer,
    EntertainmentCurator,
    MediaEnhancer,
}

type Summarizer = fn(&Value) -> String;

impl AgentKind {
    pub const ALL: [AgentKind; 6] = [
        AgentKind::Curator,
        AgentKind::ImpactAnalyzer,
        AgentKind::Selector,
        AgentKind::Writer,
        AgentKind::EntertainmentCurator,
        AgentKind::MediaEnhancer,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AgentKind::Curator => "curator",
            AgentKind::ImpactAnalyzer => "impact-analyzer",
            AgentKind::Selector => "selector",
            AgentKind::Writer => "writer",
            AgentKind::EntertainmentCurator => "entertainment-curator",
            AgentKind::MediaEnhancer => "media-enhancer",
        }
    }

    /// Suffix used in environment variable names, e.g. `IMPACT_ANALYZER`.
    #[must_use]
    pub fn env_suffix(self) -> String {
        self.as_str().replace('-', "_").to_ascii_uppercase()
    }

    /// Key under which the agent returns its main section.
    #[must_use]
    pub const fn output_key(self) -> &'static str {
        match self {
            AgentKind::Curator => "news_items",
            AgentKind::ImpactAnalyzer => "impacts",
            AgentKind::Selector => "favorite_story",
            AgentKind::Writer => "script",
            AgentKind::EntertainmentCurator => "weekend_recommendations",
            AgentKind::MediaEnhancer => "media_enhancements",
        }
    }

    /// Upstream data each agent consumes, as recorded in its trace entry.
    #[must_use]
    pub const fn input_sources(self) -> &'static [&'static str] {
        match self {
            AgentKind::Curator | AgentKind::ImpactAnalyzer => &["raw_items"],
            AgentKind::Selector => &["curator", "impact-analyzer"],
            AgentKind::Writer => &["selector", "curator"],
            AgentKind::EntertainmentCurator => &["curator", "impact-analyzer"],
            AgentKind::MediaEnhancer => &["curator", "impact-analyzer", "selector", "writer"],
        }
    }

    /// Output substituted when the invocation fails.
    #[must_use]
    pub fn fallback_output(self) -> Value {
        let section = match self {
            AgentKind::Curator | AgentKind::ImpactAnalyzer => json!([]),
            AgentKind::Selector => Value::Null,
            AgentKind::Writer => json!(""),
            AgentKind::EntertainmentCurator | AgentKind::MediaEnhancer => json!({}),
        };
        json!({ self.output_key(): section, "fallback": true })
    }

    /// Formatter producing the human-readable `output_summary` of a trace entry.
    #[must_use]
    pub fn summarizer(self) -> Summarizer {
        match self {
            AgentKind::Curator => summarize_curator,
            AgentKind::ImpactAnalyzer => summarize_impact,
            AgentKind::Selector => summarize_selector,
            AgentKind::Writer => summarize_writer,
            AgentKind::EntertainmentCurator => summarize_entertainment,
            AgentKind::MediaEnhancer => summarize_media,
        }
    }

    #[must_use]
    pub fn summarize(self, output: &Value) -> String {
        (self.summarizer())(output)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn array_len(output: &Value, key: &str) -> usize {
    output.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

/// Counts entries of a section that may be a list or a map of lists.
fn section_len(section: Option<&Value>) -> usize {
    match section {
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(map)) => map
            .values()
            .map(|v| v.as_array().map_or(1, Vec::len))
            .sum(),
        _ => 0,
    }
}

fn summarize_curator(output: &Value) -> String {
    format!("Curated {} stories", array_len(output, "news_items"))
}

fn summarize_impact(output: &Value) -> String {
    format!("Analyzed impact for {} stories", array_len(output, "impacts"))
}

fn summarize_selector(output: &Value) -> String {
    match output
        .get("favorite_story")
        .and_then(|story| story.get("title"))
        .and_then(Value::as_str)
        .filter(|title| !title.trim().is_empty())
    {
        Some(title) => format!("Selected favorite story: {title}"),
        None => "No favorite story selected".to_string(),
    }
}

fn summarize_writer(output: &Value) -> String {
    let text = output
        .get("script")
        .and_then(Value::as_str)
        .or_else(|| output.get("response").and_then(Value::as_str))
        .unwrap_or("");
    format!("Wrote script ({} words)", text.split_whitespace().count())
}

fn summarize_entertainment(output: &Value) -> String {
    format!(
        "Recommended {} weekend items",
        section_len(output.get("weekend_recommendations"))
    )
}

fn summarize_media(output: &Value) -> String {
    format!(
        "Prepared {} media enhancements",
        section_len(output.get("media_enhancements"))
    )
}

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use briefing::agents::{AgentInvoker, AgentKind, InvocationRequest};
use briefing::core::models::RawItem;
use briefing::errors::AgentError;
use serde_json::{Value, json};

/// How a scripted agent answers.
#[derive(Debug, Clone)]
pub enum Behavior {
    Respond(Value),
    RespondAfter(Duration, Value),
    Fail,
    TimeOut,
    Panic,
}

/// Test double recording every call it receives.
pub struct ScriptedInvoker {
    behaviors: HashMap<AgentKind, Behavior>,
    default: Behavior,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub agent: AgentKind,
    pub payload: Value,
    pub session_id: String,
    pub started: Instant,
}

impl ScriptedInvoker {
    pub fn new(default: Behavior) -> Self {
        Self {
            behaviors: HashMap::new(),
            default,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, agent: AgentKind, behavior: Behavior) -> Self {
        self.behaviors.insert(agent, behavior);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn payload_for(&self, agent: AgentKind) -> Option<Value> {
        self.calls()
            .into_iter()
            .find(|call| call.agent == agent)
            .map(|call| call.payload)
    }
}

#[async_trait]
impl AgentInvoker for ScriptedInvoker {
    async fn invoke(&self, request: &InvocationRequest) -> Result<Value, AgentError> {
        self.calls.lock().unwrap().push(RecordedCall {
            agent: request.agent,
            payload: request.payload.clone(),
            session_id: request.session_id.clone(),
            started: Instant::now(),
        });

        let behavior = self
            .behaviors
            .get(&request.agent)
            .cloned()
            .unwrap_or_else(|| self.default.clone());

        match behavior {
            Behavior::Respond(value) => Ok(value),
            Behavior::RespondAfter(delay, value) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            Behavior::Fail => Err(AgentError::invocation(request.agent, "service unavailable")),
            Behavior::TimeOut => Err(AgentError::Timeout {
                agent: request.agent,
                elapsed: request.timeout,
                limit: request.timeout,
            }),
            Behavior::Panic => panic!("scripted panic for {}", request.agent),
        }
    }
}

pub fn raw_items(count: usize) -> Vec<RawItem> {
    (1..=count)
        .map(|i| RawItem {
            title: format!("Raw story {i}"),
            summary: format!("Summary of raw story {i}"),
            source: format!("Source {}", i % 3),
            category: "general".to_string(),
            link: format!("https://news.example.com/{i}"),
            published: "2026-10-18T07:00:00Z".to_string(),
            image_url: None,
        })
        .collect()
}

/// Well-formed outputs for every agent.
pub fn healthy_invoker() -> ScriptedInvoker {
    ScriptedInvoker::new(Behavior::Fail)
        .with(
            AgentKind::Curator,
            Behavior::Respond(json!({
                "news_items": [
                    { "title": "Curated A", "summary": "A summary", "source": "Wire", "link": "https://a.example.com" },
                    { "title": "Curated B", "summary": "B summary", "source": "Herald", "link": "https://b.example.com" },
                    { "title": "Curated C", "summary": "C summary", "source": "Wire", "link": "https://c.example.com" }
                ]
            })),
        )
        .with(
            AgentKind::ImpactAnalyzer,
            Behavior::Respond(json!({ "impacts": [{ "title": "Curated A", "score": 8 }] })),
        )
        .with(
            AgentKind::Selector,
            Behavior::Respond(json!({
                "favorite_story": {
                    "title": "Curated B",
                    "source": "Herald",
                    "reasoning": "Most relevant to listeners"
                }
            })),
        )
        .with(
            AgentKind::Writer,
            Behavior::Respond(json!({ "script": "Good morning! Here is your briefing." })),
        )
        .with(
            AgentKind::EntertainmentCurator,
            Behavior::Respond(json!({
                "weekend_recommendations": { "movies": ["Film"], "events": ["Market"] }
            })),
        )
        .with(
            AgentKind::MediaEnhancer,
            Behavior::Respond(json!({
                "media_enhancements": { "images": ["https://img.example.com/1.jpg"] }
            })),
        )
}

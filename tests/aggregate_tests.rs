mod common;

use briefing::pipeline::aggregate::DEFAULT_FAVORITE_REASONING;
use briefing::pipeline::{PhaseOutputs, aggregate, build_fallback};
use common::raw_items;
use serde_json::json;

#[test]
fn test_fallback_outputs_cap_raw_items() {
    let bundle = aggregate(&raw_items(10), &PhaseOutputs::default(), 7);

    assert_eq!(bundle.news_items.len(), 7);
    assert_eq!(bundle.news_items[6].title, "Raw story 7");
    assert_eq!(bundle.agent_outputs.favorite_story.title, "Raw story 1");
    assert_eq!(bundle.agent_outputs.favorite_story.reasoning, DEFAULT_FAVORITE_REASONING);
    assert_eq!(bundle.agent_outputs.media_enhancements, json!({}));
    assert_eq!(bundle.agent_outputs.weekend_recommendations, json!({}));
    assert!(bundle.script.starts_with("Hello and welcome"));
    assert!(bundle.error.is_none());
}

#[test]
fn test_untitled_selector_story_falls_back_to_first_item() {
    let outputs = PhaseOutputs {
        curator: json!({ "news_items": [{ "title": "Lead", "link": "https://lead.example.com" }] }),
        selector: json!({ "favorite_story": { "title": "  ", "reasoning": "?" } }),
        ..PhaseOutputs::default()
    };

    let bundle = aggregate(&raw_items(3), &outputs, 7);

    assert_eq!(bundle.news_items.len(), 1);
    assert_eq!(bundle.agent_outputs.favorite_story.title, "Lead");
    assert_eq!(bundle.agent_outputs.favorite_story.link, "https://lead.example.com");
}

#[test]
fn test_selector_story_keeps_extra_fields() {
    let outputs = PhaseOutputs {
        selector: json!({ "favorite_story": { "title": "Pick", "reasoning": "Fun", "fun_fact": "Otters hold hands" } }),
        ..PhaseOutputs::default()
    };

    let bundle = aggregate(&raw_items(2), &outputs, 7);
    let value = serde_json::to_value(&bundle.agent_outputs).unwrap();

    assert_eq!(value["favoriteStory"]["title"], "Pick");
    assert_eq!(value["favoriteStory"]["fun_fact"], "Otters hold hands");
}

#[test]
fn test_enhancement_sections_accept_lists_and_maps() {
    let outputs = PhaseOutputs {
        entertainment: json!({ "weekend_recommendations": [{ "name": "Jazz night" }] }),
        media: json!({ "media_enhancements": {} }),
        ..PhaseOutputs::default()
    };

    let bundle = aggregate(&raw_items(1), &outputs, 7);

    assert_eq!(
        bundle.agent_outputs.weekend_recommendations,
        json!([{ "name": "Jazz night" }])
    );
    assert_eq!(bundle.agent_outputs.media_enhancements, json!({}));
}

#[test]
fn test_build_fallback_has_every_key() {
    let bundle = build_fallback(&[], "boom", 7);
    let value = serde_json::to_value(&bundle).unwrap();

    for key in ["script", "news_items", "sources", "agent_outputs", "generated_at", "trace", "run_id", "error"] {
        assert!(value.get(key).is_some(), "{key}");
    }
    assert_eq!(value["error"], "boom");
    assert_eq!(value["agent_outputs"]["favoriteStory"]["title"], "No stories available");
}

#[test]
fn test_curated_items_tolerate_null_and_numeric_fields() {
    let outputs = PhaseOutputs {
        curator: json!({ "news_items": [
            { "title": "Curated A", "summary": null, "imageUrl": null },
            { "title": "Curated B", "published": 1760770800, "source": "Wire" }
        ] }),
        ..PhaseOutputs::default()
    };

    let bundle = aggregate(&raw_items(2), &outputs, 7);

    let titles: Vec<&str> = bundle.news_items.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, ["Curated A", "Curated B"]);
    assert_eq!(bundle.news_items[0].summary, "");
    assert_eq!(bundle.news_items[0].image_url, None);
    assert_eq!(bundle.news_items[1].published, "1760770800");
}

#[test]
fn test_selector_story_with_null_fields_is_kept() {
    let outputs = PhaseOutputs {
        selector: json!({ "favorite_story": { "title": "Pick", "link": null, "reasoning": null } }),
        ..PhaseOutputs::default()
    };

    let bundle = aggregate(&raw_items(2), &outputs, 7);

    assert_eq!(bundle.agent_outputs.favorite_story.title, "Pick");
    assert_eq!(bundle.agent_outputs.favorite_story.link, "");
}

#[test]
fn test_curated_items_are_capped() {
    let items: Vec<_> = (1..=10).map(|i| json!({ "title": format!("Curated {i}") })).collect();
    let outputs = PhaseOutputs {
        curator: json!({ "news_items": items }),
        ..PhaseOutputs::default()
    };

    let bundle = aggregate(&raw_items(2), &outputs, 7);

    assert_eq!(bundle.news_items.len(), 7);
    assert_eq!(bundle.news_items[6].title, "Curated 7");
}

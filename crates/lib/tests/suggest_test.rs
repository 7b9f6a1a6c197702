//! # Chart Suggestion Tests
//!
//! This file contains tests for the suggestion stage: the rule table that
//! backs every failure mode, the validation of model output against the
//! schema profile, and the per-prompt fallback behavior.

mod common;

use crate::common::{make_profile, setup_tracing, FailingAiProvider, MockAiProvider};
use chartgen::prompts::{SUGGESTION_SYSTEM_PROMPT, SUGGESTION_USER_PROMPT};
use chartgen::suggest::{rule_based_suggestions, suggest_charts, SuggestionSource};
use serde_json::json;

#[test]
fn test_rules_emit_line_chart_first_for_date_and_numeric() {
    let profile = make_profile(&[("Date", "DATE"), ("Revenue", "FLOAT")], &[]);

    let suggestions = rule_based_suggestions("Show revenue over time", Some(&profile));

    assert_eq!(suggestions.source, SuggestionSource::Rules);

    let line_charts: Vec<_> = suggestions
        .chosen_charts
        .iter()
        .filter(|c| c.name == "line_chart")
        .collect();
    assert_eq!(
        line_charts.len(),
        1,
        "A date plus numeric profile yields exactly one line chart"
    );

    let first = &suggestions.chosen_charts[0];
    assert_eq!(first.name, "line_chart", "The trend rule fires first");
    assert_eq!(first.encoding.x.as_deref(), Some("Date"));
    assert_eq!(first.encoding.y.as_deref(), Some("Revenue"));

    // With no category column, the comparison and share rules stay quiet.
    let names: Vec<&str> = suggestions
        .chosen_charts
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["line_chart", "histogram", "big_number"]);
}

#[test]
fn test_rules_cap_at_four_candidates() {
    let profile = make_profile(
        &[
            ("Date", "DATE"),
            ("Region", ""),
            ("Revenue", "FLOAT"),
            ("Units", "INT"),
        ],
        &[],
    );

    let suggestions = rule_based_suggestions("Overview please", Some(&profile));

    // All six rules would fire here; the cap keeps the first four.
    let names: Vec<&str> = suggestions
        .chosen_charts
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["line_chart", "bar_chart", "histogram", "pie_chart"]
    );
}

#[test]
fn test_rules_without_profile_yield_generic_defaults() {
    let suggestions = rule_based_suggestions("Anything", None);

    assert_eq!(suggestions.source, SuggestionSource::Rules);
    let summary: Vec<(Option<i64>, &str, &str)> = suggestions
        .chosen_charts
        .iter()
        .map(|c| (c.id, c.name.as_str(), c.reason.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Some(1), "bar_chart", "Default comparison chart"),
            (Some(9), "line_chart", "Default trend chart"),
            (Some(6), "pie_chart", "Default distribution chart"),
            (Some(10), "big_number", "Default KPI chart"),
        ]
    );
    assert!(
        suggestions
            .chosen_charts
            .iter()
            .all(|c| c.encoding.x.is_none() && c.encoding.y.is_none()),
        "Generic defaults carry no encoding"
    );
}

#[tokio::test]
async fn test_suggest_uses_model_output_and_tags_it() {
    // --- 1. Arrange ---
    setup_tracing();
    let profile = make_profile(&[("Date", "DATE"), ("Revenue", "FLOAT")], &[]);
    let response = json!({
        "chosen_charts": [{
            "id": 9,
            "name": "line_chart",
            "reason": "Revenue is a time series",
            "encoding": {"x": "Date", "y": "Revenue"}
        }]
    })
    .to_string();
    let mock_ai = MockAiProvider::new(vec![response]);
    let call_history = mock_ai.call_history.clone();

    // --- 2. Act ---
    let prompts = vec!["Show revenue over time".to_string()];
    let results = suggest_charts(
        &mock_ai,
        SUGGESTION_SYSTEM_PROMPT,
        SUGGESTION_USER_PROMPT,
        &prompts,
        Some(&profile),
    )
    .await;

    // --- 3. Assert ---
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source, SuggestionSource::Model);
    assert_eq!(results[0].user_prompt, "Show revenue over time");
    assert_eq!(results[0].chosen_charts.len(), 1);
    assert_eq!(results[0].chosen_charts[0].name, "line_chart");

    // The model must have been grounded with the profiled schema.
    let history = call_history.read().unwrap();
    assert_eq!(history.len(), 1);
    let (_system, user) = &history[0];
    assert!(user.contains("Revenue"), "Schema context was injected");
    assert!(user.contains("Show revenue over time"));
}

#[tokio::test]
async fn test_suggest_drops_candidates_referencing_unknown_columns() {
    // --- 1. Arrange ---
    setup_tracing();
    let profile = make_profile(&[("Date", "DATE"), ("Revenue", "FLOAT")], &[]);
    // One grounded candidate, one hallucinating a "Sales" column.
    let response = json!({
        "chosen_charts": [
            {"id": 9, "name": "line_chart", "reason": "ok",
             "encoding": {"x": "Date", "y": "Revenue"}},
            {"id": 1, "name": "bar_chart", "reason": "hallucinated",
             "encoding": {"x": "Region", "y": "Sales"}}
        ]
    })
    .to_string();
    let mock_ai = MockAiProvider::new(vec![response]);

    // --- 2. Act ---
    let prompts = vec!["Revenue trend".to_string()];
    let results = suggest_charts(
        &mock_ai,
        SUGGESTION_SYSTEM_PROMPT,
        SUGGESTION_USER_PROMPT,
        &prompts,
        Some(&profile),
    )
    .await;

    // --- 3. Assert ---
    let charts = &results[0].chosen_charts;
    assert_eq!(charts.len(), 1, "The ungrounded candidate is dropped");
    assert_eq!(charts[0].name, "line_chart");
    assert_eq!(
        results[0].source,
        SuggestionSource::Model,
        "Dropping a candidate does not demote the set to the rule table"
    );
}

#[tokio::test]
async fn test_suggest_keeps_raw_list_when_validation_empties_it() {
    // --- 1. Arrange ---
    setup_tracing();
    let profile = make_profile(&[("Date", "DATE"), ("Revenue", "FLOAT")], &[]);
    // Every candidate references unknown columns.
    let response = json!({
        "chosen_charts": [
            {"id": 1, "name": "bar_chart", "encoding": {"x": "Region", "y": "Sales"}},
            {"id": 6, "name": "pie_chart", "encoding": {"x": "Country", "y": "Sales"}}
        ]
    })
    .to_string();
    let mock_ai = MockAiProvider::new(vec![response]);

    // --- 2. Act ---
    let prompts = vec!["Breakdown".to_string()];
    let results = suggest_charts(
        &mock_ai,
        SUGGESTION_SYSTEM_PROMPT,
        SUGGESTION_USER_PROMPT,
        &prompts,
        Some(&profile),
    )
    .await;

    // --- 3. Assert ---
    // Rejecting everything would erase a possibly-usable answer, so the
    // raw candidates survive instead.
    let names: Vec<&str> = results[0]
        .chosen_charts
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["bar_chart", "pie_chart"]);
}

#[tokio::test]
async fn test_suggest_caps_model_candidates_at_four() {
    // --- 1. Arrange ---
    setup_tracing();
    let profile = make_profile(&[("Revenue", "FLOAT")], &[]);
    let candidates: Vec<_> = (0..6)
        .map(|i| json!({"id": i, "name": format!("chart_{i}"), "encoding": {"y": "Revenue"}}))
        .collect();
    let response = json!({ "chosen_charts": candidates }).to_string();
    let mock_ai = MockAiProvider::new(vec![response]);

    // --- 2. Act ---
    let prompts = vec!["Everything".to_string()];
    let results = suggest_charts(
        &mock_ai,
        SUGGESTION_SYSTEM_PROMPT,
        SUGGESTION_USER_PROMPT,
        &prompts,
        Some(&profile),
    )
    .await;

    // --- 3. Assert ---
    assert_eq!(results[0].chosen_charts.len(), 4);
}

#[tokio::test]
async fn test_suggest_falls_back_per_prompt_and_preserves_order() {
    // --- 1. Arrange ---
    setup_tracing();
    let profile = make_profile(&[("Date", "DATE"), ("Revenue", "FLOAT")], &[]);
    let good = json!({
        "chosen_charts": [{"id": 9, "name": "line_chart",
                           "encoding": {"x": "Date", "y": "Revenue"}}]
    })
    .to_string();
    // The second prompt gets a refusal that contains no JSON.
    let mock_ai = MockAiProvider::new(vec![good, "I'd rather not.".to_string()]);

    // --- 2. Act ---
    let prompts = vec![
        "Revenue trend".to_string(),
        "Something odd".to_string(),
    ];
    let results = suggest_charts(
        &mock_ai,
        SUGGESTION_SYSTEM_PROMPT,
        SUGGESTION_USER_PROMPT,
        &prompts,
        Some(&profile),
    )
    .await;

    // --- 3. Assert ---
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].user_prompt, "Revenue trend");
    assert_eq!(results[0].source, SuggestionSource::Model);
    assert_eq!(results[1].user_prompt, "Something odd");
    assert_eq!(
        results[1].source,
        SuggestionSource::Rules,
        "An unparseable reply demotes only its own prompt"
    );
    assert!(
        !results[1].chosen_charts.is_empty(),
        "The rule table still produced candidates"
    );
}

#[tokio::test]
async fn test_suggest_provider_outage_uses_rules_for_every_prompt() {
    // --- 1. Arrange ---
    setup_tracing();
    let profile = make_profile(&[("Date", "DATE"), ("Revenue", "FLOAT")], &[]);

    // --- 2. Act ---
    let prompts = vec!["Trend".to_string(), "Total".to_string()];
    let results = suggest_charts(
        &FailingAiProvider,
        SUGGESTION_SYSTEM_PROMPT,
        SUGGESTION_USER_PROMPT,
        &prompts,
        Some(&profile),
    )
    .await;

    // --- 3. Assert ---
    assert_eq!(results.len(), 2);
    for set in &results {
        assert_eq!(set.source, SuggestionSource::Rules);
        assert_eq!(set.chosen_charts[0].name, "line_chart");
    }
}

#[tokio::test]
async fn test_suggest_without_profile_never_calls_the_model() {
    // --- 1. Arrange ---
    setup_tracing();
    let mock_ai = MockAiProvider::new(vec![]);
    let call_history = mock_ai.call_history.clone();

    // --- 2. Act ---
    let prompts = vec!["Anything".to_string()];
    let results = suggest_charts(
        &mock_ai,
        SUGGESTION_SYSTEM_PROMPT,
        SUGGESTION_USER_PROMPT,
        &prompts,
        None,
    )
    .await;

    // --- 3. Assert ---
    assert_eq!(results[0].source, SuggestionSource::Rules);
    assert_eq!(results[0].chosen_charts.len(), 4);
    assert!(
        call_history.read().unwrap().is_empty(),
        "No profile means no generative call at all"
    );
}

//! # Chart Suggestion
//!
//! Turns user prompts plus a schema profile into a shortlist of chart
//! candidates. The generative path asks the model to choose charts grounded
//! in the profiled columns; a deterministic rule table covers every failure
//! mode so a prompt always yields candidates.

use crate::constants::MAX_CHARTS_PER_PROMPT;
use crate::extract::extract_json;
use crate::profile::{SchemaProfile, TypeTag};
use crate::providers::ai::AiProvider;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Column-role encoding for a chart: which column lands on which axis.
///
/// Absent roles stay absent in the serialized form, matching what the
/// model emits for single-axis charts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A proposed chart: a kind plus a column encoding, not yet a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartCandidate {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub encoding: Encoding,
}

/// Which strategy produced a suggestion set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    /// The generative path produced usable output.
    Model,
    /// The deterministic rule table was substituted.
    Rules,
}

/// The candidates chosen for a single user prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSuggestions {
    pub user_prompt: String,
    pub source: SuggestionSource,
    pub chosen_charts: Vec<ChartCandidate>,
}

/// Suggests chart candidates for each user prompt.
///
/// Prompts are dispatched concurrently but the results come back in input
/// order. Each prompt degrades independently: a provider error or
/// unparseable output swaps in the rule table for that prompt only. With no
/// usable profile at all, every prompt gets the generic default charts.
pub async fn suggest_charts(
    ai_provider: &dyn AiProvider,
    system_prompt: &str,
    user_prompt_template: &str,
    user_prompts: &[String],
    profile: Option<&SchemaProfile>,
) -> Vec<PromptSuggestions> {
    let Some(profile) = profile.filter(|p| p.has_columns()) else {
        warn!("[suggest_charts] No usable schema profile, using default suggestions");
        return user_prompts
            .iter()
            .map(|prompt| rule_based_suggestions(prompt, None))
            .collect();
    };

    let pending = user_prompts.iter().map(|prompt| {
        suggest_for_prompt(
            ai_provider,
            system_prompt,
            user_prompt_template,
            prompt,
            profile,
        )
    });
    join_all(pending).await
}

async fn suggest_for_prompt(
    ai_provider: &dyn AiProvider,
    system_prompt: &str,
    user_prompt_template: &str,
    prompt: &str,
    profile: &SchemaProfile,
) -> PromptSuggestions {
    let schema_context = json!({
        "columns": profile.columns,
        "summary": profile.summary,
    });
    let user_prompt = user_prompt_template
        .replace("{schema}", &schema_context.to_string())
        .replace("{prompt}", prompt);

    match ai_provider.generate(system_prompt, &user_prompt).await {
        Ok(raw) => {
            debug!("[suggest_charts] Raw response for '{prompt}': {raw}");
            match parse_candidates(&raw, profile) {
                Some(chosen_charts) => PromptSuggestions {
                    user_prompt: prompt.to_string(),
                    source: SuggestionSource::Model,
                    chosen_charts,
                },
                None => {
                    warn!(
                        "[suggest_charts] Unparseable output for '{prompt}', using rules"
                    );
                    rule_based_suggestions(prompt, Some(profile))
                }
            }
        }
        Err(e) => {
            warn!("[suggest_charts] Provider error for '{prompt}': {e}. Using rules.");
            rule_based_suggestions(prompt, Some(profile))
        }
    }
}

/// Parses `chosen_charts` out of raw model output and validates each
/// candidate's encoding against the profiled column names.
///
/// Returns `None` when the output does not decode as the expected shape.
/// Candidates referencing columns that do not exist are rejected; if that
/// rejects every candidate from a non-empty list, the raw list is kept
/// instead so a confused validator does not erase a usable answer.
fn parse_candidates(raw: &str, profile: &SchemaProfile) -> Option<Vec<ChartCandidate>> {
    #[derive(Deserialize)]
    struct SuggestionPayload {
        #[serde(default)]
        chosen_charts: Vec<ChartCandidate>,
    }

    let cleaned = extract_json(raw);
    let payload: SuggestionPayload = serde_json::from_str(&cleaned).ok()?;
    let raw_candidates = payload.chosen_charts;

    let known: HashSet<&str> = profile.column_names.iter().map(String::as_str).collect();
    let mut validated = Vec::new();
    for candidate in &raw_candidates {
        if encoding_is_known(&candidate.encoding, &known) {
            validated.push(candidate.clone());
        } else {
            warn!(
                "[suggest_charts] Rejected '{}' for unknown columns (x={:?}, y={:?})",
                candidate.name, candidate.encoding.x, candidate.encoding.y
            );
        }
    }

    if validated.is_empty() {
        validated = raw_candidates;
    }
    validated.truncate(MAX_CHARTS_PER_PROMPT);
    Some(validated)
}

/// An encoding passes when its x and y roles are absent, empty, or name a
/// real column. The color role is advisory and never rejected on.
fn encoding_is_known(encoding: &Encoding, known: &HashSet<&str>) -> bool {
    let role_ok = |role: &Option<String>| match role.as_deref() {
        None | Some("") => true,
        Some(name) => known.contains(name),
    };
    role_ok(&encoding.x) && role_ok(&encoding.y)
}

/// Builds suggestions for one prompt from the deterministic rule table.
///
/// Rules fire in a fixed order (trend, comparison, distribution, share,
/// correlation, total), each gated on the column types it needs, and the
/// result is capped at four candidates. Without a profile the generic
/// defaults are returned.
pub fn rule_based_suggestions(
    user_prompt: &str,
    profile: Option<&SchemaProfile>,
) -> PromptSuggestions {
    let Some(profile) = profile.filter(|p| p.has_columns()) else {
        return PromptSuggestions {
            user_prompt: user_prompt.to_string(),
            source: SuggestionSource::Rules,
            chosen_charts: generic_candidates(),
        };
    };

    let date = profile.names_of_type(TypeTag::Date);
    let numeric = profile.names_of_type(TypeTag::Numeric);
    let category: Vec<&str> = profile
        .columns
        .iter()
        .filter(|c| matches!(c.type_tag, TypeTag::Category | TypeTag::String))
        .map(|c| c.name.as_str())
        .collect();

    let mut charts = Vec::new();

    if let (Some(d), Some(n)) = (date.first(), numeric.first()) {
        charts.push(candidate(
            9,
            "line_chart",
            format!("Time trend: {d} vs {n}"),
            Encoding {
                x: Some(d.to_string()),
                y: Some(n.to_string()),
                color: None,
            },
        ));
    }
    if let (Some(c), Some(n)) = (category.first(), numeric.first()) {
        charts.push(candidate(
            1,
            "bar_chart",
            format!("Comparison: {c} vs {n}"),
            Encoding {
                x: Some(c.to_string()),
                y: Some(n.to_string()),
                color: None,
            },
        ));
    }
    if let Some(n) = numeric.first() {
        charts.push(candidate(
            4,
            "histogram",
            format!("Distribution of {n}"),
            Encoding {
                x: Some(n.to_string()),
                y: None,
                color: None,
            },
        ));
    }
    if let (Some(c), Some(n)) = (category.first(), numeric.first()) {
        charts.push(candidate(
            6,
            "pie_chart",
            format!("Share by {c}"),
            Encoding {
                x: Some(c.to_string()),
                y: Some(n.to_string()),
                color: None,
            },
        ));
    }
    if numeric.len() >= 2 {
        charts.push(candidate(
            5,
            "scatter_plot",
            format!("Correlation: {} vs {}", numeric[0], numeric[1]),
            Encoding {
                x: Some(numeric[0].to_string()),
                y: Some(numeric[1].to_string()),
                color: None,
            },
        ));
    }
    if let Some(n) = numeric.first() {
        charts.push(candidate(
            10,
            "big_number",
            format!("Total {n}"),
            Encoding {
                x: None,
                y: Some(n.to_string()),
                color: None,
            },
        ));
    }

    charts.truncate(MAX_CHARTS_PER_PROMPT);
    PromptSuggestions {
        user_prompt: user_prompt.to_string(),
        source: SuggestionSource::Rules,
        chosen_charts: charts,
    }
}

fn candidate(id: i64, name: &str, reason: String, encoding: Encoding) -> ChartCandidate {
    ChartCandidate {
        id: Some(id),
        name: name.to_string(),
        reason,
        encoding,
    }
}

/// The fixed candidates used when nothing is known about the table.
fn generic_candidates() -> Vec<ChartCandidate> {
    vec![
        candidate(
            1,
            "bar_chart",
            "Default comparison chart".to_string(),
            Encoding::default(),
        ),
        candidate(
            9,
            "line_chart",
            "Default trend chart".to_string(),
            Encoding::default(),
        ),
        candidate(
            6,
            "pie_chart",
            "Default distribution chart".to_string(),
            Encoding::default(),
        ),
        candidate(
            10,
            "big_number",
            "Default KPI chart".to_string(),
            Encoding::default(),
        ),
    ]
}

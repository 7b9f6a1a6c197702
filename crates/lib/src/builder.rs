//! # Query Building
//!
//! Turns chart candidates into executable query specifications. The
//! generative path makes a single model call carrying the dataset metadata,
//! every suggestion set, and the minimal chart catalog; the fallback path
//! derives one simple aggregation query per candidate from the schema
//! profile alone.

use crate::catalog::ChartCatalog;
use crate::constants::{FALLBACK_QUERY_LIMIT, MAX_CHARTS_PER_PROMPT};
use crate::errors::ChartgenError;
use crate::extract::extract_json;
use crate::profile::{SchemaProfile, TypeTag};
use crate::providers::ai::AiProvider;
use crate::reshape::ChartData;
use crate::suggest::{Encoding, PromptSuggestions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// An aggregation applied to a selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    CountDistinct,
}

/// Sort direction for an `orderBy` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

/// One selected column, optionally aggregated and aliased.
///
/// A select entry is always an object. The wire name for the alias is
/// `as`; `alias` is accepted on input for leniency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectColumn {
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    #[serde(
        default,
        rename = "as",
        alias = "alias",
        skip_serializing_if = "Option::is_none"
    )]
    pub alias: Option<String>,
}

/// A single filter predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub column: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

/// One `orderBy` entry. Always an object, never a bare column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// A normalized, backend-agnostic description of a tabular aggregation
/// query.
///
/// The list-shaped fields are always lists, even when empty, so the
/// serialized form is stable for the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuerySpec {
    pub source: String,
    pub select: Vec<SelectColumn>,
    pub filters: Vec<FilterClause>,
    pub group_by: Vec<String>,
    pub order_by: Vec<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// One chart produced by the builder, later enriched in place with
/// execution results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltChart {
    #[serde(default)]
    pub user_prompt: String,
    /// Catalog id as the model emitted it; a string and a number are both
    /// tolerated.
    #[serde(default)]
    pub chart_id: Value,
    #[serde(default)]
    pub chart_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QuerySpec>,
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ChartData>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The builder's response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResponse {
    pub intent: String,
    #[serde(default)]
    pub charts: Vec<BuiltChart>,
}

impl BuildResponse {
    /// The empty-but-valid response used when model output cannot be
    /// parsed at all.
    pub fn empty() -> Self {
        Self {
            intent: "visualization".to_string(),
            charts: Vec::new(),
        }
    }
}

/// Builds the chart list through the generative path.
///
/// One request covers every suggestion set. The reply is decoded chart by
/// chart so a malformed entry is dropped without discarding its valid
/// siblings; a reply that does not parse as JSON at all yields the
/// empty-but-valid shape. Provider errors propagate to the caller, which
/// owns fallback recovery.
pub async fn build_charts(
    ai_provider: &dyn AiProvider,
    system_prompt: &str,
    user_prompt_template: &str,
    dataset_metadata: &Value,
    suggestions: &[PromptSuggestions],
    catalog: &ChartCatalog,
) -> Result<BuildResponse, ChartgenError> {
    let user_prompt = user_prompt_template
        .replace("{metadata}", &dataset_metadata.to_string())
        .replace("{suggestions}", &serde_json::to_string(suggestions)?)
        .replace("{charts}", &catalog.minimal().to_string());

    let raw = ai_provider.generate(system_prompt, &user_prompt).await?;
    debug!("[build_charts] Raw response: {raw}");
    let cleaned = extract_json(&raw);

    let parsed: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(e) => {
            warn!("[build_charts] Unparseable model output ({e}), returning empty build");
            return Ok(BuildResponse::empty());
        }
    };

    let chart_values = parsed
        .get("charts")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut charts = Vec::with_capacity(chart_values.len());
    for value in chart_values {
        match serde_json::from_value::<BuiltChart>(value) {
            Ok(chart) => charts.push(chart),
            Err(e) => warn!("[build_charts] Dropping malformed chart entry: {e}"),
        }
    }

    let intent = parsed
        .get("intent")
        .and_then(Value::as_str)
        .unwrap_or("visualization")
        .to_string();

    Ok(BuildResponse { intent, charts })
}

/// Builds charts from the rule table when the generative path fails.
///
/// Each candidate resolves its x axis from its own encoding, then the first
/// category column, then the first date column; its y axis from its
/// encoding, then the first numeric column. Candidates with no numeric y
/// are skipped. The produced query sums y grouped by x, ordered by y
/// descending, with a small row limit. At most four charts come out across
/// all suggestion sets combined.
pub fn fallback_build(
    suggestions: &[PromptSuggestions],
    profile: &SchemaProfile,
    project_id: &str,
    table_name: &str,
) -> BuildResponse {
    let numeric = profile.names_of_type(TypeTag::Numeric);
    let date = profile.names_of_type(TypeTag::Date);
    let category: Vec<&str> = profile
        .columns
        .iter()
        .filter(|c| matches!(c.type_tag, TypeTag::Category | TypeTag::String))
        .map(|c| c.name.as_str())
        .collect();

    let mut charts = Vec::new();
    for set in suggestions {
        for chart in set.chosen_charts.iter().take(MAX_CHARTS_PER_PROMPT) {
            let x = chart
                .encoding
                .x
                .clone()
                .filter(|x| !x.is_empty())
                .or_else(|| category.first().map(|c| c.to_string()))
                .or_else(|| date.first().map(|d| d.to_string()));
            let Some(y) = chart
                .encoding
                .y
                .clone()
                .filter(|y| !y.is_empty())
                .or_else(|| numeric.first().map(|n| n.to_string()))
            else {
                warn!(
                    "[fallback_build] No numeric y for '{}', skipping",
                    chart.name
                );
                continue;
            };

            let mut select = Vec::new();
            if let Some(x) = &x {
                select.push(SelectColumn {
                    column: x.clone(),
                    aggregation: None,
                    alias: Some(x.clone()),
                });
            }
            select.push(SelectColumn {
                column: y.clone(),
                aggregation: Some(Aggregation::Sum),
                alias: Some(y.clone()),
            });

            let query = QuerySpec {
                source: format!("{project_id}.{table_name}"),
                select,
                filters: Vec::new(),
                group_by: x.clone().map(|x| vec![x]).unwrap_or_default(),
                order_by: vec![OrderBy {
                    column: y.clone(),
                    direction: SortDirection::Desc,
                }],
                limit: Some(FALLBACK_QUERY_LIMIT),
            };

            charts.push(BuiltChart {
                user_prompt: set.user_prompt.clone(),
                chart_id: chart.id.map(Value::from).unwrap_or(Value::Null),
                chart_type: chart.name.clone(),
                query: Some(query),
                encoding: Encoding {
                    x: Some(x.unwrap_or_default()),
                    y: Some(y),
                    color: Some(String::new()),
                },
                data: None,
                error: None,
            });
        }
    }

    charts.truncate(MAX_CHARTS_PER_PROMPT);
    BuildResponse {
        intent: "visualization".to_string(),
        charts,
    }
}

//! # Schema Profiling
//!
//! This module turns raw column metadata and a handful of sample rows into a
//! typed, statistic-annotated `SchemaProfile`. The profile is what grounds
//! every downstream generative call: chart suggestions and query building are
//! both constrained to the column names and types recorded here.
//!
//! Profiling never fails. Empty or malformed input degrades to `unknown`
//! types and empty fields rather than an error.

use crate::constants::{
    CATEGORY_UNIQUE_RATIO, NUMERIC_RATIO_THRESHOLD, PROFILE_SAMPLES_PER_COLUMN,
    PROFILE_SAMPLE_ROWS, SUMMARY_NAME_LIMIT,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Tokens whose presence in a sample value marks it as date-like.
const DATE_TOKENS: [&str; 8] = ["-", "/", "2020", "2021", "2022", "2023", "2024", "2025"];

/// The categorical type assigned to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Numeric,
    Date,
    Boolean,
    Category,
    String,
    Unknown,
}

impl TypeTag {
    /// The lowercase name used in summaries and serialized profiles.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Numeric => "numeric",
            TypeTag::Date => "date",
            TypeTag::Boolean => "boolean",
            TypeTag::Category => "category",
            TypeTag::String => "string",
            TypeTag::Unknown => "unknown",
        }
    }
}

/// Preview statistics for a numeric column.
///
/// Computed over the retained samples only, never the full dataset. These are
/// cheap grounding hints for the model, not ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

/// One profiled column: name, inferred type, and a few raw sample values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    #[serde(default)]
    pub samples: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ColumnStats>,
}

/// A typed profile of a full column set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaProfile {
    pub columns: Vec<ColumnProfile>,
    pub row_count: u64,
    pub column_names: Vec<String>,
    pub summary: String,
}

impl SchemaProfile {
    /// Whether the profile carries any usable columns.
    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Names of columns carrying the given type tag, in profile order.
    pub fn names_of_type(&self, tag: TypeTag) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.type_tag == tag)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Infers a column's type from its raw sample values.
///
/// Values are normalized to strings, discarding nulls and blanks. Rule order
/// is significant and relied upon by tests: numeric is checked before date,
/// date before boolean, and cardinality decides last. A column of pure
/// `"0"`/`"1"` values therefore classifies as numeric, not boolean.
pub fn infer_type(samples: &[Value]) -> TypeTag {
    let values: Vec<String> = samples.iter().filter_map(sample_string).collect();
    if values.is_empty() {
        return TypeTag::Unknown;
    }

    let numeric_count = values.iter().filter(|v| is_numeric_literal(v)).count();
    if numeric_count as f64 > values.len() as f64 * NUMERIC_RATIO_THRESHOLD {
        return TypeTag::Numeric;
    }

    let first = &values[0];
    if first.chars().count() >= 8 && DATE_TOKENS.iter().any(|token| first.contains(token)) {
        return TypeTag::Date;
    }

    if values.iter().all(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "true" | "false" | "yes" | "no" | "0" | "1"
        )
    }) {
        return TypeTag::Boolean;
    }

    let unique: HashSet<&String> = values.iter().collect();
    if (unique.len() as f64) / (values.len() as f64) < CATEGORY_UNIQUE_RATIO {
        TypeTag::Category
    } else {
        TypeTag::String
    }
}

/// Builds a `SchemaProfile` from raw column descriptors and sample rows.
///
/// Each descriptor may expose its name under `column_name` or `name` and a
/// declared type under `data_type` or `type`; bare strings are treated as
/// names. A declared type containing a numeric, date, or boolean keyword is
/// trusted directly; otherwise the type is inferred from up to the first
/// five sample rows, defaulting to `string` when no samples exist.
pub fn build_profile(columns: &[Value], sample_rows: &[Value], row_count: u64) -> SchemaProfile {
    let mut profiled: Vec<ColumnProfile> = Vec::with_capacity(columns.len());

    for descriptor in columns {
        let name = descriptor_name(descriptor);
        let declared = descriptor_type(descriptor).to_lowercase();
        let samples = collect_samples(&name, sample_rows);

        let type_tag = if ["int", "float", "double", "decimal"]
            .iter()
            .any(|k| declared.contains(k))
        {
            TypeTag::Numeric
        } else if declared.contains("date") || declared.contains("time") {
            TypeTag::Date
        } else if declared.contains("bool") {
            TypeTag::Boolean
        } else if !samples.is_empty() {
            infer_type(&samples)
        } else {
            TypeTag::String
        };

        let mut retained = samples;
        retained.truncate(PROFILE_SAMPLES_PER_COLUMN);

        let stats = if type_tag == TypeTag::Numeric {
            numeric_stats(&retained)
        } else {
            None
        };

        profiled.push(ColumnProfile {
            name,
            type_tag,
            samples: retained,
            stats,
        });
    }

    let mut seen = HashSet::new();
    let column_names: Vec<String> = profiled
        .iter()
        .filter(|c| seen.insert(c.name.clone()))
        .map(|c| c.name.clone())
        .collect();
    let summary = render_summary(&profiled);

    SchemaProfile {
        columns: profiled,
        row_count,
        column_names,
        summary,
    }
}

/// Collects non-blank sample values for one column from the first few rows.
fn collect_samples(column: &str, rows: &[Value]) -> Vec<Value> {
    rows.iter()
        .take(PROFILE_SAMPLE_ROWS)
        .filter_map(|row| row.get(column))
        .filter(|value| sample_string(value).is_some())
        .cloned()
        .collect()
}

/// Normalizes a raw value to its trimmed string form, dropping null/blank.
fn sample_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Whether the string is a plain numeric literal: digits with optional
/// thousands separators, at most one decimal point, and an optional leading
/// minus.
fn is_numeric_literal(value: &str) -> bool {
    let cleaned = value.replace(',', "");
    let digits = cleaned.strip_prefix('-').unwrap_or(&cleaned);
    if digits.is_empty() || !digits.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut seen_point = false;
    digits.chars().all(|c| {
        if c.is_ascii_digit() {
            true
        } else if c == '.' && !seen_point {
            seen_point = true;
            true
        } else {
            false
        }
    })
}

/// Parses a raw value as a number, tolerating thousands separators.
fn parse_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn numeric_stats(samples: &[Value]) -> Option<ColumnStats> {
    let numbers: Vec<f64> = samples.iter().filter_map(parse_numeric).collect();
    if numbers.is_empty() {
        return None;
    }
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let average = numbers.iter().sum::<f64>() / numbers.len() as f64;
    Some(ColumnStats { min, max, average })
}

/// Resolves a column descriptor's name. Descriptors are usually objects
/// with a `column_name` or `name` key, but a bare string works too.
pub fn descriptor_name(descriptor: &Value) -> String {
    match descriptor {
        Value::String(s) => s.clone(),
        Value::Object(map) => non_empty_str(map, "column_name")
            .or_else(|| non_empty_str(map, "name"))
            .map(str::to_string)
            .unwrap_or_else(|| descriptor.to_string()),
        other => other.to_string(),
    }
}

fn descriptor_type(descriptor: &Value) -> &str {
    match descriptor {
        Value::Object(map) => non_empty_str(map, "data_type")
            .or_else(|| non_empty_str(map, "type"))
            .unwrap_or(""),
        _ => "",
    }
}

fn non_empty_str<'a>(map: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Renders the human-readable summary: column count, then per-type counts
/// with the first few column names.
fn render_summary(columns: &[ColumnProfile]) -> String {
    const ORDER: [TypeTag; 6] = [
        TypeTag::Numeric,
        TypeTag::Date,
        TypeTag::Category,
        TypeTag::String,
        TypeTag::Boolean,
        TypeTag::Unknown,
    ];

    let mut parts = Vec::new();
    for tag in ORDER {
        let names: Vec<&str> = columns
            .iter()
            .filter(|c| c.type_tag == tag)
            .map(|c| c.name.as_str())
            .collect();
        if names.is_empty() {
            continue;
        }
        let shown = names
            .iter()
            .take(SUMMARY_NAME_LIMIT)
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        let ellipsis = if names.len() > SUMMARY_NAME_LIMIT {
            "..."
        } else {
            ""
        };
        parts.push(format!("{} {} ({shown}{ellipsis})", names.len(), tag.as_str()));
    }

    format!("{} columns: {}", columns.len(), parts.join(", "))
}

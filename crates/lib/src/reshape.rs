//! # Result Reshaping
//!
//! Turns the flat row list a query returns into the label/series structure
//! a dashboard renders directly, without further client-side work.

use crate::constants::CHART_PALETTE;
use crate::providers::db::ExecutionResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One renderable series: a name, its values, and one color per point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(rename = "backgroundColor")]
    pub background_color: Vec<String>,
}

/// Renderer-ready chart data: labels plus one dataset per value column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// Reshapes an execution result into renderer-ready chart data.
///
/// The first row's key order defines the column order: the first column
/// becomes the labels and every later column becomes one dataset. Values
/// are taken verbatim when numeric, parsed when they are numeric strings,
/// and fall back to zero otherwise. Colors cycle through the fixed palette
/// by dataset index, repeated once per data point.
pub fn chart_data(result: &ExecutionResult) -> ChartData {
    let rows = &result.result_data;
    let Some(first) = rows.first().and_then(Value::as_object) else {
        return ChartData::default();
    };

    let columns: Vec<String> = first.keys().cloned().collect();
    let Some((label_column, value_columns)) = columns.split_first() else {
        return ChartData::default();
    };

    let labels = rows
        .iter()
        .map(|row| label_string(row.get(label_column)))
        .collect();

    let datasets = value_columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let data: Vec<f64> = rows
                .iter()
                .map(|row| numeric_value(row.get(column)))
                .collect();
            let color = CHART_PALETTE[index % CHART_PALETTE.len()].to_string();
            Dataset {
                label: column.clone(),
                background_color: vec![color; data.len()],
                data,
            }
        })
        .collect();

    ChartData { labels, datasets }
}

fn label_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn numeric_value(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

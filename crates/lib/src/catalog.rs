//! # Chart Catalog
//!
//! The static catalog of renderable chart definitions. Each definition is an
//! opaque `{chart_id, name, data_requirements}` record: the pipeline never
//! interprets `data_requirements`, it only forwards the catalog verbatim to
//! the query-building prompt and exposes it over HTTP for the dashboard.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A single renderable chart definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDefinition {
    pub chart_id: i64,
    pub name: String,
    #[serde(default)]
    pub data_requirements: Value,
}

/// The full set of chart definitions known to the service.
#[derive(Debug, Clone)]
pub struct ChartCatalog {
    definitions: Vec<ChartDefinition>,
}

impl ChartCatalog {
    pub fn new(definitions: Vec<ChartDefinition>) -> Self {
        Self { definitions }
    }

    /// Parses a catalog from its JSON representation, as loaded from an
    /// override file.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        Ok(Self {
            definitions: serde_json::from_value(value)?,
        })
    }

    pub fn definitions(&self) -> &[ChartDefinition] {
        &self.definitions
    }

    /// The full catalog as a JSON value, served verbatim over HTTP.
    pub fn as_value(&self) -> Value {
        serde_json::to_value(&self.definitions).unwrap_or_else(|_| json!([]))
    }

    /// The reduced `{id, name, data_requirements}` projection embedded in
    /// prompts.
    pub fn minimal(&self) -> Value {
        Value::Array(
            self.definitions
                .iter()
                .map(|chart| {
                    json!({
                        "id": chart.chart_id,
                        "name": chart.name,
                        "data_requirements": chart.data_requirements,
                    })
                })
                .collect(),
        )
    }
}

impl Default for ChartCatalog {
    /// The built-in catalog used when no override file is configured.
    fn default() -> Self {
        let requirements = |roles: Value, encoding: Value| -> Value {
            json!({ "required_roles": roles, "encoding_template": encoding })
        };

        Self::new(vec![
            ChartDefinition {
                chart_id: 1,
                name: "bar_chart".to_string(),
                data_requirements: requirements(
                    json!(["categorical_dimension", "numeric_measure"]),
                    json!({"x": "categorical_dimension", "y": "numeric_measure"}),
                ),
            },
            ChartDefinition {
                chart_id: 2,
                name: "area_chart".to_string(),
                data_requirements: requirements(
                    json!(["datetime", "numeric_measure"]),
                    json!({"x": "datetime", "y": "numeric_measure"}),
                ),
            },
            ChartDefinition {
                chart_id: 3,
                name: "stacked_bar_chart".to_string(),
                data_requirements: requirements(
                    json!(["categorical_dimension", "numeric_measure", "categorical_dimension"]),
                    json!({"x": "categorical_dimension", "y": "numeric_measure", "color": "categorical_dimension"}),
                ),
            },
            ChartDefinition {
                chart_id: 4,
                name: "histogram".to_string(),
                data_requirements: requirements(
                    json!(["numeric_measure"]),
                    json!({"x": "numeric_measure"}),
                ),
            },
            ChartDefinition {
                chart_id: 5,
                name: "scatter_plot".to_string(),
                data_requirements: requirements(
                    json!(["numeric_measure", "numeric_measure"]),
                    json!({"x": "numeric_measure", "y": "numeric_measure"}),
                ),
            },
            ChartDefinition {
                chart_id: 6,
                name: "pie_chart".to_string(),
                data_requirements: requirements(
                    json!(["categorical_dimension", "numeric_measure"]),
                    json!({"x": "categorical_dimension", "y": "numeric_measure"}),
                ),
            },
            ChartDefinition {
                chart_id: 7,
                name: "donut_chart".to_string(),
                data_requirements: requirements(
                    json!(["categorical_dimension", "numeric_measure"]),
                    json!({"x": "categorical_dimension", "y": "numeric_measure"}),
                ),
            },
            ChartDefinition {
                chart_id: 8,
                name: "table".to_string(),
                data_requirements: requirements(json!([]), json!({})),
            },
            ChartDefinition {
                chart_id: 9,
                name: "line_chart".to_string(),
                data_requirements: requirements(
                    json!(["datetime", "numeric_measure"]),
                    json!({"x": "datetime", "y": "numeric_measure"}),
                ),
            },
            ChartDefinition {
                chart_id: 10,
                name: "big_number".to_string(),
                data_requirements: requirements(
                    json!(["numeric_measure"]),
                    json!({"y": "numeric_measure"}),
                ),
            },
        ])
    }
}

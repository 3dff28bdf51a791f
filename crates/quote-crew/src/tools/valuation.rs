use std::future::ready;

use quote_crew_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{display_value, parse_object};

const BASE_VALUE: u64 = 625_000;
const FALLBACK_VALUE: f64 = 1_250_000.0;
const DOUBLE_MARKER: &str = "2 km";
const DEFAULT_PROJECT_TYPE: &str = "road";
const DEFAULT_SIZE: &str = "1 km";

/// Input of [`ValuationTool`].
#[derive(Deserialize, JsonSchema)]
pub struct ValuationParameters {
    #[schemars(
        description = "The lead as JSON text, with `project_type` and `size` fields."
    )]
    lead_json: String,
}

/// The value of an estimate. A computed value is a whole number, the
/// fallback is serialized as a float.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EstimatedValue {
    /// Computed from the lead.
    Computed(u64),
    /// Used when the lead or its size could not be read.
    Fallback(f64),
}

/// A rough valuation of a project.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Estimate {
    /// The estimated value.
    pub estimated_value: EstimatedValue,
    /// Always `"INR"`.
    pub currency: &'static str,
    /// Human-readable assumptions behind the value.
    pub assumptions: Vec<String>,
}

/// Values the project described by `lead_json`.
///
/// Never fails. Text that is not a JSON object, or a `size` that is not
/// text, yields the fallback value. A `project_type` that is not text is
/// still shown in the assumption.
pub fn estimate_value(lead_json: &str) -> Estimate {
    let Some(lead) = parse_object(lead_json) else {
        return Estimate::new(
            EstimatedValue::Fallback(FALLBACK_VALUE),
            DEFAULT_PROJECT_TYPE,
            DEFAULT_SIZE,
        );
    };

    let project_type = lead
        .get("project_type")
        .map_or_else(|| DEFAULT_PROJECT_TYPE.to_owned(), display_value);
    match lead.get("size") {
        None => Estimate::new(
            EstimatedValue::Computed(BASE_VALUE),
            &project_type,
            DEFAULT_SIZE,
        ),
        Some(Value::String(size)) => {
            let factor = if size.contains(DOUBLE_MARKER) { 2 } else { 1 };
            Estimate::new(
                EstimatedValue::Computed(BASE_VALUE * factor),
                &project_type,
                size,
            )
        }
        Some(size) => {
            debug!("lead size is not text: {size}");
            Estimate::new(
                EstimatedValue::Fallback(FALLBACK_VALUE),
                &project_type,
                &display_value(size),
            )
        }
    }
}

impl Estimate {
    fn new(estimated_value: EstimatedValue, project_type: &str, size: &str) -> Self {
        Self {
            estimated_value,
            currency: "INR",
            assumptions: vec![format!("Cost for {project_type} project, {size} long")],
        }
    }
}

/// Turns a lead into a rough project value.
pub struct ValuationTool {
    parameter_schema: Value,
}

impl ValuationTool {
    /// Creates a new valuation tool.
    #[inline]
    pub fn new() -> Self {
        Self {
            parameter_schema: schema_for!(ValuationParameters).to_value(),
        }
    }
}

impl Default for ValuationTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for ValuationTool {
    type Input = ValuationParameters;

    fn name(&self) -> &str {
        "estimator_tool"
    }

    fn description(&self) -> &str {
        "Generates a cost estimate from the lead JSON."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: ValuationParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let estimate = estimate_value(&input.lead_json);
        ready(serde_json::to_string(&estimate).map_err(|err| {
            ToolError::execution_error().with_reason(err.to_string())
        }))
    }
}

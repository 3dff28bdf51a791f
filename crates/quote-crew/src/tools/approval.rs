use std::future::ready;

use quote_crew_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{object_field, parse_context};

/// Projects at or above this value need the board.
const APPROVAL_LIMIT: f64 = 5_000_000.0;

/// Input of [`ApprovalTool`].
#[derive(Deserialize, JsonSchema)]
pub struct ApprovalParameters {
    #[schemars(
        description = "JSON text with the `lead` and the `estimate` of the project."
    )]
    full_context_json: String,
}

/// The manager's decision on a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the manager can sign off alone.
    pub approved: bool,
    /// `Approved` or `Requires board approval`.
    pub comment: &'static str,
}

/// Decides on the project described by `{"estimate": {"estimated_value": ..}}`.
///
/// An unreadable context or value counts as a value of 0.
pub fn review_estimate(full_context_json: &str) -> Decision {
    let context = parse_context(full_context_json);
    let value = object_field(&context, "estimate")
        .get("estimated_value")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let approved = value < APPROVAL_LIMIT;
    Decision {
        approved,
        comment: if approved {
            "Approved"
        } else {
            "Requires board approval"
        },
    }
}

/// Approves or escalates a proposal.
pub struct ApprovalTool {
    parameter_schema: Value,
}

impl ApprovalTool {
    /// Creates a new approval tool.
    #[inline]
    pub fn new() -> Self {
        Self {
            parameter_schema: schema_for!(ApprovalParameters).to_value(),
        }
    }
}

impl Default for ApprovalTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for ApprovalTool {
    type Input = ApprovalParameters;

    fn name(&self) -> &str {
        "manager_approval_tool"
    }

    fn description(&self) -> &str {
        "Returns {approved: bool, comment: str} for the lead and estimate JSON."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: ApprovalParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let decision = review_estimate(&input.full_context_json);
        info!("manager decision: {}", decision.comment);
        ready(serde_json::to_string(&decision).map_err(|err| {
            ToolError::execution_error().with_reason(err.to_string())
        }))
    }
}

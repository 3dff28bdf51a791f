use std::future::ready;

use quote_crew_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{display_value, object_field, parse_context};

const PROPOSAL_BODY: &str =
    "Dear Sir/Madam,\nWe propose to execute the construction work as per agreed terms.";

/// Input of [`ProposalTool`].
#[derive(Deserialize, JsonSchema)]
pub struct ProposalParameters {
    #[schemars(
        description = "JSON text with a `lead` object and an `estimate` object."
    )]
    context_json: String,
}

/// A proposal letter for a client.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Proposal {
    /// Subject line naming the project and the site.
    pub subject: String,
    /// The letter.
    pub body: String,
    /// The estimated value, copied as-is.
    pub amount: Value,
    /// Currency of the estimate, `INR` when unknown.
    pub currency: Value,
}

/// Writes a proposal from `{"lead": {...}, "estimate": {...}}`.
///
/// Missing or unreadable parts fall back to placeholders.
pub fn write_proposal(context_json: &str) -> Proposal {
    let context = parse_context(context_json);
    let lead = object_field(&context, "lead");
    let estimate = object_field(&context, "estimate");

    let subject = format!(
        "Proposal for {} at {}",
        text_field(&lead, "project_type", "project"),
        text_field(&lead, "location", "unknown"),
    );
    Proposal {
        subject,
        body: PROPOSAL_BODY.to_owned(),
        amount: estimate.get("estimated_value").cloned().unwrap_or(Value::from(0)),
        currency: estimate.get("currency").cloned().unwrap_or(Value::from("INR")),
    }
}

fn text_field(object: &Map<String, Value>, key: &str, default: &str) -> String {
    object
        .get(key)
        .map_or_else(|| default.to_owned(), display_value)
}

/// Creates a proposal from the lead and the estimate.
pub struct ProposalTool {
    parameter_schema: Value,
}

impl ProposalTool {
    /// Creates a new proposal tool.
    #[inline]
    pub fn new() -> Self {
        Self {
            parameter_schema: schema_for!(ProposalParameters).to_value(),
        }
    }
}

impl Default for ProposalTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for ProposalTool {
    type Input = ProposalParameters;

    fn name(&self) -> &str {
        "sales_writer_tool"
    }

    fn description(&self) -> &str {
        "Creates a proposal from the lead and estimate JSON."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: ProposalParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let proposal = write_proposal(&input.context_json);
        ready(serde_json::to_string(&proposal).map_err(|err| {
            ToolError::execution_error().with_reason(err.to_string())
        }))
    }
}

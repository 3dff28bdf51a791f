use std::future::ready;

use quote_crew_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MAX_NOTES_CHARS: usize = 120;

/// Input of [`LeadCaptureTool`].
#[derive(Deserialize, JsonSchema)]
pub struct LeadCaptureParameters {
    #[schemars(description = "The client's enquiry, verbatim.")]
    lead_input: String,
}

/// A captured lead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Lead {
    /// Contact name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Kind of project, e.g. `road`.
    pub project_type: String,
    /// Where the site is.
    pub location: String,
    /// Size of the project, e.g. `2 km`.
    pub size: String,
    /// The start of the original enquiry.
    pub notes: String,
}

/// Captures a lead from a free-text enquiry.
///
/// This is a demo capture: the contact details are fixed and the enquiry is
/// only kept as notes, cut to its first 120 characters.
pub fn capture_lead(lead_input: &str) -> Lead {
    Lead {
        name: "Ravi".to_owned(),
        phone: "9876543210".to_owned(),
        project_type: "road".to_owned(),
        location: "Salem".to_owned(),
        size: "2 km".to_owned(),
        notes: lead_input.chars().take(MAX_NOTES_CHARS).collect(),
    }
}

/// Extracts lead information from an enquiry.
pub struct LeadCaptureTool {
    parameter_schema: Value,
}

impl LeadCaptureTool {
    /// Creates a new lead capture tool.
    #[inline]
    pub fn new() -> Self {
        Self {
            parameter_schema: schema_for!(LeadCaptureParameters).to_value(),
        }
    }
}

impl Default for LeadCaptureTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for LeadCaptureTool {
    type Input = LeadCaptureParameters;

    fn name(&self) -> &str {
        "lead_capture_tool"
    }

    fn description(&self) -> &str {
        "Extracts lead information from a client enquiry and returns it as JSON."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: LeadCaptureParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let lead = capture_lead(&input.lead_input);
        ready(serde_json::to_string(&lead).map_err(|err| {
            ToolError::execution_error().with_reason(err.to_string())
        }))
    }
}

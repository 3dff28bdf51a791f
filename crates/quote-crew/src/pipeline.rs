//! The road proposal pipeline: four single-participant runs in series, each
//! feeding its JSON output to the next.

use std::fmt::{self, Display};

use quote_crew_core::{Participant, TurnSequencer, TurnSequencerBuilder};
use quote_crew_model::ModelProvider;
use serde_json::{Value, json};

use crate::tools::{ApprovalTool, LeadCaptureTool, ProposalTool, ValuationTool};

/// The enquiry used when none is given.
pub const DEFAULT_ENQUIRY: &str =
    "Client enquiry: Need road estimate near Salem, 2 km, single carriageway.";

/// Name of the participant who signs off the decision.
pub const APPROVER: &str = "Manager";

/// A step of the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Turns the enquiry into a lead.
    LeadCapture,
    /// Values the lead.
    Estimate,
    /// Writes the proposal.
    Proposal,
    /// Approves or escalates.
    Approval,
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::LeadCapture => "lead capture",
            Stage::Estimate => "estimate",
            Stage::Proposal => "proposal",
            Stage::Approval => "approval",
        })
    }
}

/// Errors from [`RoadPipeline::run`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stage's run failed.
    #[error("{stage} stage failed: {source}")]
    Run {
        /// The failed stage.
        stage: Stage,
        /// Why it failed.
        #[source]
        source: quote_crew_core::Error,
    },
    /// A stage answered with text the next stage cannot read.
    #[error("{stage} stage returned non-JSON output: {source}")]
    NotJson {
        /// The stage that answered.
        stage: Stage,
        /// The parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Everything the pipeline produced.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineReport {
    /// The captured lead.
    pub lead: Value,
    /// The estimate of the lead.
    pub estimate: Value,
    /// The proposal text.
    pub proposal: String,
    /// The manager's decision text.
    pub decision: String,
}

/// The road proposal pipeline.
pub struct RoadPipeline {
    lead_capture: TurnSequencer,
    estimator: TurnSequencer,
    sales_writer: TurnSequencer,
    manager: TurnSequencer,
}

impl RoadPipeline {
    /// Creates the pipeline. Every stage talks to a clone of `provider`.
    pub fn new<P>(provider: P) -> Result<Self, quote_crew_core::Error>
    where
        P: ModelProvider + Clone + 'static,
    {
        let stage = |participant: Participant| {
            TurnSequencerBuilder::with_model_provider(provider.clone())
                .with_participant(participant)
                .with_max_turns(1)
                .build()
        };
        Ok(Self {
            lead_capture: stage(
                Participant::builder("LeadCapture")
                    .with_system_instruction(
                        "Use lead_capture_tool to extract lead info and return JSON.",
                    )
                    .with_tool(LeadCaptureTool::new())
                    .build(),
            )?,
            estimator: stage(
                Participant::builder("Estimator")
                    .with_system_instruction(
                        "Use estimator_tool to generate cost estimate from lead JSON.",
                    )
                    .with_tool(ValuationTool::new())
                    .build(),
            )?,
            sales_writer: stage(
                Participant::builder("SalesWriter")
                    .with_system_instruction(
                        "Use sales_writer_tool to create a proposal from lead + estimate JSON.",
                    )
                    .with_tool(ProposalTool::new())
                    .build(),
            )?,
            manager: stage(
                Participant::builder(APPROVER)
                    .with_system_instruction(
                        "Use manager_approval_tool to return {approved: bool, comment: str}.",
                    )
                    .with_tool(ApprovalTool::new())
                    .build(),
            )?,
        })
    }

    /// Runs every stage on `enquiry`. `on_stage` receives each stage's
    /// output as soon as it is available.
    pub async fn run<F>(
        &self,
        enquiry: &str,
        mut on_stage: F,
    ) -> Result<PipelineReport, PipelineError>
    where
        F: FnMut(Stage, &str),
    {
        let lead_text = self.run_stage(Stage::LeadCapture, enquiry).await?;
        on_stage(Stage::LeadCapture, &lead_text);
        let lead = parse_stage_output(Stage::LeadCapture, &lead_text)?;

        let estimate_text = self.run_stage(Stage::Estimate, &lead_text).await?;
        on_stage(Stage::Estimate, &estimate_text);
        let estimate = parse_stage_output(Stage::Estimate, &estimate_text)?;

        let context = json!({ "lead": lead, "estimate": estimate }).to_string();

        let proposal = self.run_stage(Stage::Proposal, &context).await?;
        on_stage(Stage::Proposal, &proposal);

        let decision = self.run_stage(Stage::Approval, &context).await?;
        on_stage(Stage::Approval, &decision);

        Ok(PipelineReport {
            lead,
            estimate,
            proposal,
            decision,
        })
    }

    async fn run_stage(
        &self,
        stage: Stage,
        input: &str,
    ) -> Result<String, PipelineError> {
        let sequencer = match stage {
            Stage::LeadCapture => &self.lead_capture,
            Stage::Estimate => &self.estimator,
            Stage::Proposal => &self.sales_writer,
            Stage::Approval => &self.manager,
        };
        info!("running the {stage} stage");
        let result = sequencer
            .run(input)
            .await
            .map_err(|source| PipelineError::Run { stage, source })?;
        Ok(result.into_final_text())
    }
}

fn parse_stage_output(stage: Stage, text: &str) -> Result<Value, PipelineError> {
    serde_json::from_str(text).map_err(|source| PipelineError::NotJson { stage, source })
}

#[cfg(test)]
mod tests {
    use quote_crew_model::{ModelMessage, ToolCallRequest};
    use quote_crew_test_model::{PresetEvent, PresetResponse, TestModelProvider};

    use super::*;

    fn tool_call(name: &str, arguments: Value) -> PresetResponse {
        PresetResponse::with_events([PresetEvent::ToolCall(ToolCallRequest {
            id: format!("call_{name}"),
            name: name.to_owned(),
            arguments,
        })])
    }

    #[tokio::test]
    async fn test_road_proposal() {
        let lead = json!({
            "name": "Ravi",
            "phone": "9876543210",
            "project_type": "road",
            "location": "Salem",
            "size": "2 km",
            "notes": DEFAULT_ENQUIRY
        });
        let mut provider = TestModelProvider::default();
        provider.add_response(tool_call(
            "lead_capture_tool",
            json!({ "lead_input": DEFAULT_ENQUIRY }),
        ));
        provider.add_response(tool_call(
            "estimator_tool",
            json!({ "lead_json": lead.to_string() }),
        ));
        let context = json!({
            "lead": lead,
            "estimate": {
                "estimated_value": 1250000,
                "currency": "INR",
                "assumptions": ["Cost for road project, 2 km long"]
            }
        })
        .to_string();
        provider.add_response(tool_call(
            "sales_writer_tool",
            json!({ "context_json": context }),
        ));
        provider.add_response(tool_call(
            "manager_approval_tool",
            json!({ "full_context_json": context }),
        ));
        let observer = provider.clone();

        let pipeline = RoadPipeline::new(provider).unwrap();
        let mut stages = vec![];
        let report = pipeline
            .run(DEFAULT_ENQUIRY, |stage, _| stages.push(stage))
            .await
            .unwrap();

        assert_eq!(
            stages,
            [Stage::LeadCapture, Stage::Estimate, Stage::Proposal, Stage::Approval]
        );
        assert_eq!(report.lead, lead);
        assert_eq!(report.estimate["estimated_value"], json!(1250000));
        let proposal: Value = serde_json::from_str(&report.proposal).unwrap();
        assert_eq!(proposal["subject"], json!("Proposal for road at Salem"));
        assert_eq!(
            report.decision,
            r#"{"approved":true,"comment":"Approved"}"#
        );

        // Both late stages receive the same context.
        let requests = observer.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[2].messages[1], ModelMessage::user(context.clone()));
        assert_eq!(requests[3].messages[1], ModelMessage::user(context));
    }

    #[tokio::test]
    async fn test_non_json_stage_output() {
        let mut provider = TestModelProvider::default();
        provider.add_text_response("Sure, here is the lead: Ravi from Salem.");

        let pipeline = RoadPipeline::new(provider).unwrap();
        let err = pipeline.run(DEFAULT_ENQUIRY, |_, _| {}).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NotJson {
                stage: Stage::LeadCapture,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_stage_failure() {
        let mut provider = TestModelProvider::default();
        provider.add_response(tool_call(
            "lead_capture_tool",
            json!({ "lead_input": DEFAULT_ENQUIRY }),
        ));
        provider.add_response(PresetResponse::with_text("unused").with_failures(0));

        let pipeline = RoadPipeline::new(provider).unwrap();
        let err = pipeline.run(DEFAULT_ENQUIRY, |_, _| {}).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Run {
                stage: Stage::Estimate,
                ..
            }
        ));
        assert!(err.to_string().starts_with("estimate stage failed"));
    }
}

//! The builders team that answers detailed home quotes.

use quote_crew_core::{Participant, RunResult, TurnSequencerBuilder};
use quote_crew_model::ModelProvider;

use crate::error::Error;
use crate::tools::RateLookupTool;

/// Marks the reply that ends the team's run.
pub const FINAL_ANSWER: &str = "[[FINAL_ANSWER]]";

/// The team never takes more turns than this.
pub const MAX_TURNS: usize = 10;

const LEAD_INTAKE_INSTRUCTION: &str = "Role: Senior Lead Qualifier. \
Extract clean spec from user message as 'Lead Brief'. \
Include: city, plot size, built-up area, floors, bedrooms, bathrooms, finish level, special requirements, contact.";

const ESTIMATOR_INSTRUCTION: &str = "Role: Civil Estimator. Input: 'Lead Brief'. \
Call tool get_inr_rate_per_sqft(city,spec) and produce rough cost, timeline, subtotal, GST, grand total.";

const SALES_WRITER_INSTRUCTION: &str = "Role: Client Communication Specialist. Input: 'Rough Estimate'. \
Write short, polite message summarizing estimate and timeline, mention it's ballpark, end with [[FINAL_ANSWER]].";

const MANAGER_INSTRUCTION: &str = "Role: Quality Manager. \
Review SalesWriter message. Ensure clarity, politeness, completeness. \
Always end with [[FINAL_ANSWER]].";

/// Returns the four members of the builders team, in speaking order.
pub fn builders_participants() -> [Participant; 4] {
    [
        Participant::builder("LeadIntake")
            .with_system_instruction(LEAD_INTAKE_INSTRUCTION)
            .build(),
        Participant::builder("Estimator")
            .with_system_instruction(ESTIMATOR_INSTRUCTION)
            .with_tool(RateLookupTool::new())
            .reflect_on_tool_use(true)
            .build(),
        Participant::builder("SalesWriter")
            .with_system_instruction(SALES_WRITER_INSTRUCTION)
            .build(),
        Participant::builder("Manager")
            .with_system_instruction(MANAGER_INSTRUCTION)
            .build(),
    ]
}

/// Creates a sequencer builder preset with the builders team.
///
/// Callers may still attach observers before building it.
pub fn builders_team<P: ModelProvider + 'static>(
    provider: P,
) -> TurnSequencerBuilder {
    TurnSequencerBuilder::with_model_provider(provider)
        .with_participants(builders_participants())
        .with_sentinel(FINAL_ANSWER)
        .with_max_turns(MAX_TURNS)
}

/// Runs the builders team on `task` and returns the whole result.
pub async fn run_builders_team<P: ModelProvider + 'static>(
    provider: P,
    task: &str,
) -> Result<RunResult, Error> {
    let team = builders_team(provider).build()?;
    let result = team.run(task).await?;
    if !result.is_complete() {
        warn!("the builders team stopped after {MAX_TURNS} turns");
    }
    Ok(result)
}

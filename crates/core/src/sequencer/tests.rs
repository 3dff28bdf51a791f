use std::future::ready;
use std::sync::{Arc, Mutex};

use quote_crew_model::{ErrorKind, ModelMessage, ToolCallRequest, UserMessage};
use quote_crew_test_model::{PresetEvent, PresetResponse, TestModelProvider};
use serde::Deserialize;
use serde_json::{Value, json};

use super::*;
use crate::tool::{Tool, ToolResult};

const SENTINEL: &str = "[[FINAL_ANSWER]]";

#[derive(Deserialize)]
struct RateInput {
    city: String,
}

struct RateTool {
    schema: Value,
}

impl RateTool {
    fn new() -> Self {
        Self {
            schema: json!({
                "type": "object",
                "properties": { "city": { "type": "string" } },
                "required": ["city"]
            }),
        }
    }
}

impl Tool for RateTool {
    type Input = RateInput;

    fn name(&self) -> &str {
        "rate"
    }

    fn description(&self) -> &str {
        "Looks up the rate of a city"
    }

    fn parameter_schema(&self) -> &Value {
        &self.schema
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(format!("{}: 2100", input.city)))
    }
}

fn participant(name: &str) -> Participant {
    Participant::builder(name)
        .with_system_instruction(format!("You are {name}."))
        .build()
}

fn estimator(reflect: bool) -> Participant {
    Participant::builder("Estimator")
        .with_system_instruction("You estimate costs.")
        .with_tool(RateTool::new())
        .reflect_on_tool_use(reflect)
        .build()
}

fn rate_call(id: &str, city: &str) -> PresetEvent {
    PresetEvent::ToolCall(ToolCallRequest {
        id: id.to_owned(),
        name: "rate".to_owned(),
        arguments: json!({ "city": city }),
    })
}

fn speakers(result: &RunResult) -> Vec<String> {
    result
        .conversation()
        .messages()
        .iter()
        .map(|msg| msg.speaker().to_string())
        .collect()
}

fn system_instruction(req: &ModelRequest) -> &str {
    match &req.messages[0] {
        ModelMessage::System(instruction) => instruction,
        other => panic!("expected a system message, got {other:?}"),
    }
}

#[tokio::test]
async fn test_round_robin_until_sentinel() {
    let mut provider = TestModelProvider::default();
    provider.add_text_response("Lead Brief: 1200 sq.ft in Salem");
    provider.add_text_response("Estimate: INR 25,20,000");
    provider.add_text_response(format!("All good. {SENTINEL}"));
    provider.add_text_response("never used");
    let observer = provider.clone();

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participants([participant("A"), participant("B")])
        .with_sentinel(SENTINEL)
        .build()
        .unwrap();
    let result = sequencer.run("Build a home").await.unwrap();

    assert_eq!(result.outcome(), RunOutcome::SentinelFound { turn: 3 });
    assert!(result.is_complete());
    assert_eq!(speakers(&result), ["user", "A", "B", "A"]);
    assert_eq!(result.final_text(), "All good.");
    assert_eq!(result.conversation().turns(), 3);

    let requests = observer.requests();
    let order: Vec<_> = requests.iter().map(system_instruction).collect();
    assert_eq!(order, ["You are A.", "You are B.", "You are A."]);
    assert_eq!(observer.remaining(), 1);
}

#[tokio::test]
async fn test_turn_limit_reached() {
    let mut provider = TestModelProvider::default();
    for i in 1..=7 {
        provider.add_text_response(format!("reply {i}"));
    }
    let observer = provider.clone();

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participants([participant("A"), participant("B")])
        .with_sentinel(SENTINEL)
        .with_max_turns(5)
        .build()
        .unwrap();
    let result = sequencer.run("Build a home").await.unwrap();

    assert_eq!(result.outcome(), RunOutcome::TurnLimitReached);
    assert!(!result.is_complete());
    assert_eq!(result.conversation().turns(), 5);
    assert_eq!(result.final_text(), "reply 5");
    assert_eq!(observer.requests().len(), 5);
}

#[tokio::test]
async fn test_single_turn_without_sentinel() {
    let mut provider = TestModelProvider::default();
    provider.add_text_response("  Lead captured  ");

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participant(participant("LeadCapture"))
        .with_max_turns(1)
        .build()
        .unwrap();
    let result = sequencer.run("Need a road").await.unwrap();

    assert_eq!(result.outcome(), RunOutcome::TurnLimitReached);
    // Only sentinel hits are trimmed.
    assert_eq!(result.final_text(), "  Lead captured  ");
}

#[tokio::test]
async fn test_sentinel_in_task_does_not_end_run() {
    let mut provider = TestModelProvider::default();
    provider.add_text_response("Lead Brief");
    provider.add_text_response(format!("{SENTINEL} Approved. {SENTINEL}\n"));

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participants([participant("A"), participant("B")])
        .with_sentinel(SENTINEL)
        .build()
        .unwrap();
    let result = sequencer
        .run(format!("Please reply with {SENTINEL} when done"))
        .await
        .unwrap();

    assert_eq!(result.outcome(), RunOutcome::SentinelFound { turn: 2 });
    assert_eq!(result.final_text(), "Approved.");
    // The stored message keeps the sentinel.
    assert!(result.conversation().last().unwrap().content().contains(SENTINEL));
}

#[tokio::test]
async fn test_request_perspective() {
    let mut provider = TestModelProvider::default();
    provider.add_text_response("from A");
    provider.add_text_response("from B");
    provider.add_text_response("again from A");
    let observer = provider.clone();

    let silent = Participant::builder("B").build();
    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participants([participant("A"), silent])
        .with_max_turns(3)
        .build()
        .unwrap();
    sequencer.run("task").await.unwrap();

    let requests = observer.requests();
    assert_eq!(
        requests[1].messages,
        [
            ModelMessage::user("task"),
            ModelMessage::named_user("A", "from A"),
        ]
    );
    assert_eq!(
        requests[2].messages,
        [
            ModelMessage::System("You are A.".to_owned()),
            ModelMessage::user("task"),
            ModelMessage::assistant("from A"),
            ModelMessage::User(UserMessage {
                name: Some("B".to_owned()),
                content: "from B".to_owned(),
            }),
        ]
    );
}

#[tokio::test]
async fn test_tool_output_becomes_message() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_events([
        rate_call("call_1", "salem"),
        rate_call("call_2", "chennai"),
    ]));
    let observer = provider.clone();

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participant(estimator(false))
        .with_max_turns(1)
        .build()
        .unwrap();
    let result = sequencer.run("Estimate").await.unwrap();

    let message = result.conversation().last().unwrap();
    assert_eq!(message.content(), "salem: 2100\nchennai: 2100");
    assert_eq!(message.tool_invocations().len(), 2);
    assert_eq!(message.tool_invocations()[1].id, "call_2");

    let requests = observer.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].tools.len(), 1);
    assert_eq!(requests[0].tools[0].name, "rate");
}

#[tokio::test]
async fn test_reflect_on_tool_use() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_events([
        PresetEvent::MessageDelta("Checking.".to_owned()),
        rate_call("call_1", "salem"),
    ]));
    provider.add_text_response("Estimate: INR 2100 per sq.ft");
    let observer = provider.clone();

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participant(estimator(true))
        .with_max_turns(1)
        .build()
        .unwrap();
    let result = sequencer.run("Estimate").await.unwrap();

    let message = result.conversation().last().unwrap();
    assert_eq!(message.content(), "Estimate: INR 2100 per sq.ft");
    assert_eq!(message.tool_invocations()[0].output, "salem: 2100");

    let requests = observer.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].messages[2..],
        [
            ModelMessage::Assistant(AssistantMessage {
                content: "Checking.".to_owned(),
                tool_calls: vec![ToolCallRequest {
                    id: "call_1".to_owned(),
                    name: "rate".to_owned(),
                    arguments: json!({ "city": "salem" }),
                }],
            }),
            ModelMessage::Tool(ToolCallResult {
                id: "call_1".to_owned(),
                content: "salem: 2100".to_owned(),
            }),
        ]
    );
}

#[tokio::test]
async fn test_tool_rounds_are_bounded() {
    let mut provider = TestModelProvider::default();
    for i in 1..=3 {
        provider.add_response(PresetResponse::with_events([rate_call(
            &format!("call_{i}"),
            "salem",
        )]));
    }
    let observer = provider.clone();

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participant(estimator(true))
        .with_max_turns(1)
        .with_max_tool_rounds(2)
        .build()
        .unwrap();
    let result = sequencer.run("Estimate").await.unwrap();

    let message = result.conversation().last().unwrap();
    assert_eq!(message.content(), "salem: 2100\nsalem: 2100");
    assert_eq!(message.tool_invocations().len(), 2);
    assert_eq!(observer.requests().len(), 3);
}

#[tokio::test]
async fn test_unknown_tool_is_reported_to_model() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_events([PresetEvent::ToolCall(
        ToolCallRequest {
            id: "call_1".to_owned(),
            name: "teleport".to_owned(),
            arguments: json!({}),
        },
    )]));

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participant(estimator(false))
        .with_max_turns(1)
        .build()
        .unwrap();
    let result = sequencer.run("Estimate").await.unwrap();

    let message = result.conversation().last().unwrap();
    assert_eq!(message.content(), "Error: no tool named `teleport` is available");
    assert!(message.tool_invocations()[0].is_error);
}

#[tokio::test]
async fn test_model_error_aborts_run() {
    let mut provider = TestModelProvider::default();
    provider.add_text_response("Lead Brief");
    provider.add_response(PresetResponse::with_text("unused").with_failures(0));

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participants([participant("LeadIntake"), participant("Estimator")])
        .with_sentinel(SENTINEL)
        .build()
        .unwrap();
    let err = sequencer.run("Build a home").await.unwrap_err();

    match &err {
        Error::Model {
            turn, speaker, kind, ..
        } => {
            assert_eq!(*turn, 2);
            assert_eq!(speaker, "Estimator");
            assert_eq!(*kind, ErrorKind::Other);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.model_error_kind(), Some(ErrorKind::Other));
}

#[tokio::test]
async fn test_empty_response_is_malformed() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_events(Vec::<PresetEvent>::new()));

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participant(participant("A"))
        .build()
        .unwrap();
    let err = sequencer.run("task").await.unwrap_err();

    assert!(matches!(err, Error::MalformedResponse { turn: 1, .. }));
    assert_eq!(err.model_error_kind(), Some(ErrorKind::MalformedResponse));
}

#[tokio::test]
async fn test_cut_off_response_is_malformed() {
    let mut provider = TestModelProvider::default();
    provider.add_text_response("Lead Brief");
    provider.add_response(
        PresetResponse::with_events([rate_call("call_1", "Salem")]).without_completion(),
    );

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participants([participant("A"), estimator(false)])
        .with_sentinel(SENTINEL)
        .build()
        .unwrap();
    let err = sequencer.run("task").await.unwrap_err();

    match err {
        Error::MalformedResponse {
            turn,
            ref speaker,
            ..
        } => {
            assert_eq!(turn, 2);
            assert_eq!(speaker, "Estimator");
        }
        _ => panic!("unexpected error: {err:?}"),
    }
}

#[tokio::test]
async fn test_runs_are_independent() {
    let mut provider = TestModelProvider::default();
    for _ in 0..2 {
        provider.add_text_response("Lead Brief");
        provider.add_text_response(format!("Done {SENTINEL}"));
    }

    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participants([participant("A"), participant("B")])
        .with_sentinel(SENTINEL)
        .build()
        .unwrap();
    let first = sequencer.run("Build a home").await.unwrap();
    let second = sequencer.run("Build a home").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.conversation().messages().len(), 3);
}

#[tokio::test]
async fn test_observers() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_events([
        PresetEvent::MessageDelta("Lead ".to_owned()),
        PresetEvent::MessageDelta("Brief".to_owned()),
    ]));
    provider.add_text_response(SENTINEL);

    let deltas = Arc::new(Mutex::new(vec![]));
    let messages = Arc::new(Mutex::new(vec![]));
    let sequencer = TurnSequencerBuilder::with_model_provider(provider)
        .with_participants([participant("A"), participant("B")])
        .with_sentinel(SENTINEL)
        .on_delta({
            let deltas = Arc::clone(&deltas);
            move |speaker, delta| {
                deltas.lock().unwrap().push(format!("{speaker}:{delta}"))
            }
        })
        .on_message({
            let messages = Arc::clone(&messages);
            move |msg| messages.lock().unwrap().push(msg.content().to_owned())
        })
        .build()
        .unwrap();
    let result = sequencer.run("task").await.unwrap();

    assert_eq!(result.final_text(), "");
    assert_eq!(
        *deltas.lock().unwrap(),
        ["A:Lead ", "A:Brief", format!("B:{SENTINEL}").as_str()]
    );
    assert_eq!(*messages.lock().unwrap(), ["Lead Brief", SENTINEL]);
}

#[test]
fn test_builder_validation() {
    let build = |participants: Vec<Participant>| {
        TurnSequencerBuilder::with_model_provider(TestModelProvider::default())
            .with_participants(participants)
    };

    assert!(matches!(build(vec![]).build(), Err(Error::NoParticipants)));
    assert!(matches!(
        build(vec![participant("")]).build(),
        Err(Error::EmptyParticipantName)
    ));
    assert!(matches!(
        build(vec![participant("A"), participant("A")]).build(),
        Err(Error::DuplicateParticipant(name)) if name == "A"
    ));
    assert!(matches!(
        build(vec![participant("A")]).with_max_turns(0).build(),
        Err(Error::ZeroTurnLimit)
    ));
    assert!(matches!(
        build(vec![participant("A")]).with_sentinel("").build(),
        Err(Error::EmptySentinel)
    ));

    let sequencer = build(vec![participant("A"), participant("B")])
        .build()
        .unwrap();
    assert_eq!(sequencer.max_turns(), 10);
    assert_eq!(sequencer.speaker_for_turn(3).name(), "A");
    assert_eq!(sequencer.speaker_for_turn(4).name(), "B");
}

mod builder;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use quote_crew_model::{
    AssistantMessage, ModelFinishReason, ModelMessage, ModelRequest,
    ToolCallResult,
};
use tracing::Instrument;

pub use builder::TurnSequencerBuilder;

use crate::conversation::{Conversation, Message, Speaker, ToolInvocation};
use crate::error::Error;
use crate::model_client::ModelClient;
use crate::participant::Participant;

type OnDelta = Arc<dyn Fn(&str, &str) + Send + Sync>;
type OnMessage = Arc<dyn Fn(&Message) + Send + Sync>;

/// Drives an ordered list of participants in round-robin order until one of
/// them mentions the sentinel, or the turn limit is reached.
///
/// Turns are strictly sequential: turn `k + 1` starts only after the model
/// call and the tool calls of turn `k` have completed. Every call to
/// [`TurnSequencer::run`] owns a fresh [`Conversation`], so a sequencer can
/// serve any number of independent runs.
pub struct TurnSequencer {
    model_client: ModelClient,
    participants: Vec<Participant>,
    sentinel: Option<String>,
    max_turns: usize,
    max_tool_rounds: usize,
    on_delta: Option<OnDelta>,
    on_message: Option<OnMessage>,
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    /// The message of turn `turn` contained the sentinel.
    SentinelFound {
        /// 1-based turn number.
        turn: usize,
    },
    /// Every allowed turn was taken without anyone mentioning the sentinel.
    /// The final text may be incomplete.
    TurnLimitReached,
}

/// The result of a finished run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunResult {
    conversation: Conversation,
    outcome: RunOutcome,
    final_text: String,
}

impl RunResult {
    /// Returns the full conversation of the run, task included.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns how the run ended.
    #[inline]
    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    /// Returns whether the run ended by finding the sentinel.
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, RunOutcome::SentinelFound { .. })
    }

    /// Returns the content of the last message, with the sentinel removed
    /// when the run ended by finding it.
    #[inline]
    pub fn final_text(&self) -> &str {
        &self.final_text
    }

    /// Consumes the result and returns the final text.
    #[inline]
    pub fn into_final_text(self) -> String {
        self.final_text
    }
}

impl TurnSequencer {
    /// Returns the participants in speaking order.
    #[inline]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Returns the turn limit.
    #[inline]
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Returns the participant that speaks on the 1-based `turn`.
    #[inline]
    pub fn speaker_for_turn(&self, turn: usize) -> &Participant {
        debug_assert!(turn >= 1);
        &self.participants[(turn - 1) % self.participants.len()]
    }

    /// Runs the team on `task`.
    ///
    /// Model failures abort the run. Reaching the turn limit is not an
    /// error, see [`RunOutcome::TurnLimitReached`].
    pub async fn run<S: Into<String>>(&self, task: S) -> Result<RunResult, Error> {
        let mut conversation = Conversation::with_task(task.into());

        for turn in 1..=self.max_turns {
            let speaker = self.speaker_for_turn(turn);
            let message = self
                .take_turn(turn, speaker, &conversation)
                .instrument(info_span!("turn", turn, speaker = speaker.name()))
                .await?;
            debug!(
                "turn {turn} by {} produced {} bytes",
                speaker.name(),
                message.content().len()
            );
            if let Some(on_message) = &self.on_message {
                on_message(&message);
            }

            let sentinel = self
                .sentinel
                .as_deref()
                .filter(|sentinel| message.content().contains(sentinel));
            let final_text = sentinel.map(|s| strip_sentinel(message.content(), s));
            conversation.push(message);

            if let Some(final_text) = final_text {
                info!("sentinel found on turn {turn}");
                return Ok(RunResult {
                    conversation,
                    outcome: RunOutcome::SentinelFound { turn },
                    final_text,
                });
            }
        }

        if self.sentinel.is_some() {
            warn!("turn limit {} reached without the sentinel", self.max_turns);
        }
        let final_text = conversation
            .last()
            .map(|msg| msg.content().to_owned())
            .unwrap_or_default();
        Ok(RunResult {
            conversation,
            outcome: RunOutcome::TurnLimitReached,
            final_text,
        })
    }

    async fn take_turn(
        &self,
        turn: usize,
        speaker: &Participant,
        conversation: &Conversation,
    ) -> Result<Message, Error> {
        let mut scratch: Vec<ModelMessage> = vec![];
        let mut invocations: Vec<ToolInvocation> = vec![];
        let mut tool_rounds = 0;

        loop {
            let req = build_request(speaker, conversation, &scratch);
            let resp = self
                .model_client
                .send_request(req, self.delta_observer(speaker))
                .await
                .map_err(|err| Error::Model {
                    turn,
                    speaker: speaker.name().to_owned(),
                    kind: err.kind(),
                    message: err.to_string(),
                })?;

            let malformed = |reason: &str| Error::MalformedResponse {
                turn,
                speaker: speaker.name().to_owned(),
                reason: reason.to_owned(),
            };
            match resp.finish_reason {
                None => return Err(malformed("the response never completed")),
                Some(ModelFinishReason::Length) => {
                    warn!("the response of {} was truncated", speaker.name());
                }
                Some(_) => {}
            }

            if resp.tool_calls.is_empty() {
                let content = if !resp.transcript.trim().is_empty() {
                    resp.transcript
                } else if !invocations.is_empty() {
                    summarize(&invocations)
                } else {
                    return Err(malformed("the response has no content"));
                };
                return Ok(Message::turn(speaker.name(), content, invocations));
            }

            if tool_rounds >= self.max_tool_rounds {
                warn!(
                    "{} still wants tools after {tool_rounds} rounds",
                    speaker.name()
                );
                let content = summarize(&invocations);
                return Ok(Message::turn(speaker.name(), content, invocations));
            }
            tool_rounds += 1;

            let results = speaker.toolset().execute_all(&resp.tool_calls).await;
            if !speaker.reflects_on_tool_use() {
                let content = summarize(&results);
                invocations.extend(results);
                return Ok(Message::turn(speaker.name(), content, invocations));
            }

            scratch.push(ModelMessage::Assistant(AssistantMessage {
                content: resp.transcript,
                tool_calls: resp.tool_calls,
            }));
            scratch.extend(results.iter().map(|result| {
                ModelMessage::Tool(ToolCallResult {
                    id: result.id.clone(),
                    content: result.output.clone(),
                })
            }));
            invocations.extend(results);
        }
    }

    fn delta_observer(
        &self,
        speaker: &Participant,
    ) -> impl Fn(&str) + Send + 'static {
        let on_delta = self.on_delta.clone();
        let name = speaker.name().to_owned();
        move |delta| {
            if let Some(on_delta) = &on_delta {
                on_delta(&name, delta);
            }
        }
    }
}

/// Renders the conversation from the point of view of `speaker`: its own
/// earlier messages are assistant messages, everyone else's are user
/// messages tagged with the author.
fn build_request(
    speaker: &Participant,
    conversation: &Conversation,
    scratch: &[ModelMessage],
) -> ModelRequest {
    let mut messages =
        Vec::with_capacity(conversation.messages().len() + scratch.len() + 1);
    if !speaker.system_instruction().is_empty() {
        messages
            .push(ModelMessage::System(speaker.system_instruction().to_owned()));
    }
    for msg in conversation.messages() {
        let content = msg.content().to_owned();
        messages.push(match msg.speaker() {
            Speaker::User => ModelMessage::user(content),
            Speaker::Participant(name) if name == speaker.name() => {
                ModelMessage::assistant(content)
            }
            Speaker::Participant(name) => {
                ModelMessage::named_user(name.clone(), content)
            }
        });
    }
    messages.extend_from_slice(scratch);
    ModelRequest {
        messages,
        tools: speaker.tool_definitions(),
    }
}

fn summarize(invocations: &[ToolInvocation]) -> String {
    invocations
        .iter()
        .map(|invocation| invocation.output.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_sentinel(content: &str, sentinel: &str) -> String {
    content.replace(sentinel, "").trim().to_owned()
}

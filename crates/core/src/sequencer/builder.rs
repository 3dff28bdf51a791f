use std::collections::HashSet;
use std::sync::Arc;

use quote_crew_model::ModelProvider;

use super::{OnDelta, OnMessage, TurnSequencer};
use crate::conversation::Message;
use crate::error::Error;
use crate::model_client::ModelClient;
use crate::participant::Participant;

const DEFAULT_MAX_TURNS: usize = 10;
const DEFAULT_MAX_TOOL_ROUNDS: usize = 3;

/// [`TurnSequencer`] builder.
pub struct TurnSequencerBuilder {
    model_client: ModelClient,
    participants: Vec<Participant>,
    sentinel: Option<String>,
    max_turns: usize,
    max_tool_rounds: usize,
    on_delta: Option<OnDelta>,
    on_message: Option<OnMessage>,
}

impl TurnSequencerBuilder {
    /// Creates a builder whose participants all talk to `provider`.
    pub fn with_model_provider<P: ModelProvider + 'static>(provider: P) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            participants: vec![],
            sentinel: None,
            max_turns: DEFAULT_MAX_TURNS,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            on_delta: None,
            on_message: None,
        }
    }

    /// Appends a participant. Participants speak in the order they are
    /// added.
    #[inline]
    pub fn with_participant(mut self, participant: Participant) -> Self {
        self.participants.push(participant);
        self
    }

    /// Appends several participants.
    #[inline]
    pub fn with_participants<I>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = Participant>,
    {
        self.participants.extend(participants);
        self
    }

    /// Sets the marker that ends the run as soon as a turn's message
    /// contains it. Without a sentinel, the run always takes every allowed
    /// turn.
    #[inline]
    pub fn with_sentinel<S: Into<String>>(mut self, sentinel: S) -> Self {
        self.sentinel = Some(sentinel.into());
        self
    }

    /// Sets the maximum number of participant turns. Defaults to 10.
    #[inline]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Sets how many times a reflecting participant may call tools within a
    /// single turn. Defaults to 3, values below 1 are treated as 1.
    #[inline]
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds.max(1);
        self
    }

    /// Sets a handler that receives `(speaker, delta)` for every text delta
    /// streamed by the model.
    #[inline]
    pub fn on_delta<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.on_delta = Some(Arc::new(f));
        self
    }

    /// Sets a handler that receives every message once its turn is over.
    #[inline]
    pub fn on_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(f));
        self
    }

    /// Validates the configuration and builds the sequencer.
    pub fn build(self) -> Result<TurnSequencer, Error> {
        if self.participants.is_empty() {
            return Err(Error::NoParticipants);
        }
        let mut names = HashSet::with_capacity(self.participants.len());
        for participant in &self.participants {
            if participant.name().is_empty() {
                return Err(Error::EmptyParticipantName);
            }
            if !names.insert(participant.name()) {
                return Err(Error::DuplicateParticipant(
                    participant.name().to_owned(),
                ));
            }
        }
        if self.max_turns == 0 {
            return Err(Error::ZeroTurnLimit);
        }
        if self.sentinel.as_deref() == Some("") {
            return Err(Error::EmptySentinel);
        }

        debug!(
            "built a sequencer with {} participants, up to {} turns",
            self.participants.len(),
            self.max_turns
        );
        Ok(TurnSequencer {
            model_client: self.model_client,
            participants: self.participants,
            sentinel: self.sentinel,
            max_turns: self.max_turns,
            max_tool_rounds: self.max_tool_rounds,
            on_delta: self.on_delta,
            on_message: self.on_message,
        })
    }
}

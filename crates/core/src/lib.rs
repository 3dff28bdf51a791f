//! Core logic of a quote team: tools, participants, the conversation and
//! the round-robin turn sequencer that drives them.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod conversation;
mod error;
mod model_client;
mod participant;
mod sequencer;
pub mod tool;

pub use error::Error;
pub use participant::{Participant, ParticipantBuilder};
pub use sequencer::{RunOutcome, RunResult, TurnSequencer, TurnSequencerBuilder};

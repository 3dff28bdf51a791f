//! The protocol spoken between the quote team and a text-generation model.
//!
//! Participants of a team never talk to a concrete model service directly.
//! Instead, every turn is expressed as a [`ModelRequest`] (system
//! instruction, conversation history and callable tools) and answered by a
//! streaming [`ModelResponse`]. Any service that can be driven this way
//! implements [`ModelProvider`].
//!
//! Types in this crate don't define any behavior, they are the constraints
//! that providers adhere to. Request shapes are deliberately closed sum
//! types, so that the rest of the workspace never needs to probe loosely
//! typed payloads.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;

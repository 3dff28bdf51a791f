use quote_crew_model::ErrorKind;

/// Errors returned while building or running a [`crate::TurnSequencer`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The sequencer was built without participants.
    #[error("a turn sequencer needs at least one participant")]
    NoParticipants,
    /// A participant has an empty name.
    #[error("participant names must not be empty")]
    EmptyParticipantName,
    /// Two participants share a name.
    #[error("duplicate participant name `{0}`")]
    DuplicateParticipant(String),
    /// The turn limit is zero.
    #[error("the turn limit must be at least 1")]
    ZeroTurnLimit,
    /// The sentinel is an empty string, which every message would contain.
    #[error("the sentinel must not be empty")]
    EmptySentinel,
    /// The model failed to answer a turn.
    #[error("turn {turn} ({speaker}): model request failed ({kind}): {message}")]
    Model {
        /// 1-based turn number.
        turn: usize,
        /// Name of the participant whose turn it was.
        speaker: String,
        /// Kind reported by the provider.
        kind: ErrorKind,
        /// Message reported by the provider.
        message: String,
    },
    /// The model answered with something that cannot become a message.
    #[error("turn {turn} ({speaker}): malformed model response: {reason}")]
    MalformedResponse {
        /// 1-based turn number.
        turn: usize,
        /// Name of the participant whose turn it was.
        speaker: String,
        /// What was wrong with the response.
        reason: String,
    },
}

impl Error {
    /// Returns the provider error kind, if this error came from the model.
    pub fn model_error_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Model { kind, .. } => Some(*kind),
            Error::MalformedResponse { .. } => {
                Some(ErrorKind::MalformedResponse)
            }
            _ => None,
        }
    }
}

use std::fmt::{self, Display, Formatter};

/// The kind of error that occurred while talking to a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The credentials were rejected by the provider.
    Unauthorized,
    /// The content is moderated.
    Moderated,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The provider answered, but the answer could not be understood.
    MalformedResponse,
    /// Any other errors, including transport failures.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Moderated => "moderated",
            ErrorKind::RateLimitExceeded => "rate limit exceeded",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

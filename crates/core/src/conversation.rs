//! Conversation-related types.

use std::fmt::{self, Display};

use serde_json::Value;

/// Who authored a [`Message`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Speaker {
    /// The end user who submitted the task.
    User,
    /// A named participant of the team.
    Participant(String),
}

impl Speaker {
    /// Returns the participant name, or `None` for the end user.
    #[inline]
    pub fn participant_name(&self) -> Option<&str> {
        match self {
            Speaker::User => None,
            Speaker::Participant(name) => Some(name),
        }
    }
}

impl Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => f.write_str("user"),
            Speaker::Participant(name) => f.write_str(name),
        }
    }
}

/// A tool call that happened while a participant was taking its turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolInvocation {
    /// The identifier the model gave to the call.
    pub id: String,
    /// Name of the tool.
    pub name: String,
    /// Arguments the model passed.
    pub arguments: Value,
    /// The text returned to the model.
    pub output: String,
    /// Whether `output` describes an error.
    pub is_error: bool,
}

/// One entry of a [`Conversation`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    speaker: Speaker,
    content: String,
    tool_invocations: Vec<ToolInvocation>,
}

impl Message {
    pub(crate) fn task(content: String) -> Self {
        Self {
            speaker: Speaker::User,
            content,
            tool_invocations: vec![],
        }
    }

    pub(crate) fn turn(
        speaker: &str,
        content: String,
        tool_invocations: Vec<ToolInvocation>,
    ) -> Self {
        Self {
            speaker: Speaker::Participant(speaker.to_owned()),
            content,
            tool_invocations,
        }
    }

    /// Returns the author of the message.
    #[inline]
    pub fn speaker(&self) -> &Speaker {
        &self.speaker
    }

    /// Returns the text of the message.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the tools called while this message was produced.
    #[inline]
    pub fn tool_invocations(&self) -> &[ToolInvocation] {
        &self.tool_invocations
    }
}

/// An append-only record of a single run, oldest message first.
///
/// The first message is always the task from the user, every following
/// message is one participant turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub(crate) fn with_task(task: String) -> Self {
        Self {
            messages: vec![Message::task(task)],
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns all messages.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the most recent message.
    #[inline]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the number of participant turns taken so far.
    #[inline]
    pub fn turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|msg| msg.speaker != Speaker::User)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_counting() {
        let mut conversation = Conversation::with_task("Build a home".to_owned());
        assert_eq!(conversation.turns(), 0);
        assert_eq!(conversation.last().unwrap().speaker(), &Speaker::User);

        conversation.push(Message::turn("LeadIntake", "Lead Brief".to_owned(), vec![]));
        conversation.push(Message::turn("Estimator", "Estimate".to_owned(), vec![]));
        assert_eq!(conversation.turns(), 2);
        assert_eq!(conversation.messages().len(), 3);
        assert_eq!(
            conversation.last().unwrap().speaker().participant_name(),
            Some("Estimator")
        );
        assert_eq!(conversation.last().unwrap().speaker().to_string(), "Estimator");
    }
}

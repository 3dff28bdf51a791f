use serde_json::Value;

use crate::ToolCallRequest;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The input messages, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Tools that are available to the model.
    pub tools: Vec<ModelTool>,
}

/// A complete message in the request history.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A message from anyone other than the model being asked.
    User(UserMessage),
    /// A message previously produced by the model being asked.
    Assistant(AssistantMessage),
    /// A tool call result.
    Tool(ToolCallResult),
}

impl ModelMessage {
    /// Creates an anonymous user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::User(UserMessage {
            name: None,
            content: content.into(),
        })
    }

    /// Creates a user message attributed to a named participant.
    #[inline]
    pub fn named_user<N: Into<String>, S: Into<String>>(
        name: N,
        content: S,
    ) -> Self {
        Self::User(UserMessage {
            name: Some(name.into()),
            content: content.into(),
        })
    }

    /// Creates a plain-text assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::Assistant(AssistantMessage {
            content: content.into(),
            tool_calls: vec![],
        })
    }

    /// Returns the text content of the message.
    pub fn content(&self) -> &str {
        match self {
            ModelMessage::System(content) => content,
            ModelMessage::User(msg) => &msg.content,
            ModelMessage::Assistant(msg) => &msg.content,
            ModelMessage::Tool(result) => &result.content,
        }
    }
}

/// A message from a user, or from another participant of the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserMessage {
    /// Name of the author, `None` for the end user.
    pub name: Option<String>,
    /// The text.
    pub content: String,
}

/// A message produced by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssistantMessage {
    /// The text, possibly empty when the model only requested tools.
    pub content: String,
    /// Tool calls requested along with the text.
    pub tool_calls: Vec<ToolCallRequest>,
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolCallResult {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// The result of the tool call.
    pub content: String,
}

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool.
    ///
    /// For most model providers, the parameters should typically be
    /// defined by a [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}

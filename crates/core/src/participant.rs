use std::fmt::{self, Debug};

use quote_crew_model::ModelTool;

use crate::tool::{AnyTool, Tool, ToolObject, Toolset};

/// A named member of a team.
///
/// A participant is little more than a system instruction and the tools the
/// model may call while speaking as this participant. It is immutable once
/// built.
pub struct Participant {
    name: String,
    system_instruction: String,
    toolset: Toolset,
    reflect_on_tool_use: bool,
}

impl Participant {
    /// Creates a builder for a participant called `name`.
    #[inline]
    pub fn builder<S: Into<String>>(name: S) -> ParticipantBuilder {
        ParticipantBuilder {
            name: name.into(),
            system_instruction: String::new(),
            tools: vec![],
            reflect_on_tool_use: false,
        }
    }

    /// Returns the name of the participant.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the system instruction.
    #[inline]
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Returns whether tool results are handed back to the model before the
    /// turn ends.
    #[inline]
    pub fn reflects_on_tool_use(&self) -> bool {
        self.reflect_on_tool_use
    }

    /// Returns the descriptors of the participant's tools.
    #[inline]
    pub fn tool_definitions(&self) -> Vec<ModelTool> {
        self.toolset.definitions()
    }

    #[inline]
    pub(crate) fn toolset(&self) -> &Toolset {
        &self.toolset
    }
}

impl Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("name", &self.name)
            .field("system_instruction", &self.system_instruction)
            .field("tools", &self.toolset.names().collect::<Vec<_>>())
            .field("reflect_on_tool_use", &self.reflect_on_tool_use)
            .finish()
    }
}

/// [`Participant`] builder.
pub struct ParticipantBuilder {
    name: String,
    system_instruction: String,
    tools: Vec<Box<dyn ToolObject>>,
    reflect_on_tool_use: bool,
}

impl ParticipantBuilder {
    /// Sets the system instruction that steers every turn.
    #[inline]
    pub fn with_system_instruction<S: Into<String>>(
        mut self,
        instruction: S,
    ) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(Box::new(AnyTool(tool)));
        self
    }

    /// When enabled, tool results are sent back to the model, which then
    /// writes the turn's message itself. When disabled (the default), the
    /// turn's message is the tool output.
    #[inline]
    pub fn reflect_on_tool_use(mut self, reflect: bool) -> Self {
        self.reflect_on_tool_use = reflect;
        self
    }

    /// Builds the participant.
    #[inline]
    pub fn build(self) -> Participant {
        Participant {
            name: self.name,
            system_instruction: self.system_instruction,
            toolset: Toolset::with_tools(self.tools),
            reflect_on_tool_use: self.reflect_on_tool_use,
        }
    }
}

use quote_crew_model::{ModelTool, ToolCallRequest};
use tracing::Instrument;

use crate::conversation::ToolInvocation;
use crate::tool::{Error, ToolObject};

/// The tools of one participant, in registration order.
#[derive(Default)]
pub struct Toolset {
    tools: Vec<Box<dyn ToolObject>>,
}

impl Toolset {
    pub fn with_tools(tools: Vec<Box<dyn ToolObject>>) -> Self {
        Self { tools }
    }

    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|tool| tool.name())
    }

    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .iter()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Runs the requested tools one after another, in request order.
    ///
    /// Every request yields exactly one invocation. Unknown tools and
    /// invalid arguments become error invocations instead of failing.
    pub async fn execute_all(
        &self,
        requests: &[ToolCallRequest],
    ) -> Vec<ToolInvocation> {
        let mut invocations = Vec::with_capacity(requests.len());
        for req in requests {
            let result = match self.tools.iter().find(|t| t.name() == req.name) {
                Some(tool) => {
                    trace!("running tool ({}) with args: {:?}", req.id, req.arguments);
                    tool.execute(req.arguments.clone())
                        .instrument(debug_span!("tool execute", name = %req.name))
                        .await
                }
                None => {
                    warn!("tool not found: {}", req.name);
                    Err(Error::not_found().with_reason(format!(
                        "no tool named `{}` is available",
                        req.name
                    )))
                }
            };
            let (output, is_error) = match result {
                Ok(output) => (output, false),
                Err(err) => {
                    debug!("tool {} failed: {err}", req.name);
                    (format!("Error: {}", err.reason()), true)
                }
            };
            invocations.push(ToolInvocation {
                id: req.id.clone(),
                name: req.name.clone(),
                arguments: req.arguments.clone(),
                output,
                is_error,
            });
        }
        invocations
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::tool::{AnyTool, Tool, ToolResult};

    #[derive(Deserialize)]
    struct ShoutInput {
        text: String,
    }

    struct ShoutTool {
        schema: Value,
    }

    impl Tool for ShoutTool {
        type Input = ShoutInput;

        fn name(&self) -> &str {
            "shout"
        }

        fn description(&self) -> &str {
            "Upper-cases the text"
        }

        fn parameter_schema(&self) -> &Value {
            &self.schema
        }

        fn execute(
            &self,
            input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok(input.text.to_uppercase()))
        }
    }

    fn toolset() -> Toolset {
        Toolset::with_tools(vec![Box::new(AnyTool(ShoutTool {
            schema: json!({ "type": "object" }),
        }))])
    }

    fn request(id: &str, name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: id.to_owned(),
            name: name.to_owned(),
            arguments,
        }
    }

    #[test]
    fn test_definitions() {
        let definitions = toolset().definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "shout");
        assert_eq!(definitions[0].parameters, json!({ "type": "object" }));
    }

    #[tokio::test]
    async fn test_execute_all_keeps_order() {
        let invocations = toolset()
            .execute_all(&[
                request("call_1", "shout", json!({ "text": "salem" })),
                request("call_2", "whisper", json!({ "text": "salem" })),
                request("call_3", "shout", json!({ "words": 1 })),
            ])
            .await;

        let ids: Vec<_> = invocations.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["call_1", "call_2", "call_3"]);

        assert_eq!(invocations[0].output, "SALEM");
        assert!(!invocations[0].is_error);

        assert!(invocations[1].is_error);
        assert_eq!(
            invocations[1].output,
            "Error: no tool named `whisper` is available"
        );

        assert!(invocations[2].is_error);
        assert!(invocations[2].output.starts_with("Error: missing field"));
    }
}

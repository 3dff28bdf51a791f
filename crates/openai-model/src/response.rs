use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use quote_crew_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use serde_json::{Map, Value};

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletionChunk, ToolCallDelta};

#[derive(Debug, Default)]
struct PartialToolCall {
    index: Option<u32>,
    id: String,
    name: String,
    arguments: String,
}

impl PartialToolCall {
    fn merge(&mut self, delta: ToolCallDelta) {
        if let Some(id) = delta.id {
            if self.id.is_empty() {
                self.id = id;
            }
        }
        if let Some(function) = delta.function {
            if let Some(name) = function.name {
                self.name.push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                self.arguments.push_str(&arguments);
            }
        }
    }

    fn into_request(self) -> ToolCallRequest {
        let arguments = if self.arguments.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            match serde_json::from_str(&self.arguments) {
                Ok(value) => value,
                Err(err) => {
                    warn!("tool call {} has invalid arguments: {err}", self.id);
                    Value::String(self.arguments)
                }
            }
        };
        ToolCallRequest {
            id: self.id,
            name: self.name,
            arguments,
        }
    }
}

/// Everything accumulated from the stream so far.
///
/// Text deltas are reported as they arrive. Tool calls are only reported
/// once the model says it has finished, since their arguments stream in
/// pieces.
struct StreamState {
    sse: Sse,
    id: Option<String>,
    received_any: bool,
    tool_calls: Vec<PartialToolCall>,
    pending: VecDeque<ModelResponseEvent>,
    finished: bool,
}

impl StreamState {
    fn apply_chunk(&mut self, data: &str) -> Result<(), Error> {
        let chunk = serde_json::from_str::<ChatCompletionChunk>(data)
            .map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::MalformedResponse)
            })?;
        if self.id.get_or_insert_with(|| chunk.id.clone()) != &chunk.id {
            return Err(Error::new(
                "chunk id mismatch",
                ErrorKind::MalformedResponse,
            ));
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            // Usage-only chunk.
            return Ok(());
        };

        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                self.received_any = true;
                self.pending
                    .push_back(ModelResponseEvent::MessageDelta(content));
            }
        }
        for delta in choice.delta.tool_calls.unwrap_or_default() {
            self.received_any = true;
            self.merge_tool_call(delta);
        }

        if let Some(finish_reason) = choice.finish_reason {
            let reason = match finish_reason.as_str() {
                "tool_calls" | "function_call" => ModelFinishReason::ToolCalls,
                "length" => ModelFinishReason::Length,
                "content_filter" => {
                    return Err(Error::new(
                        "the response was filtered",
                        ErrorKind::Moderated,
                    ));
                }
                _ => ModelFinishReason::Stop,
            };
            self.finish(reason);
        }
        Ok(())
    }

    fn merge_tool_call(&mut self, delta: ToolCallDelta) {
        let slot = match (delta.index, &delta.id) {
            (Some(index), _) => {
                self.tool_calls.iter().position(|c| c.index == Some(index))
            }
            (None, Some(id)) => self.tool_calls.iter().position(|c| &c.id == id),
            (None, None) => self.tool_calls.len().checked_sub(1),
        };
        let partial = match slot {
            Some(slot) => &mut self.tool_calls[slot],
            None => {
                self.tool_calls.push(PartialToolCall {
                    index: delta.index,
                    ..Default::default()
                });
                let last = self.tool_calls.len() - 1;
                &mut self.tool_calls[last]
            }
        };
        partial.merge(delta);
    }

    fn finish(&mut self, reason: ModelFinishReason) {
        for tool_call in self.tool_calls.drain(..) {
            self.pending
                .push_back(ModelResponseEvent::ToolCall(tool_call.into_request()));
        }
        self.pending.push_back(ModelResponseEvent::Completed(reason));
        self.finished = true;
    }

    /// Handles a stream that ended without a finish reason.
    ///
    /// Nothing is completed: partial tool calls are dropped and no
    /// `Completed` event is reported, so callers can tell the response was
    /// cut off.
    fn finish_at_eof(&mut self) -> Result<(), Error> {
        if self.finished {
            return Ok(());
        }
        if !self.received_any {
            return Err(Error::new(
                "the stream ended without any output",
                ErrorKind::MalformedResponse,
            ));
        }
        warn!(
            "the stream ended without a finish reason, dropping {} tool call(s)",
            self.tool_calls.len()
        );
        self.tool_calls.clear();
        self.finished = true;
        Ok(())
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, StreamState), Error>;

pin_project! {
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl OpenAIResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let state = StreamState {
            sse,
            id: None,
            received_any: false,
            tool_calls: Default::default(),
            pending: Default::default(),
            finished: false,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(state))),
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut.as_mut() else {
            return Poll::Ready(Ok(None));
        };
        match ready!(next_event_fut.as_mut().poll(cx)) {
            Ok((Some(event), state)) => {
                // More events may follow, keep pulling from the same state.
                *this.next_event_fut = Some(Box::pin(next_event(state)));
                Poll::Ready(Ok(Some(event)))
            }
            Ok((None, _)) => {
                *this.next_event_fut = None;
                Poll::Ready(Ok(None))
            }
            Err(err) => {
                *this.next_event_fut = None;
                Poll::Ready(Err(err))
            }
        }
    }
}

async fn next_event(mut state: StreamState) -> NextEvent {
    loop {
        if let Some(event) = state.pending.pop_front() {
            return Ok((Some(event), state));
        }
        if state.finished {
            return Ok((None, state));
        }

        let data = match state.sse.next_event().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                state.finish_at_eof()?;
                continue;
            }
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {data}");
        if data == "[DONE]" {
            state.finish_at_eof()?;
            continue;
        }
        state.apply_chunk(&data)?;
    }
}

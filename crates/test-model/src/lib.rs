//! A local scripted model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use quote_crew_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: VecDeque<PresetEvent>,
    finish_reason: Option<ModelFinishReason>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        let delay = this.delay;
        let sleep = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        if let Some(event) = this.events.pop_front() {
            let event = match event {
                PresetEvent::MessageDelta(msg) => {
                    ModelResponseEvent::MessageDelta(msg)
                }
                PresetEvent::ToolCall(req) => ModelResponseEvent::ToolCall(req),
            };
            return Poll::Ready(Ok(Some(event)));
        }
        // Emits the finish reason once, then stays exhausted.
        Poll::Ready(Ok(this
            .finish_reason
            .take()
            .map(ModelResponseEvent::Completed)))
    }
}

#[derive(Default)]
struct Script {
    steps: VecDeque<PresetResponse>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to each request. Responses are consumed strictly in
/// the order they were added, one per request, no matter who is asking. If
/// the script runs out, an error will be returned.
///
/// Clones share the same script, so a test can keep a clone around to
/// inspect the requests it received after handing the provider over.
///
/// # Note
///
/// This type is not optimized for production use, every request is copied
/// into the log. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Appends a response to the script.
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.lock().steps.push_back(preset);
    }

    /// Appends a plain text response to the script.
    #[inline]
    pub fn add_text_response<S: Into<String>>(&mut self, text: S) {
        self.add_response(PresetResponse::with_text(text));
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    /// Returns the number of responses that have not been served yet.
    pub fn remaining(&self) -> usize {
        self.lock().steps.len()
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_step(&self, req: &ModelRequest) -> Result<PresetResponse, Error> {
        let mut script = self.lock();
        script.requests.push(req.clone());

        let Some(mut step) = script.steps.pop_front() else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::Other,
            });
        };
        let err = match step.failures {
            None => return Ok(step),
            Some(0) => Error {
                message: "scripted permanent failure",
                kind: ErrorKind::Other,
            },
            Some(remaining) => {
                step.failures = (remaining > 1).then(|| remaining - 1);
                Error {
                    message: "scripted failure",
                    kind: ErrorKind::RateLimitExceeded,
                }
            }
        };
        // A failed step stays at the front until it succeeds.
        script.steps.push_front(step);
        Err(err)
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let delay = self.delay.unwrap_or(Duration::from_millis(1));
        let result = self.next_step(req).map(|step| {
            let finish_reason = if step.incomplete {
                None
            } else if step.has_tool_call() {
                Some(ModelFinishReason::ToolCalls)
            } else {
                Some(ModelFinishReason::Stop)
            };
            TestModelResponse {
                events: step.events.into(),
                finish_reason,
                delay,
                sleep: None,
            }
        });
        ready(result)
    }
}

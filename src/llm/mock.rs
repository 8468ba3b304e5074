use crate::error::SwarmError;
use crate::llm::{CompletionProvider, CompletionRequest};
use crate::types::{AssistantTurn, Message, StreamChunk, ToolCallRequest};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Mutex;
use uuid::Uuid;

/// One provider invocation as observed by [`MockProvider`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model:        String,
    pub instructions: String,
    pub messages:     Vec<Message>,
}

/// A scripted provider for tests and offline demos: returns programmed turns
/// in order and records every call it receives.
pub struct MockProvider {
    turns: Mutex<Vec<AssistantTurn>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    pub fn new(turns: Vec<AssistantTurn>) -> Self {
        Self { turns: Mutex::new(turns), calls: Mutex::new(Vec::new()) }
    }

    /// Number of times the provider was invoked.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The Nth recorded call (0-indexed).
    pub fn call(&self, n: usize) -> Option<RecordedCall> {
        self.calls.lock().unwrap().get(n).cloned()
    }

    /// Builds a tool-call request with a generated correlation id.
    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> ToolCallRequest {
        ToolCallRequest::new(format!("call_{}", Uuid::new_v4().simple()), name, arguments)
    }

    fn next_turn(&self, request: &CompletionRequest<'_>) -> Result<AssistantTurn, SwarmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model:        request.model.to_string(),
            instructions: request.instructions.to_string(),
            messages:     request.messages.to_vec(),
        });

        let mut turns = self.turns.lock().unwrap();
        if turns.is_empty() {
            return Err(SwarmError::Provider(
                "MockProvider: no more programmed turns".to_string(),
            ));
        }
        Ok(turns.remove(0))
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<AssistantTurn, SwarmError> {
        self.next_turn(&request)
    }

    /// Streams the programmed turn's content in small fragments, then the
    /// aggregated turn — same end state as the non-streaming path.
    fn complete_stream<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> BoxStream<'a, Result<StreamChunk, SwarmError>> {
        match self.next_turn(&request) {
            Ok(turn) => {
                let fragments: Vec<String> = turn
                    .content
                    .chars()
                    .collect::<Vec<char>>()
                    .chunks(8)
                    .map(|c| c.iter().collect())
                    .collect();
                let mut chunks: Vec<Result<StreamChunk, SwarmError>> =
                    fragments.into_iter().map(|f| Ok(StreamChunk::Content(f))).collect();
                chunks.push(Ok(StreamChunk::Done(turn)));
                stream::iter(chunks).boxed()
            }
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }
}

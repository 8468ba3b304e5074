use crate::error::SwarmError;
use crate::tools::FunctionSpec;
use crate::types::{AssistantTurn, Message, StreamChunk};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

mod mock;
mod openai;

pub use mock::{MockProvider, RecordedCall};
pub use openai::OpenAiCompatible;

/// Everything a provider needs to produce one assistant turn.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model:        &'a str,
    /// Effective instructions, prepended as the system message.
    pub instructions: &'a str,
    /// The accumulated transcript, in order.
    pub messages:     &'a [Message],
    /// Schemas for the active agent's tools.
    pub tools:        &'a [FunctionSpec],
}

/// The single interface between the orchestration loop and any model backend.
///
/// # Contract
/// - Must be Send + Sync (used behind `Arc<dyn CompletionProvider>`)
/// - Returns one [`AssistantTurn`] per call: content, tool calls, or both
/// - Returns `Err(SwarmError::Provider)` ONLY for unrecoverable failures:
///   network, authentication, rate limit, or an unparseable response
/// - The streaming variant delivers content fragments strictly in generation
///   order and finishes with a [`StreamChunk::Done`] whose turn equals what
///   the non-streaming call would have produced
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<AssistantTurn, SwarmError>;

    /// Incremental variant. The default delegates to [`complete`] and emits a
    /// single `Done` chunk — providers without true streaming stay correct.
    ///
    /// [`complete`]: CompletionProvider::complete
    fn complete_stream<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> BoxStream<'a, Result<StreamChunk, SwarmError>> {
        stream::once(async move { self.complete(request).await.map(StreamChunk::Done) }).boxed()
    }
}

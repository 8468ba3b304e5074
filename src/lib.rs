//! Multi-agent conversational orchestration.
//!
//! A [`Swarm`] runs a turn-based loop: the active [`Agent`]'s instructions,
//! the accumulated transcript, and the agent's tool schemas go to a
//! [`CompletionProvider`](llm::CompletionProvider); any tool calls the model
//! requests are dispatched, their results can hand control to another agent
//! or merge [`ContextVariables`] updates, and the loop repeats until the
//! model stops requesting tools or the turn limit is hit. A shared
//! [`MemoryStore`] gives agents a durable, importance-scored fact log across
//! runs.

pub mod agent;
pub mod context;
pub mod error;
pub mod llm;
pub mod memory;
pub mod swarm;
pub mod tools;
pub mod types;

// Convenience re-exports at crate root
pub use agent::{Agent, AgentRegistry, Instructions};
pub use context::ContextVariables;
pub use error::{RunAborted, SwarmError};
pub use memory::{MemoryEntry, MemoryStore};
pub use swarm::{Swarm, DEFAULT_PROVIDER};
pub use tools::{AgentFunction, FunctionResult, FunctionSpec, ToolError, ToolSet};
pub use types::{
    AssistantTurn, Message, Role, RunEvent, RunOptions, RunResponse, StreamChunk,
    ToolCallRecord, ToolCallRequest,
};

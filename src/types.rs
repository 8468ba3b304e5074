use crate::tools::FunctionResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message within a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A tool invocation requested by the model. Arguments stay as the raw JSON
/// string the provider returned; the dispatcher decodes and validates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned correlation id, echoed back on the tool message.
    pub id:        String,
    pub name:      String,
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), name: name.into(), arguments: arguments.into() }
    }
}

/// One entry in a run transcript.
///
/// Transcripts are append-only: the loop never reorders or rewrites messages
/// once pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role:    Role,
    pub content: String,

    /// Tool invocations requested by the model. Assistant messages only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Correlation id linking a tool message back to its request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Tool name on tool messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role:         Role::System,
            content:      content.into(),
            tool_calls:   Vec::new(),
            tool_call_id: None,
            name:         None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role:         Role::User,
            content:      content.into(),
            tool_calls:   Vec::new(),
            tool_call_id: None,
            name:         None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role:         Role::Assistant,
            content:      content.into(),
            tool_calls:   Vec::new(),
            tool_call_id: None,
            name:         None,
        }
    }

    pub fn tool(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role:         Role::Tool,
            content:      content.into(),
            tool_calls:   Vec::new(),
            tool_call_id: Some(call_id.into()),
            name:         Some(tool_name.into()),
        }
    }
}

/// One completed assistant turn as returned by a completion provider:
/// plain content, zero or more tool-call requests, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantTurn {
    pub content:    String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl AssistantTurn {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), tool_calls: Vec::new() }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self { content: content.into(), tool_calls }
    }
}

/// A fragment of streaming provider output. Fragments arrive strictly in
/// generation order; their concatenation equals the final turn's content.
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// A piece of text content
    Content(String),
    /// Provider finished streaming and returned the aggregated turn
    Done(AssistantTurn),
}

/// High-level events delivered to the caller during a streaming run.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A new turn has started under the named agent
    TurnStarted { turn: usize, agent: String },
    /// A fragment of assistant text from the provider
    Token(String),
    /// A tool call is about to be dispatched
    ToolCallStarted { name: String, arguments: String },
    /// A tool call has completed
    ToolCallFinished { name: String, success: bool, output: String },
    /// Control transferred to a different agent
    Handoff { from: String, to: String },
}

/// Caller-facing knobs for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Overrides the active agent's declared model for every turn
    pub model_override: Option<String>,

    /// When false, tool calls are surfaced in the response but never executed
    pub execute_tools: bool,

    /// Hard cap on provider calls (>= 1). Reaching it is a soft truncation,
    /// not an error: the transcript simply ends in tool-result messages.
    pub max_turns: usize,

    /// When false, intermediate tool-call/tool-result messages are filtered
    /// out of the returned transcript. Dispatch and context merges happen
    /// regardless.
    pub include_tool_messages: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            model_override:        None,
            execute_tools:         true,
            max_turns:             10,
            include_tool_messages: true,
        }
    }
}

impl RunOptions {
    pub fn model_override(mut self, model: impl Into<String>) -> Self {
        self.model_override = Some(model.into());
        self
    }

    pub fn execute_tools(mut self, yes: bool) -> Self {
        self.execute_tools = yes;
        self
    }

    pub fn max_turns(mut self, n: usize) -> Self {
        self.max_turns = n;
        self
    }

    pub fn include_tool_messages(mut self, yes: bool) -> Self {
        self.include_tool_messages = yes;
        self
    }
}

/// A completed tool invocation recorded for caller introspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    /// Decoded arguments, or the raw string when decoding failed.
    pub arguments: Value,
    pub result:    FunctionResult,
}

/// Everything a run produced: the transcript (filtered per
/// [`RunOptions::include_tool_messages`]), the final active agent, and the
/// ordered list of tool invocations with their results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunResponse {
    pub messages:     Vec<Message>,
    /// Name of the agent active when the run ended.
    pub agent:        String,
    pub tool_results: Vec<ToolCallRecord>,
}

impl RunResponse {
    /// The last message in the transcript, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Content of the last assistant message, if the transcript ends with one.
    pub fn final_answer(&self) -> Option<&str> {
        match self.messages.last() {
            Some(m) if m.role == Role::Assistant => Some(&m.content),
            _ => None,
        }
    }
}

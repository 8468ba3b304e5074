use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionTool, ChatCompletionToolType,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, FunctionObject,
    },
    Client,
};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::SwarmError;
use crate::llm::{CompletionProvider, CompletionRequest};
use crate::types::{AssistantTurn, Message, Role, StreamChunk, ToolCallRequest};

/// Completion provider for OpenAI and every OpenAI-compatible chat API
/// (DeepSeek, Groq, Together, Ollama, Fireworks, …).
pub struct OpenAiCompatible {
    client: Client<OpenAIConfig>,
}

impl OpenAiCompatible {
    /// Standard OpenAI client using the OPENAI_API_KEY env var.
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self { client: Client::with_config(config) }
    }

    /// Custom base URL — api_base example: "https://api.deepseek.com/v1".
    pub fn with_base_url(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_base(api_base).with_api_key(api_key);
        Self { client: Client::with_config(config) }
    }

    fn build_request(
        &self,
        request: &CompletionRequest<'_>,
        stream: bool,
    ) -> Result<CreateChatCompletionRequest, SwarmError> {
        // Build wire-format JSON first, then round-trip through serde into
        // async-openai's typed messages.
        let wire = wire_messages(request.instructions, request.messages);
        let messages: Vec<ChatCompletionRequestMessage> =
            serde_json::from_value(Value::Array(wire))
                .map_err(|e| SwarmError::Provider(format!("failed to build messages: {}", e)))?;

        let tools: Vec<ChatCompletionTool> = request
            .tools
            .iter()
            .map(|spec| ChatCompletionTool {
                r#type:   ChatCompletionToolType::Function,
                function: FunctionObject {
                    name:        spec.name.clone(),
                    description: Some(spec.description.clone()),
                    parameters:  Some(spec.parameters.clone()),
                },
            })
            .collect();

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(request.model).messages(messages);
        if stream {
            builder.stream(true);
        }
        if !tools.is_empty() {
            builder.tools(tools);
        }

        builder
            .build()
            .map_err(|e| SwarmError::Provider(format!("failed to build request: {}", e)))
    }
}

impl Default for OpenAiCompatible {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a transcript into the OpenAI chat wire format, with the effective
/// instructions prepended as the system message.
fn wire_messages(instructions: &str, messages: &[Message]) -> Vec<Value> {
    let mut wire = Vec::with_capacity(messages.len() + 1);

    if !instructions.is_empty() {
        wire.push(json!({ "role": "system", "content": instructions }));
    }

    for message in messages {
        match message.role {
            Role::Assistant if !message.tool_calls.is_empty() => {
                let tool_calls: Vec<Value> = message
                    .tool_calls
                    .iter()
                    .map(|tc| {
                        json!({
                            "id": tc.id,
                            "type": "function",
                            "function": { "name": tc.name, "arguments": tc.arguments }
                        })
                    })
                    .collect();
                let content = if message.content.is_empty() {
                    Value::Null
                } else {
                    Value::String(message.content.clone())
                };
                wire.push(json!({
                    "role": "assistant",
                    "content": content,
                    "tool_calls": tool_calls
                }));
            }
            Role::Tool => {
                wire.push(json!({
                    "role": "tool",
                    "tool_call_id": message.tool_call_id.clone().unwrap_or_default(),
                    "content": message.content
                }));
            }
            role => {
                wire.push(json!({ "role": role.to_string(), "content": message.content }));
            }
        }
    }

    wire
}

#[async_trait]
impl CompletionProvider for OpenAiCompatible {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<AssistantTurn, SwarmError> {
        let api_request = self.build_request(&request, false)?;

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(|e| SwarmError::Provider(format!("chat completion failed: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SwarmError::Provider("empty response from provider".to_string()))?;

        let message = choice.message;
        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCallRequest::new(tc.id, tc.function.name, tc.function.arguments))
            .collect();

        Ok(AssistantTurn {
            content: message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    fn complete_stream<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> BoxStream<'a, Result<StreamChunk, SwarmError>> {
        let api_request = match self.build_request(&request, true) {
            Ok(r) => r,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };

        let client = self.client.clone();

        stream::once(async move {
            client
                .chat()
                .create_stream(api_request)
                .await
                .map_err(|e| SwarmError::Provider(format!("chat stream failed: {}", e)))
        })
        .flat_map(|opened| match opened {
            Ok(inner) => {
                let mut content_acc = String::new();

                #[derive(Default)]
                struct ToolCallAcc {
                    id:   Option<String>,
                    name: Option<String>,
                    args: String,
                }
                let mut tool_acc: HashMap<i32, ToolCallAcc> = HashMap::new();

                inner
                    .filter_map(move |item| {
                        let mapped: Option<Result<StreamChunk, SwarmError>> = match item {
                            Err(e) => {
                                Some(Err(SwarmError::Provider(format!("stream error: {}", e))))
                            }
                            Ok(resp) => match resp.choices.into_iter().next() {
                                None => None,
                                Some(choice) => {
                                    let delta = choice.delta;

                                    if let Some(tool_calls) = delta.tool_calls {
                                        for tc in tool_calls {
                                            let acc = tool_acc.entry(tc.index).or_default();
                                            if let Some(id) = tc.id {
                                                acc.id = Some(id);
                                            }
                                            if let Some(func) = tc.function {
                                                if let Some(name) = func.name {
                                                    acc.name = Some(name);
                                                }
                                                if let Some(args) = func.arguments {
                                                    acc.args.push_str(&args);
                                                }
                                            }
                                        }
                                        None
                                    } else if let Some(content) =
                                        delta.content.filter(|c| !c.is_empty())
                                    {
                                        content_acc.push_str(&content);
                                        Some(Ok(StreamChunk::Content(content)))
                                    } else if choice.finish_reason.is_some() {
                                        // aggregate into the same turn the
                                        // non-streaming path would produce
                                        let mut indexed: Vec<(i32, ToolCallAcc)> =
                                            tool_acc.drain().collect();
                                        indexed.sort_by_key(|(index, _)| *index);
                                        let tool_calls = indexed
                                            .into_iter()
                                            .map(|(_, acc)| ToolCallRequest {
                                                id:        acc.id.unwrap_or_default(),
                                                name:      acc.name.unwrap_or_default(),
                                                arguments: acc.args,
                                            })
                                            .collect();
                                        Some(Ok(StreamChunk::Done(AssistantTurn {
                                            content: content_acc.clone(),
                                            tool_calls,
                                        })))
                                    } else {
                                        None
                                    }
                                }
                            },
                        };
                        futures::future::ready(mapped)
                    })
                    .boxed()
            }
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        })
        .boxed()
    }
}

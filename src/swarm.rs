use crate::agent::{Agent, AgentRegistry};
use crate::context::ContextVariables;
use crate::error::{RunAborted, SwarmError};
use crate::llm::{CompletionProvider, CompletionRequest};
use crate::tools::{self, FunctionResult, ToolError};
use crate::types::{
    Message, Role, RunEvent, RunOptions, RunResponse, StreamChunk, ToolCallRecord,
    ToolCallRequest,
};
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Provider key used when an agent does not select one explicitly.
pub const DEFAULT_PROVIDER: &str = "default";

/// The orchestration engine: a turn-based loop over one conversation.
///
/// Each turn sends the running transcript to the active agent's completion
/// provider, executes any tool calls the model requested, applies handoffs
/// and context merges, and repeats until the model stops requesting tools or
/// the turn limit is reached.
///
/// # Example
/// ```no_run
/// use swarmkit::{Agent, Message, RunOptions, Swarm};
/// use swarmkit::llm::OpenAiCompatible;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn demo() -> anyhow::Result<()> {
/// let mut swarm = Swarm::new(Arc::new(OpenAiCompatible::new()));
/// swarm.register_agent(Agent::new("Agent", "gpt-4o", "You are a helpful agent."))?;
///
/// let response = swarm
///     .run(
///         &CancellationToken::new(),
///         "Agent",
///         vec![Message::user("Hi!")],
///         Default::default(),
///         RunOptions::default().max_turns(5),
///     )
///     .await?;
/// println!("{}", response.final_answer().unwrap_or(""));
/// # Ok(())
/// # }
/// ```
pub struct Swarm {
    providers: HashMap<String, Arc<dyn CompletionProvider>>,
    registry:  AgentRegistry,
}

/// Mutable per-run state: the working transcript is always the full message
/// sequence; filtering for the caller happens only when building a response.
struct RunState {
    transcript:   Vec<Message>,
    tool_records: Vec<ToolCallRecord>,
    active:       Arc<Agent>,
    context:      ContextVariables,
}

impl RunState {
    fn response(&self, options: &RunOptions) -> RunResponse {
        let messages = if options.include_tool_messages {
            self.transcript.clone()
        } else {
            self.transcript
                .iter()
                .filter_map(|m| match m.role {
                    Role::Tool => None,
                    Role::Assistant if !m.tool_calls.is_empty() => {
                        if m.content.is_empty() {
                            None
                        } else {
                            Some(Message::assistant(m.content.clone()))
                        }
                    }
                    _ => Some(m.clone()),
                })
                .collect()
        };

        RunResponse {
            messages,
            agent: self.active.name.clone(),
            tool_results: self.tool_records.clone(),
        }
    }
}

impl Swarm {
    /// Creates a swarm with a single default provider.
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        let mut providers = HashMap::new();
        providers.insert(DEFAULT_PROVIDER.to_string(), provider);
        Self { providers, registry: AgentRegistry::new() }
    }

    /// Registers an additional provider agents can select by key.
    pub fn register_provider(
        &mut self,
        key: impl Into<String>,
        provider: Arc<dyn CompletionProvider>,
    ) {
        self.providers.insert(key.into(), provider);
    }

    /// Registers an agent into the handoff graph. Fails on duplicate agent
    /// names or duplicate tool names within the agent.
    pub fn register_agent(&mut self, agent: Agent) -> Result<Arc<Agent>, SwarmError> {
        self.registry.register(agent)
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    fn provider_for(&self, agent: &Agent) -> Result<Arc<dyn CompletionProvider>, SwarmError> {
        let key = agent.provider.as_deref().unwrap_or(DEFAULT_PROVIDER);
        self.providers.get(key).cloned().ok_or_else(|| {
            SwarmError::Config(format!(
                "agent '{}' selects unknown provider '{}'",
                agent.name, key
            ))
        })
    }

    /// Runs one conversation to completion.
    ///
    /// Performs at most `options.max_turns` provider calls. Reaching the
    /// limit is a soft truncation: the response is returned as accumulated,
    /// its transcript ending in tool-result messages with no trailing
    /// assistant summary.
    ///
    /// Provider failures and cancellation abort the run; the partial
    /// transcript rides along inside the returned [`RunAborted`].
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        agent: &str,
        messages: Vec<Message>,
        context: ContextVariables,
        options: RunOptions,
    ) -> Result<RunResponse, RunAborted> {
        self.run_inner(cancel, agent, messages, context, options, false, None).await
    }

    /// Like [`run`], but provider turns stream: content fragments (and tool
    /// lifecycle events) are delivered over `events` in order while the run
    /// progresses. The final [`RunResponse`] is identical to the
    /// non-streaming one.
    ///
    /// [`run`]: Swarm::run
    pub async fn run_streaming(
        &self,
        cancel: &CancellationToken,
        agent: &str,
        messages: Vec<Message>,
        context: ContextVariables,
        options: RunOptions,
        events: UnboundedSender<RunEvent>,
    ) -> Result<RunResponse, RunAborted> {
        self.run_inner(cancel, agent, messages, context, options, true, Some(events)).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_inner(
        &self,
        cancel: &CancellationToken,
        agent_name: &str,
        messages: Vec<Message>,
        context: ContextVariables,
        options: RunOptions,
        streaming: bool,
        events: Option<UnboundedSender<RunEvent>>,
    ) -> Result<RunResponse, RunAborted> {
        let active = match self.registry.resolve(agent_name) {
            Ok(agent) => agent,
            Err(error) => {
                return Err(RunAborted::new(
                    error,
                    RunResponse {
                        messages,
                        agent: agent_name.to_string(),
                        tool_results: Vec::new(),
                    },
                ));
            }
        };

        let mut state = RunState {
            transcript:   messages,
            tool_records: Vec::new(),
            active,
            context,
        };

        if options.max_turns == 0 {
            return Err(self.abort(
                SwarmError::Config("max_turns must be at least 1".to_string()),
                &state,
                &options,
            ));
        }

        for turn in 1..=options.max_turns {
            // Cancellation is authoritative at provider-call granularity:
            // once cancelled, no further provider call is issued.
            if cancel.is_cancelled() {
                return Err(self.abort(SwarmError::Cancelled, &state, &options));
            }

            let instructions = state.active.instructions_for(&state.context);
            let specs = state.active.tools().specs();
            let model = options
                .model_override
                .clone()
                .unwrap_or_else(|| state.active.model.clone());
            let provider = match self.provider_for(&state.active) {
                Ok(p) => p,
                Err(e) => return Err(self.abort(e, &state, &options)),
            };

            if let Some(tx) = &events {
                let _ = tx.send(RunEvent::TurnStarted { turn, agent: state.active.name.clone() });
            }
            tracing::debug!(
                agent = %state.active.name,
                model = %model,
                turn,
                transcript_len = state.transcript.len(),
                "requesting completion"
            );

            let reply = {
                let request = CompletionRequest {
                    model:        &model,
                    instructions: &instructions,
                    messages:     &state.transcript,
                    tools:        &specs,
                };

                if streaming {
                    let mut chunks = provider.complete_stream(request);
                    let mut done = None;
                    loop {
                        match chunks.next().await {
                            Some(Ok(StreamChunk::Content(fragment))) => {
                                if let Some(tx) = &events {
                                    let _ = tx.send(RunEvent::Token(fragment));
                                }
                            }
                            Some(Ok(StreamChunk::Done(turn_reply))) => {
                                done = Some(turn_reply);
                            }
                            Some(Err(e)) => return Err(self.abort(e, &state, &options)),
                            None => break,
                        }
                    }
                    match done {
                        Some(turn_reply) => turn_reply,
                        None => {
                            return Err(self.abort(
                                SwarmError::Provider(
                                    "stream ended without a final turn".to_string(),
                                ),
                                &state,
                                &options,
                            ));
                        }
                    }
                } else {
                    match provider.complete(request).await {
                        Ok(turn_reply) => turn_reply,
                        Err(e) => return Err(self.abort(e, &state, &options)),
                    }
                }
            };

            state.transcript.push(Message {
                role:         Role::Assistant,
                content:      reply.content.clone(),
                tool_calls:   reply.tool_calls.clone(),
                tool_call_id: None,
                name:         None,
            });

            // No tool calls (or execution disabled): the run is done after
            // exactly this provider call.
            if reply.tool_calls.is_empty() || !options.execute_tools {
                tracing::debug!(agent = %state.active.name, turn, "run complete");
                return Ok(state.response(&options));
            }

            let (cancelled, handoff) =
                self.dispatch_tool_calls(cancel, &reply.tool_calls, &mut state, &events).await;

            if let Some(target) = handoff {
                if let Err(e) = self.apply_handoff(&target, &mut state, &events) {
                    return Err(self.abort(e, &state, &options));
                }
            }

            if cancelled {
                return Err(self.abort(SwarmError::Cancelled, &state, &options));
            }
        }

        tracing::info!(
            max_turns = options.max_turns,
            agent = %state.active.name,
            "turn limit reached, returning truncated response"
        );
        Ok(state.response(&options))
    }

    /// Dispatches one turn's tool calls concurrently, then applies their
    /// effects — transcript appends, records, context merges — strictly in
    /// the order the provider requested them, regardless of completion
    /// timing. Returns whether cancellation stopped later calls from
    /// starting, plus the turn's winning handoff target (the last result in
    /// call order that named one, since only one agent can own the next
    /// turn).
    async fn dispatch_tool_calls(
        &self,
        cancel: &CancellationToken,
        calls: &[ToolCallRequest],
        state: &mut RunState,
        events: &Option<UnboundedSender<RunEvent>>,
    ) -> (bool, Option<String>) {
        // Handlers get a read-only snapshot; updates come back in results.
        let snapshot = state.context.clone();

        let mut started: Vec<(ToolCallRequest, JoinHandle<FunctionResult>)> = Vec::new();
        let mut cancelled = false;
        for call in calls {
            // Advisory at tool-call granularity: calls that have not started
            // are skipped, in-flight ones run to completion.
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if let Some(tx) = events {
                let _ = tx.send(RunEvent::ToolCallStarted {
                    name:      call.name.clone(),
                    arguments: call.arguments.clone(),
                });
            }
            let agent = Arc::clone(&state.active);
            let owned_call = call.clone();
            let snap = snapshot.clone();
            started.push((
                call.clone(),
                tokio::task::spawn_blocking(move || {
                    tools::dispatch(agent.tools(), &owned_call, &snap)
                }),
            ));
        }

        let mut handoff: Option<String> = None;
        for (call, handle) in started {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => FunctionResult::failed(ToolError::HandlerFailure(format!(
                    "handler task failed: {}",
                    e
                ))),
            };

            let output = result.output();
            if result.success {
                tracing::debug!(tool = %call.name, "tool call succeeded");
            } else {
                tracing::warn!(tool = %call.name, error = %output, "tool call failed");
            }
            if let Some(tx) = events {
                let _ = tx.send(RunEvent::ToolCallFinished {
                    name:    call.name.clone(),
                    success: result.success,
                    output:  output.clone(),
                });
            }

            state.transcript.push(Message::tool(call.id.clone(), call.name.clone(), output));

            if let Some(target) = &result.agent {
                handoff = Some(target.clone());
            }
            state.context.merge(result.context_updates.clone());

            let arguments = serde_json::from_str::<Value>(&call.arguments)
                .unwrap_or_else(|_| Value::String(call.arguments.clone()));
            state.tool_records.push(ToolCallRecord {
                tool_name: call.name.clone(),
                arguments,
                result,
            });
        }

        (cancelled, handoff)
    }

    /// Transfers control to the named agent. The transcript is neither reset
    /// nor forked — the successor sees full prior history.
    fn apply_handoff(
        &self,
        target: &str,
        state: &mut RunState,
        events: &Option<UnboundedSender<RunEvent>>,
    ) -> Result<(), SwarmError> {
        if target == state.active.name {
            return Ok(());
        }

        let next = self.registry.resolve(target)?;
        tracing::info!(from = %state.active.name, to = %next.name, "agent handoff");
        if let Some(tx) = events {
            let _ = tx.send(RunEvent::Handoff {
                from: state.active.name.clone(),
                to:   next.name.clone(),
            });
        }
        state.active = next;
        Ok(())
    }

    fn abort(&self, error: SwarmError, state: &RunState, options: &RunOptions) -> RunAborted {
        tracing::warn!(error = %error, agent = %state.active.name, "run aborted");
        RunAborted::new(error, state.response(options))
    }
}

use crate::context::ContextVariables;
use crate::error::SwarmError;
use crate::tools::{AgentFunction, ToolSet};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// What an agent tells the model every turn: either a fixed string or a pure
/// function of the current context variables, re-evaluated before each
/// provider call.
#[derive(Clone)]
pub enum Instructions {
    Static(String),
    Computed(Arc<dyn Fn(&ContextVariables) -> String + Send + Sync>),
}

impl Instructions {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&ContextVariables) -> String + Send + Sync + 'static,
    {
        Instructions::Computed(Arc::new(f))
    }

    /// The effective instructions for the given context.
    pub fn evaluate(&self, context: &ContextVariables) -> String {
        match self {
            Instructions::Static(text) => text.clone(),
            Instructions::Computed(f) => f(context),
        }
    }
}

impl std::fmt::Debug for Instructions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instructions::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Instructions::Computed(_) => f.debug_tuple("Computed").field(&"<fn>").finish(),
        }
    }
}

impl From<&str> for Instructions {
    fn from(text: &str) -> Self {
        Instructions::Static(text.to_string())
    }
}

impl From<String> for Instructions {
    fn from(text: String) -> Self {
        Instructions::Static(text)
    }
}

/// A named bundle of instructions, model selection, provider selection, and
/// tools.
///
/// Agents are immutable during a run; their tool set may only be extended
/// before the run begins. Handoffs between agents are expressed by name and
/// resolved through the [`AgentRegistry`], so mutually referencing agents
/// (triage → sales → triage) need no forward references: construct every
/// agent first, then register them all.
///
/// # Example
/// ```
/// use swarmkit::{Agent, AgentFunction, FunctionResult};
/// use serde_json::json;
///
/// let agent = Agent::new("TriageAgent", "gpt-4o", "Route the user to the right agent.")
///     .function(AgentFunction::new(
///         "transferToSales",
///         "Transfer the conversation to the SalesAgent.",
///         json!({ "type": "object", "properties": {} }),
///         |_args, _ctx| FunctionResult::handoff("SalesAgent", "Transferring to SalesAgent."),
///     ));
/// assert_eq!(agent.name, "TriageAgent");
/// ```
#[derive(Debug, Clone)]
pub struct Agent {
    pub name:         String,
    pub model:        String,
    /// Provider key within the swarm; `None` selects the default provider.
    pub provider:     Option<String>,
    pub instructions: Instructions,
    tools:            ToolSet,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        instructions: impl Into<Instructions>,
    ) -> Self {
        Self {
            name:         name.into(),
            model:        model.into(),
            provider:     None,
            instructions: instructions.into(),
            tools:        ToolSet::new(),
        }
    }

    /// Selects a non-default provider registered under `key`.
    pub fn with_provider(mut self, key: impl Into<String>) -> Self {
        self.provider = Some(key.into());
        self
    }

    /// Appends a tool. Chainable; duplicate names are rejected at
    /// registration time.
    pub fn function(mut self, function: AgentFunction) -> Self {
        self.tools.register(function);
        self
    }

    /// Extends the tool set in place — allowed only before a run begins.
    pub fn add_function(&mut self, function: AgentFunction) {
        self.tools.register(function);
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Evaluates this agent's effective instructions against the context.
    pub fn instructions_for(&self, context: &ContextVariables) -> String {
        self.instructions.evaluate(context)
    }
}

/// Name-keyed collection of agents forming the handoff graph.
///
/// Two-phase construction: build agents first, register them all, then run.
/// Registration is the validation point — duplicate agent names and duplicate
/// tool names within one agent are configuration errors.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self { agents: HashMap::new() }
    }

    pub fn register(&mut self, agent: Agent) -> Result<Arc<Agent>, SwarmError> {
        if agent.name.is_empty() {
            return Err(SwarmError::Config("agent name must not be empty".to_string()));
        }
        if self.agents.contains_key(&agent.name) {
            return Err(SwarmError::Config(format!(
                "agent '{}' is already registered",
                agent.name
            )));
        }

        let mut seen = HashSet::new();
        for tool in agent.tools.names() {
            if !seen.insert(tool) {
                return Err(SwarmError::Config(format!(
                    "agent '{}' declares tool '{}' more than once",
                    agent.name, tool
                )));
            }
        }

        let agent = Arc::new(agent);
        self.agents.insert(agent.name.clone(), Arc::clone(&agent));
        Ok(agent)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Agent>> {
        self.agents.get(name).cloned()
    }

    /// Looks up a handoff target; a missing name is a configuration error.
    pub fn resolve(&self, name: &str) -> Result<Arc<Agent>, SwarmError> {
        self.get(name).ok_or_else(|| SwarmError::UnknownAgent(name.to_string()))
    }

    /// Registered agent names, sorted — makes the handoff graph introspectable.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

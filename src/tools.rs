use crate::context::ContextVariables;
use crate::types::ToolCallRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// A tool handler: takes decoded JSON arguments plus a read-only snapshot of
/// the context variables, returns a [`FunctionResult`].
/// Arc<dyn Fn> — shared, Send + Sync so calls can run on blocking threads.
pub type ToolHandler =
    Arc<dyn Fn(&HashMap<String, Value>, &ContextVariables) -> FunctionResult + Send + Sync>;

/// Why a tool call failed before or during handler execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ToolError {
    /// No tool registered under the requested name
    UnknownTool(String),
    /// Raw arguments failed to decode or violate the declared schema
    InvalidArguments(String),
    /// The handler reported failure or faulted mid-call
    HandlerFailure(String),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ToolError::UnknownTool(name) => write!(f, "unknown tool '{}'", name),
            ToolError::InvalidArguments(detail) => write!(f, "invalid arguments: {}", detail),
            ToolError::HandlerFailure(detail) => write!(f, "handler failure: {}", detail),
        }
    }
}

/// The uniform outcome type every tool handler returns.
///
/// Besides a data payload, a result may name an agent to hand control to and
/// carry context-variable updates for the loop to merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionResult {
    pub success: bool,

    /// Opaque payload fed back to the model as the tool message content.
    #[serde(default)]
    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,

    /// Handoff target, resolved by name through the agent registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    /// Partial context-variable updates, merged last-write-wins per key.
    #[serde(default, skip_serializing_if = "ContextVariables::is_empty")]
    pub context_updates: ContextVariables,
}

impl Default for FunctionResult {
    fn default() -> Self {
        Self {
            success:         true,
            data:            Value::Null,
            error:           None,
            agent:           None,
            context_updates: ContextVariables::new(),
        }
    }
}

impl FunctionResult {
    /// A successful result with the given payload.
    pub fn ok(data: impl Into<Value>) -> Self {
        Self { data: data.into(), ..Self::default() }
    }

    /// A handler-reported failure.
    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            error:   Some(ToolError::HandlerFailure(detail.into())),
            ..Self::default()
        }
    }

    /// A successful result that transfers control to the named agent.
    pub fn handoff(agent: impl Into<String>, data: impl Into<Value>) -> Self {
        Self { data: data.into(), agent: Some(agent.into()), ..Self::default() }
    }

    pub fn with_context(mut self, updates: ContextVariables) -> Self {
        self.context_updates = updates;
        self
    }

    pub(crate) fn failed(error: ToolError) -> Self {
        Self { success: false, error: Some(error), ..Self::default() }
    }

    /// Renders this result as tool-message content: the payload on success,
    /// the error description on failure.
    pub fn output(&self) -> String {
        if self.success {
            match &self.data {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            }
        } else {
            self.error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "tool call failed".to_string())
        }
    }
}

/// Declarative description of one tool: what the model sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name:        String,
    pub description: String,
    /// JSON-Schema-like parameter declaration: type/properties/required.
    pub parameters:  Value,
}

/// A tool an agent can offer the model: spec plus handler.
#[derive(Clone)]
pub struct AgentFunction {
    pub spec: FunctionSpec,
    handler:  ToolHandler,
}

impl AgentFunction {
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(&HashMap<String, Value>, &ContextVariables) -> FunctionResult
            + Send
            + Sync
            + 'static,
    {
        Self {
            spec: FunctionSpec {
                name:        name.into(),
                description: description.into(),
                parameters,
            },
            handler: Arc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

impl std::fmt::Debug for AgentFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentFunction")
            .field("spec", &self.spec)
            .field("handler", &"<handler>")
            .finish()
    }
}

/// An agent's ordered, uniquely named tool set.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    functions: Vec<AgentFunction>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self { functions: Vec::new() }
    }

    /// Appends a function. Name uniqueness is enforced when the owning agent
    /// is registered — see [`AgentRegistry`](crate::agent::AgentRegistry).
    pub fn register(&mut self, function: AgentFunction) {
        self.functions.push(function);
    }

    pub fn get(&self, name: &str) -> Option<&AgentFunction> {
        self.functions.iter().find(|f| f.spec.name == name)
    }

    /// The schemas sent to the provider, in registration order.
    pub fn specs(&self) -> Vec<FunctionSpec> {
        self.functions.iter().map(|f| f.spec.clone()).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|f| f.spec.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Executes one requested tool call against a tool set.
///
/// Lookup, decode, validation, or handler failures all come back as failed
/// [`FunctionResult`]s — a fault inside a handler (including a panic) is
/// contained here and never terminates the run.
pub fn dispatch(
    tools: &ToolSet,
    call: &ToolCallRequest,
    context: &ContextVariables,
) -> FunctionResult {
    let function = match tools.get(&call.name) {
        Some(f) => f,
        None => {
            tracing::warn!(tool = %call.name, "requested tool not registered");
            return FunctionResult::failed(ToolError::UnknownTool(call.name.clone()));
        }
    };

    let args = match decode_arguments(&call.arguments) {
        Ok(args) => args,
        Err(detail) => {
            tracing::warn!(tool = %call.name, %detail, "tool arguments failed to decode");
            return FunctionResult::failed(ToolError::InvalidArguments(detail));
        }
    };

    if let Err(detail) = validate_arguments(&function.spec.parameters, &args) {
        tracing::warn!(tool = %call.name, %detail, "tool arguments rejected by schema");
        return FunctionResult::failed(ToolError::InvalidArguments(detail));
    }

    let handler = &function.handler;
    match catch_unwind(AssertUnwindSafe(|| handler(&args, context))) {
        Ok(result) => result,
        Err(panic) => {
            let detail = panic_message(panic);
            tracing::error!(tool = %call.name, %detail, "tool handler panicked");
            FunctionResult::failed(ToolError::HandlerFailure(format!(
                "handler panicked: {}",
                detail
            )))
        }
    }
}

/// Decodes the provider's raw argument string into a named-argument map.
/// An empty or whitespace-only string means "no arguments".
fn decode_arguments(raw: &str) -> Result<HashMap<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_type_name(&other))),
        Err(e) => Err(format!("arguments are not valid JSON: {}", e)),
    }
}

/// Checks decoded arguments against a JSON-Schema-like declaration:
/// every `required` field must be present, and every supplied field whose
/// schema declares a `type` must match it. Undeclared fields pass through.
fn validate_arguments(parameters: &Value, args: &HashMap<String, Value>) -> Result<(), String> {
    let Some(schema) = parameters.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !args.contains_key(field) {
                return Err(format!("missing required field '{}'", field));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(());
    };

    for (name, value) in args {
        let Some(declared) = properties
            .get(name)
            .and_then(|p| p.get("type"))
            .and_then(|t| t.as_str())
        else {
            continue;
        };

        let matches = match declared {
            "string" => value.is_string(),
            "number" => value.is_number(),
            "integer" => value.is_i64() || value.is_u64(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            "null" => value.is_null(),
            _ => true,
        };

        if !matches {
            return Err(format!(
                "field '{}' should be {}, got {}",
                name,
                declared,
                json_type_name(value)
            ));
        }
    }

    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_tool() -> AgentFunction {
        AgentFunction::new(
            "echo",
            "Echo the message back",
            json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" }
                },
                "required": ["message"]
            }),
            |args, _ctx| {
                let message = args.get("message").and_then(|v| v.as_str()).unwrap_or("");
                FunctionResult::ok(message)
            },
        )
    }

    fn call(name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest::new("call_1", name, arguments)
    }

    #[test]
    fn test_dispatch_success() {
        let mut tools = ToolSet::new();
        tools.register(echo_tool());

        let result = dispatch(&tools, &call("echo", r#"{"message": "hi"}"#), &ContextVariables::new());
        assert!(result.success);
        assert_eq!(result.output(), "hi");
    }

    #[test]
    fn test_dispatch_unknown_tool() {
        let tools = ToolSet::new();
        let result = dispatch(&tools, &call("nope", "{}"), &ContextVariables::new());
        assert!(!result.success);
        assert_eq!(result.error, Some(ToolError::UnknownTool("nope".to_string())));
    }

    #[test]
    fn test_dispatch_malformed_json() {
        let mut tools = ToolSet::new();
        tools.register(echo_tool());

        let result = dispatch(&tools, &call("echo", "{not json"), &ContextVariables::new());
        assert!(!result.success);
        assert!(matches!(result.error, Some(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn test_dispatch_missing_required_field() {
        let mut tools = ToolSet::new();
        tools.register(echo_tool());

        let result = dispatch(&tools, &call("echo", "{}"), &ContextVariables::new());
        assert!(!result.success);
        assert!(matches!(result.error, Some(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn test_dispatch_wrong_field_type() {
        let mut tools = ToolSet::new();
        tools.register(echo_tool());

        let result =
            dispatch(&tools, &call("echo", r#"{"message": 42}"#), &ContextVariables::new());
        assert!(!result.success);
        assert!(matches!(result.error, Some(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn test_dispatch_empty_arguments_ok() {
        let mut tools = ToolSet::new();
        tools.register(AgentFunction::new(
            "ping",
            "No arguments needed",
            json!({ "type": "object", "properties": {} }),
            |_args, _ctx| FunctionResult::ok("pong"),
        ));

        let result = dispatch(&tools, &call("ping", ""), &ContextVariables::new());
        assert!(result.success);
        assert_eq!(result.output(), "pong");
    }

    #[test]
    fn test_dispatch_contains_handler_panic() {
        let mut tools = ToolSet::new();
        tools.register(AgentFunction::new(
            "boom",
            "Always panics",
            json!({ "type": "object", "properties": {} }),
            |_args, _ctx| panic!("kaboom"),
        ));

        let result = dispatch(&tools, &call("boom", "{}"), &ContextVariables::new());
        assert!(!result.success);
        match result.error {
            Some(ToolError::HandlerFailure(detail)) => assert!(detail.contains("kaboom")),
            other => panic!("expected HandlerFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_handler_reads_context_snapshot() {
        let mut tools = ToolSet::new();
        tools.register(AgentFunction::new(
            "whoami",
            "Report the user from context",
            json!({ "type": "object", "properties": {} }),
            |_args, ctx| {
                FunctionResult::ok(ctx.get_str("name").unwrap_or("unknown").to_string())
            },
        ));

        let mut ctx = ContextVariables::new();
        ctx.insert("name", json!("Alice"));

        let result = dispatch(&tools, &call("whoami", "{}"), &ctx);
        assert_eq!(result.output(), "Alice");
    }

    #[test]
    fn test_failed_result_output_describes_error() {
        let result = FunctionResult::fail("refund service unavailable");
        assert_eq!(result.output(), "handler failure: refund service unavailable");
    }
}

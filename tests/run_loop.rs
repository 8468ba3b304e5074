//! Integration tests for the orchestration loop.
//!
//! All tests use `MockProvider` — no network calls are made.
//! Run with: `cargo test`

use serde_json::json;
use std::sync::Arc;
use swarmkit::llm::MockProvider;
use swarmkit::{
    Agent, AgentFunction, AssistantTurn, ContextVariables, FunctionResult, Instructions,
    Message, Role, RunEvent, RunOptions, Swarm, SwarmError, ToolCallRequest,
};
use tokio_util::sync::CancellationToken;

// ─────────────────────────────────────────────────────────────────────────────
// Test helpers
// ─────────────────────────────────────────────────────────────────────────────

fn number_params() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "num1": { "type": "number", "description": "First number" },
            "num2": { "type": "number", "description": "Second number" }
        },
        "required": ["num1", "num2"]
    })
}

fn calculate_sum() -> AgentFunction {
    AgentFunction::new(
        "calculateSum",
        "Calculate the sum of two numbers",
        number_params(),
        |args, _ctx| {
            let num1 = args.get("num1").and_then(|v| v.as_i64()).unwrap_or(0);
            let num2 = args.get("num2").and_then(|v| v.as_i64()).unwrap_or(0);
            FunctionResult::ok(format!("The sum of {} and {} is {}", num1, num2, num1 + num2))
        },
    )
}

fn calculate_product() -> AgentFunction {
    AgentFunction::new(
        "calculateProduct",
        "Calculate the product of two numbers",
        number_params(),
        |args, _ctx| {
            let num1 = args.get("num1").and_then(|v| v.as_i64()).unwrap_or(0);
            let num2 = args.get("num2").and_then(|v| v.as_i64()).unwrap_or(0);
            FunctionResult::ok(format!(
                "The product of {} and {} is {}",
                num1, num2, num1 * num2
            ))
        },
    )
}

fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCallRequest {
    ToolCallRequest::new(id, name, arguments)
}

fn tool_turn(calls: Vec<ToolCallRequest>) -> AssistantTurn {
    AssistantTurn::with_tool_calls("", calls)
}

/// A swarm with one mock-backed agent named "MathAgent".
fn math_swarm(turns: Vec<AssistantTurn>) -> (Swarm, Arc<MockProvider>) {
    let mock = Arc::new(MockProvider::new(turns));
    let mut swarm = Swarm::new(mock.clone());
    swarm
        .register_agent(
            Agent::new(
                "MathAgent",
                "gpt-4o",
                "You are a math assistant. When given two numbers, calculate both their sum and product.",
            )
            .function(calculate_sum())
            .function(calculate_product()),
        )
        .unwrap();
    (swarm, mock)
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: a turn without tool calls costs exactly one provider call
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_plain_reply_is_single_provider_call() {
    let (swarm, mock) = math_swarm(vec![AssistantTurn::text("Hello! How can I help?")]);

    let response = swarm
        .run(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("Hi!")],
            ContextVariables::new(),
            RunOptions::default().max_turns(5),
        )
        .await
        .unwrap();

    assert_eq!(mock.call_count(), 1);
    assert_eq!(response.final_answer(), Some("Hello! How can I help?"));
    assert_eq!(response.messages.len(), 2); // user + assistant
    assert!(response.tool_results.is_empty());
    assert_eq!(response.agent, "MathAgent");
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: the sum/product scenario — both tools run, turn limit truncates
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sum_and_product_single_turn() {
    let (swarm, mock) = math_swarm(vec![tool_turn(vec![
        tool_call("call_1", "calculateSum", r#"{"num1": 5, "num2": 3}"#),
        tool_call("call_2", "calculateProduct", r#"{"num1": 5, "num2": 3}"#),
    ])]);

    let response = swarm
        .run(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("Calculate the sum and product of 5 and 3")],
            ContextVariables::new(),
            RunOptions::default().max_turns(1),
        )
        .await
        .unwrap();

    // Exactly one provider call: the limit was reached after this turn.
    assert_eq!(mock.call_count(), 1);

    // Transcript ends in the two tool-result messages, no trailing summary.
    let last_two: Vec<&Message> = response.messages.iter().rev().take(2).collect();
    assert!(last_two.iter().all(|m| m.role == Role::Tool));
    assert_eq!(response.messages.last().unwrap().tool_call_id.as_deref(), Some("call_2"));

    assert_eq!(response.tool_results.len(), 2);
    assert!(response.tool_results.iter().all(|r| r.result.success));
    assert_eq!(response.tool_results[0].result.output(), "The sum of 5 and 3 is 8");
    assert_eq!(
        response.tool_results[1].result.output(),
        "The product of 5 and 3 is 15"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: tool-result messages keep provider request order under concurrency
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tool_results_keep_request_order() {
    let slow = AgentFunction::new(
        "slow",
        "Sleeps, then answers",
        json!({ "type": "object", "properties": {} }),
        |_args, _ctx| {
            std::thread::sleep(std::time::Duration::from_millis(150));
            FunctionResult::ok("slow done")
        },
    );
    let fast = AgentFunction::new(
        "fast",
        "Answers immediately",
        json!({ "type": "object", "properties": {} }),
        |_args, _ctx| FunctionResult::ok("fast done"),
    );

    let mock = Arc::new(MockProvider::new(vec![tool_turn(vec![
        tool_call("call_1", "slow", "{}"),
        tool_call("call_2", "fast", "{}"),
    ])]));
    let mut swarm = Swarm::new(mock.clone());
    swarm
        .register_agent(Agent::new("Agent", "gpt-4o", "test").function(slow).function(fast))
        .unwrap();

    let response = swarm
        .run(
            &CancellationToken::new(),
            "Agent",
            vec![Message::user("go")],
            ContextVariables::new(),
            RunOptions::default().max_turns(1),
        )
        .await
        .unwrap();

    // The fast tool finishes first, but effects land in request order.
    let tool_messages: Vec<&Message> =
        response.messages.iter().filter(|m| m.role == Role::Tool).collect();
    assert_eq!(tool_messages.len(), 2);
    assert_eq!(tool_messages[0].content, "slow done");
    assert_eq!(tool_messages[1].content, "fast done");
    assert_eq!(response.tool_results[0].tool_name, "slow");
    assert_eq!(response.tool_results[1].tool_name, "fast");
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: malformed arguments never abort the run
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_malformed_arguments_recoverable() {
    let (swarm, mock) = math_swarm(vec![
        tool_turn(vec![tool_call(
            "call_1",
            "calculateSum",
            r#"{"num1": "five", "num2": 3}"#,
        )]),
        AssistantTurn::text("Sorry, I passed a bad argument. Let me rephrase."),
    ]);

    let response = swarm
        .run(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("Add five and 3")],
            ContextVariables::new(),
            RunOptions::default().max_turns(2),
        )
        .await
        .unwrap();

    // The failure was folded into the transcript and a second turn happened.
    assert_eq!(mock.call_count(), 2);
    assert_eq!(response.tool_results.len(), 1);
    assert!(!response.tool_results[0].result.success);

    let tool_message = response.messages.iter().find(|m| m.role == Role::Tool).unwrap();
    assert!(tool_message.content.contains("invalid arguments"));
    assert!(response.final_answer().is_some());
}

#[tokio::test]
async fn test_unknown_tool_recoverable() {
    let (swarm, mock) = math_swarm(vec![
        tool_turn(vec![tool_call("call_1", "calculateQuotient", "{}")]),
        AssistantTurn::text("That tool does not exist; using what I have."),
    ]);

    let response = swarm
        .run(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("Divide 6 by 2")],
            ContextVariables::new(),
            RunOptions::default().max_turns(3),
        )
        .await
        .unwrap();

    assert_eq!(mock.call_count(), 2);
    let tool_message = response.messages.iter().find(|m| m.role == Role::Tool).unwrap();
    assert!(tool_message.content.contains("unknown tool"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: handoff — next turn runs under the successor's instructions
// ─────────────────────────────────────────────────────────────────────────────

fn transfer_function(name: &str, target: &'static str) -> AgentFunction {
    AgentFunction::new(
        name,
        format!("Transfer the conversation to {}.", target),
        json!({ "type": "object", "properties": {} }),
        move |_args, _ctx| {
            FunctionResult::handoff(target, format!("Transferring to {}.", target))
        },
    )
}

#[tokio::test]
async fn test_handoff_switches_instructions_without_resetting_transcript() {
    let mock = Arc::new(MockProvider::new(vec![
        tool_turn(vec![tool_call("call_1", "transferToSpanishAgent", "{}")]),
        AssistantTurn::text("¡Hola! ¿Cómo estás?"),
    ]));
    let mut swarm = Swarm::new(mock.clone());
    swarm
        .register_agent(
            Agent::new("EnglishAgent", "gpt-4o", "You only speak English.")
                .function(transfer_function("transferToSpanishAgent", "SpanishAgent")),
        )
        .unwrap();
    swarm
        .register_agent(Agent::new("SpanishAgent", "gpt-4o", "You only speak Spanish."))
        .unwrap();

    let response = swarm
        .run(
            &CancellationToken::new(),
            "EnglishAgent",
            vec![Message::user("Hola. ¿Cómo estás?")],
            ContextVariables::new(),
            RunOptions::default().max_turns(2),
        )
        .await
        .unwrap();

    assert_eq!(response.agent, "SpanishAgent");
    assert_eq!(mock.call(0).unwrap().instructions, "You only speak English.");
    assert_eq!(mock.call(1).unwrap().instructions, "You only speak Spanish.");

    // The successor saw the full prior history: user message, assistant
    // tool-call message, and the tool result.
    let second_call = mock.call(1).unwrap();
    assert_eq!(second_call.messages.len(), 3);
    assert_eq!(second_call.messages[0].role, Role::User);
    assert_eq!(response.final_answer(), Some("¡Hola! ¿Cómo estás?"));
}

#[tokio::test]
async fn test_last_handoff_in_call_order_wins() {
    let mock = Arc::new(MockProvider::new(vec![
        tool_turn(vec![
            tool_call("call_1", "toSales", "{}"),
            tool_call("call_2", "toRefunds", "{}"),
        ]),
        AssistantTurn::text("Refunds here."),
    ]));
    let mut swarm = Swarm::new(mock.clone());
    swarm
        .register_agent(
            Agent::new("Triage", "gpt-4o", "Route the user.")
                .function(transfer_function("toSales", "Sales"))
                .function(transfer_function("toRefunds", "Refunds")),
        )
        .unwrap();
    swarm
        .register_agent(Agent::new("Sales", "gpt-4o", "Sell bees."))
        .unwrap();
    swarm
        .register_agent(Agent::new("Refunds", "gpt-4o", "Handle refunds."))
        .unwrap();

    let response = swarm
        .run(
            &CancellationToken::new(),
            "Triage",
            vec![Message::user("I want a refund")],
            ContextVariables::new(),
            RunOptions::default().max_turns(2),
        )
        .await
        .unwrap();

    assert_eq!(response.agent, "Refunds");
    assert_eq!(mock.call(1).unwrap().instructions, "Handle refunds.");
}

#[tokio::test]
async fn test_handoff_to_unregistered_agent_aborts() {
    let mock = Arc::new(MockProvider::new(vec![tool_turn(vec![tool_call(
        "call_1",
        "toNowhere",
        "{}",
    )])]));
    let mut swarm = Swarm::new(mock.clone());
    swarm
        .register_agent(
            Agent::new("Triage", "gpt-4o", "Route the user.")
                .function(transfer_function("toNowhere", "GhostAgent")),
        )
        .unwrap();

    let aborted = swarm
        .run(
            &CancellationToken::new(),
            "Triage",
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default().max_turns(3),
        )
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, SwarmError::UnknownAgent(ref name) if name == "GhostAgent"));
    // Partial results are never discarded: the dispatched call is recorded.
    assert_eq!(aborted.partial.tool_results.len(), 1);
    assert!(aborted.partial.messages.iter().any(|m| m.role == Role::Tool));
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 6: context variables — snapshot in, merge out, dispatch order
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_context_merge_drives_next_turn_instructions() {
    let set_name = |name: &'static str| {
        AgentFunction::new(
            format!("setName{}", name),
            "Record the user's name",
            json!({ "type": "object", "properties": {} }),
            move |_args, _ctx| {
                let updates: ContextVariables =
                    [("name".to_string(), json!(name))].into_iter().collect();
                FunctionResult::ok("recorded").with_context(updates)
            },
        )
    };

    let mock = Arc::new(MockProvider::new(vec![
        tool_turn(vec![
            tool_call("call_1", "setNameAlice", "{}"),
            tool_call("call_2", "setNameBob", "{}"),
        ]),
        AssistantTurn::text("Hi Bob!"),
    ]));
    let mut swarm = Swarm::new(mock.clone());
    swarm
        .register_agent(
            Agent::new(
                "Greeter",
                "gpt-4o",
                Instructions::computed(|ctx| {
                    format!("Greet the user by name ({}).", ctx.get_str("name").unwrap_or("User"))
                }),
            )
            .function(set_name("Alice"))
            .function(set_name("Bob")),
        )
        .unwrap();

    swarm
        .run(
            &CancellationToken::new(),
            "Greeter",
            vec![Message::user("Hi!")],
            ContextVariables::new(),
            RunOptions::default().max_turns(2),
        )
        .await
        .unwrap();

    assert_eq!(mock.call(0).unwrap().instructions, "Greet the user by name (User).");
    // Both merges applied in dispatch order — the later call won the key.
    assert_eq!(mock.call(1).unwrap().instructions, "Greet the user by name (Bob).");
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 7: execute_tools=false surfaces calls without running them
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_execute_tools_disabled() {
    let (swarm, mock) = math_swarm(vec![tool_turn(vec![tool_call(
        "call_1",
        "calculateSum",
        r#"{"num1": 5, "num2": 3}"#,
    )])]);

    let response = swarm
        .run(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("Add 5 and 3")],
            ContextVariables::new(),
            RunOptions::default().max_turns(5).execute_tools(false),
        )
        .await
        .unwrap();

    assert_eq!(mock.call_count(), 1);
    assert!(response.tool_results.is_empty());
    let last = response.last_message().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.tool_calls.len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 8: include_tool_messages=false filters the returned transcript only
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_intermediate_messages_filtered_but_effects_applied() {
    let (swarm, mock) = math_swarm(vec![
        tool_turn(vec![tool_call("call_1", "calculateSum", r#"{"num1": 5, "num2": 3}"#)]),
        AssistantTurn::text("The sum is 8."),
    ]);

    let response = swarm
        .run(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("Add 5 and 3")],
            ContextVariables::new(),
            RunOptions::default().max_turns(2).include_tool_messages(false),
        )
        .await
        .unwrap();

    // Dispatch happened regardless of the filter.
    assert_eq!(mock.call_count(), 2);
    assert_eq!(response.tool_results.len(), 1);
    assert!(response.tool_results[0].result.success);

    // Returned transcript: user message and final answer only.
    assert!(response.messages.iter().all(|m| m.role != Role::Tool));
    assert!(response.messages.iter().all(|m| m.tool_calls.is_empty()));
    assert_eq!(response.final_answer(), Some("The sum is 8."));
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 9: turn limit is a hard cap on provider calls
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_max_turns_bounds_provider_calls() {
    // Every turn requests another tool call; the loop must stop at the cap.
    let turns = (0..10)
        .map(|i| {
            tool_turn(vec![tool_call(
                &format!("call_{}", i),
                "calculateSum",
                r#"{"num1": 1, "num2": 1}"#,
            )])
        })
        .collect();
    let (swarm, mock) = math_swarm(turns);

    let response = swarm
        .run(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("loop forever")],
            ContextVariables::new(),
            RunOptions::default().max_turns(3),
        )
        .await
        .unwrap();

    assert_eq!(mock.call_count(), 3);
    assert_eq!(response.tool_results.len(), 3);
    // Soft truncation: the transcript ends in a tool result, not a summary.
    assert_eq!(response.last_message().unwrap().role, Role::Tool);
}

#[tokio::test]
async fn test_zero_max_turns_is_config_error() {
    let (swarm, mock) = math_swarm(vec![]);

    let aborted = swarm
        .run(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default().max_turns(0),
        )
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, SwarmError::Config(_)));
    assert_eq!(mock.call_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 10: provider failure aborts but keeps the partial transcript
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_provider_error_returns_partial() {
    let (swarm, mock) = math_swarm(vec![tool_turn(vec![tool_call(
        "call_1",
        "calculateSum",
        r#"{"num1": 5, "num2": 3}"#,
    )])]);
    // Second turn finds the mock script exhausted — a provider error.

    let aborted = swarm
        .run(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("Add 5 and 3")],
            ContextVariables::new(),
            RunOptions::default().max_turns(5),
        )
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, SwarmError::Provider(_)));
    assert_eq!(mock.call_count(), 2);
    // Everything up to the failure survived.
    assert_eq!(aborted.partial.tool_results.len(), 1);
    assert_eq!(aborted.partial.messages.last().unwrap().role, Role::Tool);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 11: cancellation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cancelled_before_start_makes_no_provider_call() {
    let (swarm, mock) = math_swarm(vec![AssistantTurn::text("never sent")]);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let aborted = swarm
        .run(
            &cancel,
            "MathAgent",
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, SwarmError::Cancelled));
    assert_eq!(mock.call_count(), 0);
    // The initial message still comes back in the partial response.
    assert_eq!(aborted.partial.messages.len(), 1);
}

#[tokio::test]
async fn test_cancelled_mid_turn_finishes_inflight_calls() {
    let cancel = CancellationToken::new();
    let cancel_inside = cancel.clone();

    // The first handler cancels the run while it is executing; the loop must
    // let it finish, apply its effects, and then stop before the next turn.
    let canceller = AgentFunction::new(
        "cancelRun",
        "Cancels the surrounding run",
        json!({ "type": "object", "properties": {} }),
        move |_args, _ctx| {
            cancel_inside.cancel();
            FunctionResult::ok("cancelled from inside")
        },
    );

    let mock = Arc::new(MockProvider::new(vec![
        tool_turn(vec![tool_call("call_1", "cancelRun", "{}")]),
        AssistantTurn::text("should never be requested"),
    ]));
    let mut swarm = Swarm::new(mock.clone());
    swarm
        .register_agent(Agent::new("Agent", "gpt-4o", "test").function(canceller))
        .unwrap();

    let aborted = swarm
        .run(
            &cancel,
            "Agent",
            vec![Message::user("go")],
            ContextVariables::new(),
            RunOptions::default().max_turns(5),
        )
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, SwarmError::Cancelled));
    assert_eq!(mock.call_count(), 1);
    assert_eq!(aborted.partial.tool_results.len(), 1);
    assert_eq!(aborted.partial.tool_results[0].result.output(), "cancelled from inside");
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 12: streaming delivers ordered fragments with the same end state
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_streaming_fragments_concatenate_to_final_content() {
    let content = "Streaming keeps fragments in strict generation order.";
    let (swarm, _mock) = math_swarm(vec![AssistantTurn::text(content)]);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let response = swarm
        .run_streaming(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("Hi!")],
            ContextVariables::new(),
            RunOptions::default().max_turns(5),
            tx,
        )
        .await
        .unwrap();

    let mut streamed = String::new();
    while let Ok(event) = rx.try_recv() {
        if let RunEvent::Token(fragment) = event {
            streamed.push_str(&fragment);
        }
    }

    assert_eq!(streamed, content);
    assert_eq!(response.final_answer(), Some(content));
}

#[tokio::test]
async fn test_streaming_run_emits_tool_and_handoff_events() {
    let mock = Arc::new(MockProvider::new(vec![
        tool_turn(vec![tool_call("call_1", "toSales", "{}")]),
        AssistantTurn::text("Bees!"),
    ]));
    let mut swarm = Swarm::new(mock.clone());
    swarm
        .register_agent(
            Agent::new("Triage", "gpt-4o", "Route.").function(transfer_function("toSales", "Sales")),
        )
        .unwrap();
    swarm.register_agent(Agent::new("Sales", "gpt-4o", "Sell.")).unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let response = swarm
        .run_streaming(
            &CancellationToken::new(),
            "Triage",
            vec![Message::user("bees?")],
            ContextVariables::new(),
            RunOptions::default().max_turns(2),
            tx,
        )
        .await
        .unwrap();

    assert_eq!(response.agent, "Sales");

    let mut saw_tool_start = false;
    let mut saw_tool_finish = false;
    let mut saw_handoff = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            RunEvent::ToolCallStarted { ref name, .. } if name == "toSales" => {
                saw_tool_start = true;
            }
            RunEvent::ToolCallFinished { ref name, success, .. } if name == "toSales" => {
                saw_tool_finish = true;
                assert!(success);
            }
            RunEvent::Handoff { ref from, ref to } => {
                saw_handoff = true;
                assert_eq!(from, "Triage");
                assert_eq!(to, "Sales");
            }
            _ => {}
        }
    }
    assert!(saw_tool_start && saw_tool_finish && saw_handoff);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 13: model override and per-agent provider selection
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_model_override_applies_to_every_turn() {
    let (swarm, mock) = math_swarm(vec![AssistantTurn::text("ok")]);

    swarm
        .run(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default().model_override("gpt-4o-mini"),
        )
        .await
        .unwrap();

    assert_eq!(mock.call(0).unwrap().model, "gpt-4o-mini");
}

#[tokio::test]
async fn test_agent_selects_registered_provider() {
    let default_mock = Arc::new(MockProvider::new(vec![]));
    let alt_mock = Arc::new(MockProvider::new(vec![AssistantTurn::text("from alt")]));

    let mut swarm = Swarm::new(default_mock.clone());
    swarm.register_provider("alt", alt_mock.clone());
    swarm
        .register_agent(Agent::new("Agent", "some-model", "test").with_provider("alt"))
        .unwrap();

    let response = swarm
        .run(
            &CancellationToken::new(),
            "Agent",
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(default_mock.call_count(), 0);
    assert_eq!(alt_mock.call_count(), 1);
    assert_eq!(response.final_answer(), Some("from alt"));
}

#[tokio::test]
async fn test_unknown_provider_key_is_config_error() {
    let mut swarm = Swarm::new(Arc::new(MockProvider::new(vec![])));
    swarm
        .register_agent(Agent::new("Agent", "m", "test").with_provider("missing"))
        .unwrap();

    let aborted = swarm
        .run(
            &CancellationToken::new(),
            "Agent",
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, SwarmError::Config(_)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 14: unregistered initial agent
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unregistered_initial_agent_aborts() {
    let swarm = Swarm::new(Arc::new(MockProvider::new(vec![])));

    let aborted = swarm
        .run(
            &CancellationToken::new(),
            "Nobody",
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, SwarmError::UnknownAgent(_)));
    assert_eq!(aborted.partial.messages.len(), 1);
}

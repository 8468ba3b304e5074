//! # Tool Results Example
//!
//! Runs a single turn (`max_turns = 1`) so the response ends in raw
//! tool-result messages, then inspects the recorded invocations instead of a
//! model-written summary.
//!
//! # Usage
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example tool_results
//! ```

use serde_json::json;
use std::sync::Arc;
use swarmkit::llm::OpenAiCompatible;
use swarmkit::{Agent, AgentFunction, ContextVariables, FunctionResult, Message, RunOptions, Swarm};
use tokio_util::sync::CancellationToken;

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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let calculate_sum = AgentFunction::new(
        "calculateSum",
        "Calculate the sum of two numbers",
        number_params(),
        |args, _ctx| {
            let a = args.get("num1").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let b = args.get("num2").and_then(|v| v.as_f64()).unwrap_or(0.0);
            FunctionResult::ok(format!("The sum of {} and {} is {}", a, b, a + b))
        },
    );
    let calculate_product = AgentFunction::new(
        "calculateProduct",
        "Calculate the product of two numbers",
        number_params(),
        |args, _ctx| {
            let a = args.get("num1").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let b = args.get("num2").and_then(|v| v.as_f64()).unwrap_or(0.0);
            FunctionResult::ok(format!("The product of {} and {} is {}", a, b, a * b))
        },
    );

    let mut swarm = Swarm::new(Arc::new(OpenAiCompatible::new()));
    swarm.register_agent(
        Agent::new(
            "MathAgent",
            "gpt-4o",
            "You are a math assistant. When given two numbers, calculate both \
             their sum and product using the tools.",
        )
        .function(calculate_sum)
        .function(calculate_product),
    )?;

    let response = swarm
        .run(
            &CancellationToken::new(),
            "MathAgent",
            vec![Message::user("Calculate the sum and product of 5 and 3.")],
            ContextVariables::new(),
            // One turn: the tools run, no follow-up summary turn happens.
            RunOptions::default().max_turns(1),
        )
        .await?;

    println!("Tool invocations:");
    for record in &response.tool_results {
        println!(
            "  {}({}) -> success={} output={:?}",
            record.tool_name,
            record.arguments,
            record.result.success,
            record.result.output()
        );
    }
    Ok(())
}

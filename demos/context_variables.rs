//! # Context Variables Example
//!
//! Instructions computed from context variables, re-evaluated every turn, and
//! a tool that writes updates back into the context.
//!
//! # Usage
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example context_variables
//! ```

use serde_json::json;
use std::sync::Arc;
use swarmkit::llm::OpenAiCompatible;
use swarmkit::{
    Agent, AgentFunction, ContextVariables, FunctionResult, Instructions, Message, RunOptions,
    Swarm,
};
use tokio_util::sync::CancellationToken;

fn record_name() -> AgentFunction {
    AgentFunction::new(
        "recordName",
        "Record the user's name once they introduce themselves.",
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "The user's name" }
            },
            "required": ["name"]
        }),
        |args, _ctx| {
            let name = args.get("name").and_then(|v| v.as_str()).unwrap_or("User");
            let updates: ContextVariables =
                [("user_name".to_string(), json!(name))].into_iter().collect();
            FunctionResult::ok(format!("Recorded name: {}", name)).with_context(updates)
        },
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut swarm = Swarm::new(Arc::new(OpenAiCompatible::new()));
    swarm.register_agent(
        Agent::new(
            "Greeter",
            "gpt-4o",
            // Re-evaluated before every provider call, so the greeting changes
            // as soon as recordName merges the user's name into the context.
            Instructions::computed(|ctx| {
                let name = ctx.get_str("user_name").unwrap_or("there");
                format!("You are a friendly assistant. Address the user as {}.", name)
            }),
        )
        .function(record_name()),
    )?;

    let mut context = ContextVariables::new();
    context.insert("session_id", json!("demo-001"));

    let response = swarm
        .run(
            &CancellationToken::new(),
            "Greeter",
            vec![Message::user("Hi, my name is James!")],
            context,
            RunOptions::default().max_turns(5),
        )
        .await?;

    println!("{}: {}", response.agent, response.final_answer().unwrap_or(""));
    Ok(())
}

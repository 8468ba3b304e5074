//! # Triage / Handoff Example
//!
//! A triage agent routes the conversation to a sales or refunds agent via
//! handoff tools. Agents reference each other by name only, so the mutually
//! referencing graph needs no forward declarations: build all three, register
//! them, run.
//!
//! # Usage
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example triage
//! ```

use serde_json::json;
use std::sync::Arc;
use swarmkit::llm::OpenAiCompatible;
use swarmkit::{Agent, AgentFunction, ContextVariables, FunctionResult, Message, RunOptions, Swarm};
use tokio_util::sync::CancellationToken;

fn transfer(name: &str, target: &'static str, description: &str) -> AgentFunction {
    AgentFunction::new(
        name,
        description,
        json!({ "type": "object", "properties": {} }),
        move |_args, _ctx| {
            FunctionResult::handoff(target, format!("Transferring to {}.", target))
        },
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let triage = Agent::new(
        "TriageAgent",
        "gpt-4o",
        "Determine which agent is best suited to handle the user's request and \
         transfer the conversation to that agent.",
    )
    .function(transfer(
        "transferToSales",
        "SalesAgent",
        "Transfer the conversation to the sales agent.",
    ))
    .function(transfer(
        "transferToRefunds",
        "RefundsAgent",
        "Transfer the conversation to the refunds agent.",
    ));

    let sales = Agent::new(
        "SalesAgent",
        "gpt-4o",
        "Be super enthusiastic about selling bees.",
    )
    .function(transfer(
        "transferBackToTriage",
        "TriageAgent",
        "Transfer back to triage if the request is not about sales.",
    ));

    let refunds = Agent::new(
        "RefundsAgent",
        "gpt-4o",
        "Help the user with refunds. Ask for the item id before processing.",
    )
    .function(transfer(
        "transferBackToTriage",
        "TriageAgent",
        "Transfer back to triage if the request is not about refunds.",
    ));

    let mut swarm = Swarm::new(Arc::new(OpenAiCompatible::new()));
    swarm.register_agent(triage)?;
    swarm.register_agent(sales)?;
    swarm.register_agent(refunds)?;

    let response = swarm
        .run(
            &CancellationToken::new(),
            "TriageAgent",
            vec![Message::user("I want a refund for my order.")],
            ContextVariables::new(),
            RunOptions::default().max_turns(10),
        )
        .await?;

    println!("Handled by: {}", response.agent);
    println!("{}", response.final_answer().unwrap_or(""));
    Ok(())
}

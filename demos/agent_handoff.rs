//! # Agent Handoff Example
//!
//! An English-only agent transfers a Spanish-speaking user to a Spanish-only
//! agent. The handoff names the successor; the transcript carries over
//! unchanged, so the Spanish agent sees the full prior history.
//!
//! # Usage
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example agent_handoff
//! ```

use serde_json::json;
use std::sync::Arc;
use swarmkit::llm::OpenAiCompatible;
use swarmkit::{Agent, AgentFunction, ContextVariables, FunctionResult, Message, RunOptions, Swarm};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let english_agent = Agent::new(
        "EnglishAgent",
        "gpt-4o",
        "You only speak English.",
    )
    .function(AgentFunction::new(
        "transferToSpanishAgent",
        "Transfer Spanish-speaking users immediately.",
        json!({ "type": "object", "properties": {} }),
        |_args, _ctx| {
            FunctionResult::handoff("SpanishAgent", "Transferring to Spanish Agent.")
        },
    ));

    let spanish_agent = Agent::new(
        "SpanishAgent",
        "gpt-4o",
        "You only speak Spanish.",
    );

    let mut swarm = Swarm::new(Arc::new(OpenAiCompatible::new()));
    swarm.register_agent(english_agent)?;
    swarm.register_agent(spanish_agent)?;

    let response = swarm
        .run(
            &CancellationToken::new(),
            "EnglishAgent",
            vec![Message::user("Hola. ¿Cómo estás?")],
            ContextVariables::new(),
            RunOptions::default().max_turns(5),
        )
        .await?;

    println!("{}: {}", response.agent, response.final_answer().unwrap_or(""));
    Ok(())
}

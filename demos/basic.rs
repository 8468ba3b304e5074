//! # Basic Agent Example
//!
//! A single agent with static instructions and no tools: one user message in,
//! one assistant reply out.
//!
//! # Usage
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example basic
//! ```

use std::sync::Arc;
use swarmkit::llm::OpenAiCompatible;
use swarmkit::{Agent, ContextVariables, Message, RunOptions, Swarm};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut swarm = Swarm::new(Arc::new(OpenAiCompatible::new()));
    swarm.register_agent(Agent::new(
        "Agent",
        "gpt-4o",
        "You are a helpful agent.",
    ))?;

    let response = swarm
        .run(
            &CancellationToken::new(),
            "Agent",
            vec![Message::user("Hi!")],
            ContextVariables::new(),
            RunOptions::default().max_turns(5),
        )
        .await?;

    println!("{}: {}", response.agent, response.final_answer().unwrap_or(""));
    Ok(())
}

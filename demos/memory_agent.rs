//! # Memory Agent Example
//!
//! An agent that remembers facts across runs: tool handlers share a
//! `MemoryStore`, which is saved to disk after the run and restored on the
//! next start.
//!
//! # Usage
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example memory_agent
//! ```

use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use swarmkit::llm::OpenAiCompatible;
use swarmkit::{
    Agent, AgentFunction, ContextVariables, FunctionResult, MemoryEntry, MemoryStore, Message,
    RunOptions, Swarm,
};
use tokio_util::sync::CancellationToken;

const MEMORY_FILE: &str = "memory.json";

fn remember_fact(store: Arc<MemoryStore>) -> AgentFunction {
    AgentFunction::new(
        "rememberFact",
        "Store an important fact the user shared, with an importance from 0 to 1.",
        json!({
            "type": "object",
            "properties": {
                "fact":       { "type": "string", "description": "The fact to remember" },
                "importance": { "type": "number", "description": "How important, 0 to 1" }
            },
            "required": ["fact"]
        }),
        move |args, ctx| {
            let fact = args.get("fact").and_then(|v| v.as_str()).unwrap_or("");
            let importance = args.get("importance").and_then(|v| v.as_f64()).unwrap_or(0.5);
            store.add(
                MemoryEntry::new(fact, "fact")
                    .with_importance(importance)
                    .with_context(ctx.clone()),
            );
            FunctionResult::ok(format!("Remembered: {}", fact))
        },
    )
}

fn recall_facts(store: Arc<MemoryStore>) -> AgentFunction {
    AgentFunction::new(
        "recallFacts",
        "Recall the most important facts stored about the user.",
        json!({
            "type": "object",
            "properties": {
                "limit": { "type": "integer", "description": "Maximum facts to return" }
            }
        }),
        move |args, _ctx| {
            let limit = args.get("limit").and_then(|v| v.as_u64()).unwrap_or(5) as usize;
            let facts: Vec<String> =
                store.most_important(limit).into_iter().map(|e| e.content).collect();
            if facts.is_empty() {
                FunctionResult::ok("No facts stored yet.")
            } else {
                FunctionResult::ok(facts.join("; "))
            }
        },
    )
}

fn load_store(path: &Path) -> anyhow::Result<MemoryStore> {
    if path.exists() {
        let data = std::fs::read_to_string(path)?;
        Ok(MemoryStore::deserialize(&data)?)
    } else {
        Ok(MemoryStore::new())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = Path::new(MEMORY_FILE);
    let store = Arc::new(load_store(path)?);
    println!("Loaded {} stored memories.", store.len());

    let mut swarm = Swarm::new(Arc::new(OpenAiCompatible::new()));
    swarm.register_agent(
        Agent::new(
            "MemoryAgent",
            "gpt-4o",
            "You are an assistant with long-term memory. Remember facts the user \
             shares, and recall stored facts before answering questions about them.",
        )
        .function(remember_fact(Arc::clone(&store)))
        .function(recall_facts(Arc::clone(&store))),
    )?;

    let response = swarm
        .run(
            &CancellationToken::new(),
            "MemoryAgent",
            vec![Message::user(
                "My favorite color is blue and I'm allergic to peanuts. \
                 What do you know about me so far?",
            )],
            ContextVariables::new(),
            RunOptions::default().max_turns(10),
        )
        .await?;

    println!("{}: {}", response.agent, response.final_answer().unwrap_or(""));

    std::fs::write(path, store.serialize()?)?;
    println!("Saved {} memories to {}.", store.len(), MEMORY_FILE);
    Ok(())
}

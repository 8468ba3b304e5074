//! # Function Call Example
//!
//! One agent with a weather tool. The model requests a tool call, the loop
//! executes it, and the next turn folds the result into a natural answer.
//!
//! # Usage
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example function_call
//! ```

use serde_json::json;
use std::sync::Arc;
use swarmkit::llm::OpenAiCompatible;
use swarmkit::{Agent, AgentFunction, ContextVariables, FunctionResult, Message, RunOptions, Swarm};
use tokio_util::sync::CancellationToken;

fn get_weather() -> AgentFunction {
    AgentFunction::new(
        "getWeather",
        "Get the current weather in a given location. \
         Always use this tool when the user asks about weather.",
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city to get weather for, e.g. 'London, UK'"
                }
            },
            "required": ["location"]
        }),
        |args, _ctx| {
            let location = args.get("location").and_then(|v| v.as_str()).unwrap_or("unknown");
            // Mock weather response. In production, call a weather API here.
            FunctionResult::ok(format!("The current temperature in {} is 18°C, partly cloudy.", location))
        },
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut swarm = Swarm::new(Arc::new(OpenAiCompatible::new()));
    swarm.register_agent(
        Agent::new(
            "WeatherAgent",
            "gpt-4o",
            "You are a weather assistant. Never guess the weather, always use the tool.",
        )
        .function(get_weather()),
    )?;

    let response = swarm
        .run(
            &CancellationToken::new(),
            "WeatherAgent",
            vec![Message::user("What's the weather in London?")],
            ContextVariables::new(),
            RunOptions::default().max_turns(5),
        )
        .await?;

    for record in &response.tool_results {
        println!("[tool] {} -> {}", record.tool_name, record.result.output());
    }
    println!("\n{}: {}", response.agent, response.final_answer().unwrap_or(""));
    Ok(())
}

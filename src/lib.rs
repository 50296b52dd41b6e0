//! Arche — tool-using agents, task forces and bounded memory.
//!
//! An [`Agent`](agent::Agent) executes one task with a language model,
//! optionally planning and running tool calls concurrently before
//! synthesizing an answer. A [`TaskForce`](taskforce::TaskForce) delegates
//! sub-tasks across several agents and consolidates their work. A
//! [`Memory`](memory::Memory) keeps a bounded transcript and folds older
//! turns into summaries in the background.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use arche::prelude::*;
//!
//! // Any `ModelClient` works here, e.g. `OpenAiCompatibleClient::from_config`
//! // with the `openai-compatible` feature.
//! # async fn example(client: Arc<dyn ModelClient>) -> arche::error::Result<()> {
//! let config = ArcheConfig::load(None)?;
//!
//! let gcd = ToolDescriptor::builder("gcd", "Greatest common divisor of two integers")
//!     .param(ParameterSpec::new("a").with_type_alias("int"))
//!     .param(ParameterSpec::new("b").with_type_alias("int"))
//!     .build()?;
//! let tool = FunctionTool::from_fn(gcd, |args| {
//!     let (mut a, mut b) = (args.get_i64("a")?, args.get_i64("b")?);
//!     while b != 0 {
//!         (a, b) = (b, a % b);
//!     }
//!     Ok(serde_json::json!(a.abs()))
//! });
//!
//! let mut agent = Agent::new("Calculator", client)
//!     .with_config(&config)
//!     .with_tool(Arc::new(tool))?;
//! println!("{}", agent.run_task("What is the gcd of 48 and 12?").await);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod memory;
pub mod plan;
pub mod prelude;
pub mod provider;
pub mod taskforce;
pub mod tools;
pub mod types;
pub mod util;

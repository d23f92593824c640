//! Gangway runtime — chat orchestration over tool-server connections.
//!
//! This crate drives one chat request end to end: an external decision
//! function (an LLM behind the [`Decider`] trait) chooses between a direct
//! answer and a batch of tool calls; requested calls are executed in order
//! through the connection core, and the collected results are folded into
//! a second decision call that produces the final answer.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{ChatService, GeminiDecider};
//!
//! # async fn example(registry: std::sync::Arc<mcp::Registry>) -> runtime::Result<()> {
//! let decider = GeminiDecider::builder("AIza...", "gemini-pro").build();
//! let service = ChatService::new(registry, decider);
//!
//! let outcome = service.chat("acme-tools", "what's the weather?", &[]).await?;
//! println!("{}", outcome.answer);
//! for name in &outcome.tools_used {
//!     println!("used tool: {name}");
//! }
//! # Ok(())
//! # }
//! ```

mod chat;
mod decider;
mod error;

pub use chat::{ChatOutcome, ChatService};
pub use decider::{
    DecideRequest, Decider, Decision, GeminiDecider, GeminiDeciderBuilder, Message, Role,
    ToolCallRequest, ToolRecord,
};
pub use error::{Error, Result};

//! Decision-function abstraction.
//!
//! The decision function maps a user query and the available tool catalog
//! to either a direct answer or a set of tool invocations. It is an
//! external collaborator behind a trait, so the chat loop can run against
//! any provider (or a scripted stand-in under test).

mod gemini;

pub use gemini::{GeminiDecider, GeminiDeciderBuilder};

use crate::Result;
use mcp::Tool;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// One tool invocation requested by the decision function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Name of the catalog tool to invoke.
    pub tool_name: String,
    /// Arguments as JSON.
    pub tool_args: Value,
    /// The decider's stated reason for the call, carried through to the
    /// audit trail.
    pub reasoning: String,
}

/// Outcome of one decision call.
#[derive(Debug, Clone)]
pub enum Decision {
    /// No tools needed; answer the user directly.
    Answer(String),
    /// Invoke these tools, in order, before answering.
    ToolCalls(Vec<ToolCallRequest>),
}

/// Record of one executed tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecord {
    pub tool_name: String,
    /// Opaque result payload; null when the call failed.
    pub result: Value,
    pub reasoning: String,
    /// Present when execution failed; sibling calls still ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolRecord {
    pub fn success(tool_name: impl Into<String>, result: Value, reasoning: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            result,
            reasoning: reasoning.into(),
            error: None,
        }
    }

    pub fn failure(
        tool_name: impl Into<String>,
        reasoning: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            result: Value::Null,
            reasoning: reasoning.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything a decision call sees.
///
/// `prior_results` is `None` on the first call of a chat request and holds
/// every collected tool record on the synthesis call.
#[derive(Debug, Clone)]
pub struct DecideRequest<'a> {
    pub query: &'a str,
    pub tools: &'a [Tool],
    pub history: &'a [Message],
    pub prior_results: Option<&'a [ToolRecord]>,
}

/// Trait for decision-function providers.
pub trait Decider: Send + Sync {
    fn decide(&self, request: DecideRequest<'_>) -> impl Future<Output = Result<Decision>> + Send;
}

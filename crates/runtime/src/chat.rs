//! Tool-orchestration chat loop.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::Result;
use crate::decider::{DecideRequest, Decider, Decision, Message, ToolCallRequest, ToolRecord};
use mcp::{CallToolParams, CallToolResult, Connection, Registry};

/// Final outcome of one chat request: the answer plus an audit trail of
/// every tool invoked on its behalf.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub answer: String,
    pub tools_used: Vec<String>,
    pub tool_results: Vec<ToolRecord>,
}

/// Drives one chat request end to end: look up the connection, ask the
/// decision function, execute any requested tools through the connection,
/// and fold the results into a final answer.
///
/// Holds no per-request state; any number of chats may run concurrently
/// against any mix of connections.
pub struct ChatService<D> {
    registry: Arc<Registry>,
    decider: D,
}

impl<D: Decider> ChatService<D> {
    pub fn new(registry: Arc<Registry>, decider: D) -> Self {
        Self { registry, decider }
    }

    pub async fn chat(
        &self,
        identity: &str,
        query: &str,
        history: &[Message],
    ) -> Result<ChatOutcome> {
        let connection = self
            .registry
            .lookup(identity)
            .ok_or_else(|| mcp::Error::ConnectionNotFound(identity.to_string()))?;
        if !connection.is_ready() {
            return Err(mcp::Error::SessionNotReady(identity.to_string()).into());
        }

        let tools = connection.tools();
        let decision = self
            .decider
            .decide(DecideRequest {
                query,
                tools: &tools,
                history,
                prior_results: None,
            })
            .await?;

        let calls = match decision {
            Decision::Answer(answer) => {
                return Ok(ChatOutcome {
                    answer,
                    tools_used: Vec::new(),
                    tool_results: Vec::new(),
                });
            }
            Decision::ToolCalls(calls) => calls,
        };

        // Sequential on purpose: a later call may depend on an earlier
        // one's side effects. A failed call becomes an errored record and
        // the remaining calls still run.
        let mut records = Vec::with_capacity(calls.len());
        for call in calls {
            records.push(execute_tool(&connection, call).await);
        }

        let synthesis = self
            .decider
            .decide(DecideRequest {
                query,
                tools: &tools,
                history,
                prior_results: Some(&records),
            })
            .await?;

        let answer = match synthesis {
            Decision::Answer(text) => text,
            // We asked for prose. If the decider wants yet more tools,
            // degrade to answering from what we already collected.
            Decision::ToolCalls(_) => fallback_answer(&records),
        };

        Ok(ChatOutcome {
            answer,
            tools_used: records.iter().map(|r| r.tool_name.clone()).collect(),
            tool_results: records,
        })
    }
}

async fn execute_tool(connection: &Arc<Connection>, call: ToolCallRequest) -> ToolRecord {
    let ToolCallRequest {
        tool_name,
        tool_args,
        reasoning,
    } = call;
    let params = CallToolParams {
        name: tool_name.clone(),
        arguments: Some(tool_args),
    };

    match connection.request("tools/call", Some(params)).await {
        Ok(result) => {
            // Only the content blocks matter; the rest of the result is
            // server bookkeeping.
            let content = serde_json::from_value::<CallToolResult>(result)
                .map(|r| serde_json::Value::Array(r.content))
                .unwrap_or_else(|_| serde_json::Value::Array(Vec::new()));
            ToolRecord::success(tool_name, content, reasoning)
        }
        Err(e) => {
            warn!(identity = %connection.identity(), tool = %tool_name, error = %e, "tool call failed");
            ToolRecord::failure(tool_name, reasoning, e.to_string())
        }
    }
}

fn fallback_answer(records: &[ToolRecord]) -> String {
    records
        .iter()
        .map(|r| match &r.error {
            Some(error) => format!("{} failed: {error}", r.tool_name),
            None => format!("{} returned: {}", r.tool_name, r.result),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

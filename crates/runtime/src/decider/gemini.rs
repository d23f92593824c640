//! Gemini API decision function.

use super::{DecideRequest, Decider, Decision, ToolCallRequest};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct ApiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// The JSON directive the model is prompted to emit when it wants tools.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Directive {
    needs_tools: bool,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<DirectiveCall>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectiveCall {
    tool_name: String,
    #[serde(default)]
    tool_args: Value,
    #[serde(default)]
    reasoning: String,
}

/// Builder for creating a Gemini decider.
#[derive(Debug, Clone)]
pub struct GeminiDeciderBuilder {
    api_key: String,
    model: String,
}

impl GeminiDeciderBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn build(self) -> GeminiDecider {
        GeminiDecider {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
        }
    }
}

/// Decision function backed by the Gemini generateContent API.
///
/// The model is prompted to emit a JSON tool directive when it wants
/// tools; anything that does not parse as a directive is taken as a
/// direct answer, so a chatty model degrades to plain text instead of
/// failing the request.
pub struct GeminiDecider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiDecider {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> GeminiDeciderBuilder {
        GeminiDeciderBuilder::new(api_key, model)
    }
}

impl std::fmt::Display for GeminiDecider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gemini({})", self.model)
    }
}

impl Decider for GeminiDecider {
    async fn decide(&self, request: DecideRequest<'_>) -> Result<Decision> {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|m| Content {
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();
        contents.push(Content {
            parts: vec![Part {
                text: build_prompt(&request),
            }],
        });

        let url = format!("{GEMINI_API_URL}/{}:generateContent", self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&ApiRequest { contents })
            .send()
            .await
            .map_err(|e| Error::Decider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Decider(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Decider(e.to_string()))?;

        let text = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::Decider("empty model response".to_string()))?;

        Ok(parse_decision(&text))
    }
}

fn build_prompt(request: &DecideRequest<'_>) -> String {
    let tool_lines = request
        .tools
        .iter()
        .map(|t| {
            format!(
                "- {}: {}",
                t.name,
                t.description.as_deref().unwrap_or("No description")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "You are an AI assistant with access to the following tools:\n\
         {tool_lines}\n\n\
         When you need tools, respond with only a JSON object containing:\n\
         - \"needsTools\": true\n\
         - \"toolCalls\": a list of {{\"toolName\": ..., \"toolArgs\": {{...}}, \"reasoning\": ...}}\n\n\
         If you don't need tools, respond normally with plain text.\n"
    );

    if let Some(results) = request.prior_results {
        prompt.push_str("\nThe requested tools have been executed:\n");
        for record in results {
            match &record.error {
                Some(error) => {
                    prompt.push_str(&format!("- Tool '{}' failed: {error}\n", record.tool_name));
                }
                None => {
                    prompt.push_str(&format!(
                        "- Tool '{}' returned: {}\n",
                        record.tool_name, record.result
                    ));
                }
            }
        }
        prompt.push_str(
            "\nUsing these results, provide a natural language response to the user. \
             Mention any tool that failed.\n",
        );
    }

    prompt.push_str(&format!("\nUser query: {}", request.query));
    prompt
}

/// Parse the model's text leniently: a well-formed tool directive becomes
/// tool calls; everything else is a direct answer.
fn parse_decision(text: &str) -> Decision {
    if let Ok(directive) = serde_json::from_str::<Directive>(text.trim()) {
        if directive.needs_tools && !directive.tool_calls.is_empty() {
            let calls = directive
                .tool_calls
                .into_iter()
                .map(|c| ToolCallRequest {
                    tool_name: c.tool_name,
                    tool_args: c.tool_args,
                    reasoning: c.reasoning,
                })
                .collect();
            return Decision::ToolCalls(calls);
        }
        if let Some(content) = directive.content {
            return Decision::Answer(content);
        }
    }
    Decision::Answer(text.to_string())
}

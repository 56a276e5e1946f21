//! TaskDecomposer - turns a task description into a TaskPlan
//!
//! One chat-completion call per description. The answer is cleaned of
//! `<think>` blocks, parsed directly, then scanned for the last JSON object
//! shaped like a plan. Anything else ends in the fixed fallback plan.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::plan::{Decomposition, RawPlan, fallback_plan};
use crate::llm::{CompletionRequest, LlmClient, Message, StopReason};
use crate::prompts::{PromptLoader, embedded};

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think-block regex"));

/// Remove every `<think>...</think>` block and trim the rest
pub fn strip_think_blocks(text: &str) -> String {
    THINK_BLOCK.replace_all(text, "").trim().to_string()
}

/// Find the last brace-delimited block that parses as a plan
///
/// Candidates are tried from the rightmost `{` leftwards, so nested sub-task
/// objects are visited first and rejected for missing `category`/`sub_tasks`
/// until the enclosing plan object is reached.
pub fn extract_last_json_block(text: &str) -> Option<Value> {
    debug!(len = text.len(), "extract_last_json_block: called");
    for (start, _) in text.rmatch_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        let Some(Ok(value)) = stream.next() else {
            continue;
        };
        if serde_json::from_value::<RawPlan>(value.clone()).is_ok() {
            debug!(start, "extract_last_json_block: found plan");
            return Some(value);
        }
    }
    debug!("extract_last_json_block: no plan found");
    None
}

/// Parse a cleaned model answer into a raw plan
fn parse_plan(cleaned: &str) -> Option<RawPlan> {
    if let Ok(plan) = serde_json::from_str::<RawPlan>(cleaned) {
        debug!("parse_plan: direct parse succeeded");
        return Some(plan);
    }
    extract_last_json_block(cleaned).and_then(|value| serde_json::from_value(value).ok())
}

/// Why an answer ended before the model finished, if it did
fn early_stop(stop_reason: &StopReason) -> Option<&'static str> {
    match stop_reason {
        StopReason::MaxTokens => Some("token limit reached"),
        StopReason::ContentFilter => Some("content filter"),
        StopReason::EndTurn => None,
    }
}

/// Decomposes tasks with an injected LLM client
pub struct TaskDecomposer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
    temperature: f32,
}

impl TaskDecomposer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            llm,
            prompts,
            max_tokens,
            temperature,
        }
    }

    /// Decompose a task description; never fails
    pub async fn analyze(&self, description: &str) -> Decomposition {
        debug!(%description, "TaskDecomposer::analyze: called");

        let prompt = match self.prompts.decompose_prompt(description) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Failed to render decomposition prompt, using fallback plan");
                return Decomposition::Fallback(fallback_plan());
            }
        };

        let request = CompletionRequest {
            system_prompt: embedded::DECOMPOSE_SYSTEM.to_string(),
            messages: vec![Message::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        };

        let content = match self.llm.complete(request).await {
            Ok(response) => {
                debug!(
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "TaskDecomposer::analyze: response received"
                );
                if let Some(reason) = early_stop(&response.stop_reason) {
                    warn!(max_tokens = self.max_tokens, %reason, "Decomposition answer may be truncated");
                }
                response.content.unwrap_or_default()
            }
            Err(e) => {
                warn!(error = %e, "Decomposition request failed, using fallback plan");
                return Decomposition::Fallback(fallback_plan());
            }
        };

        Self::interpret(&content)
    }

    /// Turn a raw model answer into a decomposition
    pub fn interpret(content: &str) -> Decomposition {
        debug!(len = content.len(), "TaskDecomposer::interpret: called");
        let cleaned = strip_think_blocks(content);

        match parse_plan(&cleaned) {
            Some(raw) => {
                let plan = raw.normalize();
                info!(sub_tasks = plan.sub_tasks.len(), category = %plan.category, "Task decomposed");
                Decomposition::Parsed(plan)
            }
            None => {
                warn!(response = %cleaned, "Failed to parse LLM response, using fallback plan");
                Decomposition::Fallback(fallback_plan())
            }
        }
    }
}

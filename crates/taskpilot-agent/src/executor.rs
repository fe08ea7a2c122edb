// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The turn executor: one conversational turn from user message to final
//! reply, including any tool rounds in between.
//!
//! Each turn is a fresh context seeded with the authenticated identity.
//! History is deliberately not replayed into the model context, so identity
//! can never leak across turns through model-controlled text.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use taskpilot_config::TaskpilotConfig;
use taskpilot_core::types::{
    ContentBlock, ProviderMessage, ProviderRequest, UserIdentity,
};
use taskpilot_core::{
    ProviderAdapter, TaskpilotError, ToolCallSummary, ToolDispatch, ToolOutcome,
    ToolRequest, ToolResult,
};

use crate::prompt;

/// The result of one executed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The reply to show the user.
    pub final_text: String,
    /// Every tool call the model requested, for observability. Never used
    /// for control flow.
    pub tool_call_summaries: Vec<ToolCallSummary>,
    /// The attributed outcome of each executed tool call, in order.
    pub tool_results: Vec<ToolResult>,
}

/// Anything that can run a conversational turn.
///
/// The orchestrator depends on this trait instead of the concrete executor
/// so it can be tested against a deterministic fake.
#[async_trait::async_trait]
pub trait TurnRunner: Send + Sync {
    async fn run_turn(
        &self,
        user_message: &str,
        conversation_id: &str,
        identity: &UserIdentity,
    ) -> Result<TurnOutcome, TaskpilotError>;
}

/// Drives model and tool rounds for a single conversational turn.
///
/// Constructed once at startup with its collaborators and configuration;
/// shared across requests.
pub struct TurnExecutor {
    provider: Arc<dyn ProviderAdapter>,
    tools: Arc<dyn ToolDispatch>,
    persona: String,
    model: String,
    max_tokens: u32,
    max_tool_rounds: u32,
    call_timeout: Duration,
}

impl TurnExecutor {
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        tools: Arc<dyn ToolDispatch>,
        config: &TaskpilotConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            persona: config
                .agent
                .system_prompt
                .clone()
                .unwrap_or_else(|| prompt::TASK_MANAGER_PERSONA.to_string()),
            model: config.anthropic.default_model.clone(),
            max_tokens: config.anthropic.max_tokens,
            max_tool_rounds: config.turn.max_tool_rounds,
            call_timeout: Duration::from_secs(config.tool_server.call_timeout_secs),
        }
    }

    /// Runs one turn: model call, tool dispatch, and follow-up generations
    /// until the model yields a final answer or the round ceiling is hit.
    ///
    /// A hard provider failure is `TurnFailed`. Degraded tool outcomes
    /// (timeout, channel unavailable) never fail the turn: the model gets
    /// the outcome text to phrase, and if it produces nothing, the caller
    /// gets a warming-up advisory, because the underlying mutation may have
    /// been applied.
    pub async fn run_turn(
        &self,
        user_message: &str,
        conversation_id: &str,
        identity: &UserIdentity,
    ) -> Result<TurnOutcome, TaskpilotError> {
        let instructions = prompt::turn_instructions(&self.persona, &identity.user_id);
        let tools = taskpilot_tools::catalog::tool_definitions();

        let mut messages = vec![ProviderMessage {
            role: "user".to_string(),
            content: vec![ContentBlock::Text {
                text: user_message.to_string(),
            }],
        }];
        let mut summaries: Vec<ToolCallSummary> = Vec::new();
        let mut tool_results: Vec<ToolResult> = Vec::new();
        let mut degraded = false;

        for round in 0..self.max_tool_rounds {
            let request = ProviderRequest {
                model: self.model.clone(),
                system_prompt: Some(instructions.clone()),
                messages: messages.clone(),
                max_tokens: self.max_tokens,
                tools: Some(tools.clone()),
            };

            let response = self
                .provider
                .complete(request)
                .await
                .map_err(TaskpilotError::turn_failed_from)?;

            if response.is_final() {
                let final_text = if response.text.trim().is_empty() && degraded {
                    prompt::WARMING_UP_ADVISORY.to_string()
                } else {
                    response.text
                };
                debug!(
                    conversation_id,
                    rounds = round,
                    tool_calls = summaries.len(),
                    "turn complete"
                );
                return Ok(TurnOutcome {
                    final_text,
                    tool_call_summaries: summaries,
                    tool_results,
                });
            }

            // Echo the assistant message (text + tool_use blocks) back into
            // the context, then append the results as the next user message.
            let mut assistant_blocks = Vec::new();
            if !response.text.is_empty() {
                assistant_blocks.push(ContentBlock::Text {
                    text: response.text.clone(),
                });
            }
            for tool_use in &response.tool_uses {
                assistant_blocks.push(ContentBlock::ToolUse {
                    id: tool_use.id.clone(),
                    name: tool_use.name.clone(),
                    input: tool_use.input.clone(),
                });
            }
            messages.push(ProviderMessage {
                role: "assistant".to_string(),
                content: assistant_blocks,
            });

            let mut result_blocks = Vec::new();
            for tool_use in &response.tool_uses {
                summaries.push(ToolCallSummary {
                    tool: tool_use.name.clone(),
                    parameters: tool_use.input.clone(),
                });

                // The authenticated user id always wins over whatever the
                // model put in the arguments.
                let result = match ToolRequest::from_model_call(
                    &tool_use.name,
                    &tool_use.input,
                    &identity.user_id,
                ) {
                    Ok(tool_request) => {
                        self.tools.call(tool_request, self.call_timeout).await
                    }
                    Err(e) => ToolResult {
                        tool_name: tool_use.name.clone(),
                        outcome: ToolOutcome::Failed {
                            error: e.to_string(),
                        },
                    },
                };

                if result.outcome.is_degraded() {
                    degraded = true;
                    warn!(
                        conversation_id,
                        tool = %result.tool_name,
                        outcome = ?result.outcome,
                        "tool call degraded"
                    );
                }

                result_blocks.push(ContentBlock::ToolResult {
                    tool_use_id: tool_use.id.clone(),
                    content: result.outcome.model_text(),
                    is_error: !result.outcome.succeeded(),
                });
                tool_results.push(result);
            }
            messages.push(ProviderMessage {
                role: "user".to_string(),
                content: result_blocks,
            });

            debug!(conversation_id, round, "tool round complete");
        }

        warn!(
            conversation_id,
            max_rounds = self.max_tool_rounds,
            "tool round ceiling hit, ending turn with best-effort reply"
        );
        let final_text = if degraded {
            prompt::WARMING_UP_ADVISORY.to_string()
        } else {
            prompt::ROUND_CEILING_REPLY.to_string()
        };
        Ok(TurnOutcome {
            final_text,
            tool_call_summaries: summaries,
            tool_results,
        })
    }
}

#[async_trait::async_trait]
impl TurnRunner for TurnExecutor {
    async fn run_turn(
        &self,
        user_message: &str,
        conversation_id: &str,
        identity: &UserIdentity,
    ) -> Result<TurnOutcome, TaskpilotError> {
        TurnExecutor::run_turn(self, user_message, conversation_id, identity).await
    }
}

// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude provider adapter for the Taskpilot agent.
//!
//! Implements [`ProviderAdapter`] over the Anthropic Messages API with tool
//! use. Responses come back non-streaming: the chat endpoint returns one
//! complete reply per turn.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use taskpilot_config::TaskpilotConfig;
use taskpilot_core::types::{
    AdapterType, ContentBlock, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
    ToolUseData,
};
use taskpilot_core::{PluginAdapter, ProviderAdapter, TaskpilotError};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{
    ApiContent, ApiContentBlock, ApiMessage, MessageRequest, ResponseContentBlock,
};

/// Anthropic Claude provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `ANTHROPIC_API_KEY` env var -> error.
pub struct AnthropicProvider {
    client: AnthropicClient,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider from the given configuration.
    pub fn new(config: &TaskpilotConfig) -> Result<Self, TaskpilotError> {
        let api_key = resolve_api_key(&config.anthropic.api_key)?;
        let client = AnthropicClient::new(
            api_key,
            config.anthropic.api_version.clone(),
            Duration::from_secs(config.anthropic.request_timeout_secs),
        )?;

        info!(
            model = config.anthropic.default_model,
            "Anthropic provider initialized"
        );

        Ok(Self { client })
    }

    /// Creates a provider with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: AnthropicClient) -> Self {
        Self { client }
    }

    /// Converts a [`ProviderRequest`] to an Anthropic [`MessageRequest`].
    fn to_message_request(request: &ProviderRequest) -> MessageRequest {
        let messages: Vec<ApiMessage> = request
            .messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.clone(),
                content: convert_content_blocks(&m.content),
            })
            .collect();

        // Tool definitions arrive as provider-format JSON values; anything
        // malformed is dropped rather than sent.
        let tools = request
            .tools
            .as_ref()
            .map(|tool_values| {
                tool_values
                    .iter()
                    .filter_map(|v| {
                        serde_json::from_value::<crate::types::ToolDefinition>(v.clone()).ok()
                    })
                    .collect::<Vec<_>>()
            })
            .and_then(|v| if v.is_empty() { None } else { Some(v) });

        MessageRequest {
            model: request.model.clone(),
            messages,
            system: request.system_prompt.clone(),
            max_tokens: request.max_tokens,
            stream: false,
            tools,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, TaskpilotError> {
        // A full check would make a lightweight API call, but we avoid
        // consuming tokens on health checks.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TaskpilotError> {
        debug!("Anthropic provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, TaskpilotError> {
        let api_request = Self::to_message_request(&request);
        let response = self.client.complete_message(&api_request).await?;

        let mut text = String::new();
        let mut tool_uses = Vec::new();
        for block in response.content {
            match block {
                ResponseContentBlock::Text { text: t } => text.push_str(&t),
                ResponseContentBlock::ToolUse { id, name, input } => {
                    tool_uses.push(ToolUseData { id, name, input });
                }
            }
        }

        Ok(ProviderResponse {
            id: response.id,
            text,
            tool_uses,
            stop_reason: response.stop_reason,
            usage: TokenUsage {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
            },
        })
    }
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, TaskpilotError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
        TaskpilotError::Config(
            "Anthropic API key not found. Set anthropic.api_key in config or the ANTHROPIC_API_KEY environment variable.".into(),
        )
    })
}

/// Converts core [`ContentBlock`]s to Anthropic API [`ApiContent`].
fn convert_content_blocks(blocks: &[ContentBlock]) -> ApiContent {
    if blocks.len() == 1
        && let ContentBlock::Text { text } = &blocks[0]
    {
        return ApiContent::Text(text.clone());
    }

    let api_blocks: Vec<ApiContentBlock> = blocks
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => ApiContentBlock::Text { text: text.clone() },
            ContentBlock::ToolUse { id, name, input } => ApiContentBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            },
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => ApiContentBlock::ToolResult {
                tool_use_id: tool_use_id.clone(),
                content: content.clone(),
                is_error: *is_error,
            },
        })
        .collect();

    ApiContent::Blocks(api_blocks)
}

//! OpenAI-compatible chat client.
//!
//! Works with the OpenAI API and any compatible endpoint (DashScope's
//! compatible mode is the default). Supports plain chat and tool calling.

use std::time::Instant;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs,
        FunctionCall, FunctionObject,
    },
    Client,
};
use async_trait::async_trait;
use mentor_config::LlmSettings;
use mentor_core::{AgentError, Message, MessageRole, ToolCallRequest, ToolSchema};
use tracing::{debug, info};

use crate::{GenerationOutcome, Generator};

/// Converts any error into an AgentError::LlmError.
fn llm_err(e: impl ToString) -> AgentError {
    AgentError::LlmError(e.to_string())
}

/// Separates transport failures from API-level failures.
fn classify_err(e: OpenAIError) -> AgentError {
    match e {
        OpenAIError::Reqwest(err) => AgentError::Network(err.to_string()),
        other => AgentError::LlmError(other.to_string()),
    }
}

/// Parses the model's argument string; malformed JSON is kept verbatim so
/// argument validation can reject it later.
fn parse_arguments(raw: &str) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Builds one chat-completion message from a conversation turn.
fn to_request_message(msg: &Message) -> Result<ChatCompletionRequestMessage, AgentError> {
    let message = match msg.role {
        MessageRole::System => ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(msg.content.as_str())
                .build()
                .map_err(llm_err)?,
        ),
        MessageRole::User => ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(msg.content.as_str())
                .build()
                .map_err(llm_err)?,
        ),
        MessageRole::Assistant => {
            let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
            if !msg.content.is_empty() {
                builder.content(msg.content.as_str());
            }
            if let Some(call) = &msg.tool_call {
                builder.tool_calls(vec![ChatCompletionMessageToolCall {
                    id: call.id.clone(),
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.to_string(),
                    },
                }]);
            }
            ChatCompletionRequestMessage::Assistant(builder.build().map_err(llm_err)?)
        }
        MessageRole::Tool => ChatCompletionRequestMessage::Tool(
            ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(msg.tool_call_id.clone().unwrap_or_default())
                .content(msg.content.as_str())
                .build()
                .map_err(llm_err)?,
        ),
    };
    Ok(message)
}

fn to_openai_tools(tools: &[ToolSchema]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|t| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: t.name.clone(),
                description: Some(t.description.clone()),
                parameters: Some(t.parameters.clone()),
                strict: None,
            },
        })
        .collect()
}

/// Client for OpenAI-compatible chat completion APIs.
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl LlmClient {
    /// Creates a new client for the given model, endpoint and key.
    pub fn new(model: &str, api_base: &str, api_key: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            temperature: LlmSettings::default().temperature,
        }
    }

    /// Creates a client from settings; fails when no API key is configured.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, AgentError> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Configuration("DASHSCOPE_API_KEY is not set".into()))?;

        let mut client = Self::new(&settings.model, &settings.api_base, api_key);
        client.temperature = settings.temperature;
        Ok(client)
    }

    /// Returns the model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for LlmClient {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    /// Sends a chat request with tools and returns content or the first tool call.
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<GenerationOutcome, AgentError> {
        if messages.is_empty() {
            return Err(AgentError::InvalidRequest("at least one message is required".into()));
        }

        let start = Instant::now();
        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>, _>>()?;

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&self.model)
            .temperature(self.temperature)
            .messages(request_messages);

        if !tools.is_empty() {
            request_builder.tools(to_openai_tools(tools));
        }

        let request = request_builder.build().map_err(llm_err)?;
        let response = self.client.chat().create(request).await.map_err(classify_err)?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let (input_tokens, output_tokens) = response
            .usage
            .as_ref()
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        info!("LLM: {}ms, tokens: {}/{} (in/out)", elapsed_ms, input_tokens, output_tokens);

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::LlmError("No response choices".into()))?;

        // First tool call wins; the dispatcher runs one call per turn.
        if let Some(tc) = choice.message.tool_calls.and_then(|calls| calls.into_iter().next()) {
            debug!("Tool call requested: {}({})", tc.function.name, tc.function.arguments);
            return Ok(GenerationOutcome::ToolCall(ToolCallRequest {
                id: tc.id,
                name: tc.function.name,
                arguments: parse_arguments(&tc.function.arguments),
            }));
        }

        let content = choice
            .message
            .content
            .ok_or_else(|| AgentError::LlmError("No response content".into()))?;

        Ok(GenerationOutcome::Text(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_arguments_become_empty_object() {
        assert_eq!(parse_arguments(""), json!({}));
        assert_eq!(parse_arguments("  "), json!({}));
    }

    #[test]
    fn malformed_arguments_are_kept_verbatim() {
        assert_eq!(parse_arguments("{duration:"), json!("{duration:"));
        assert_eq!(parse_arguments(r#"{"topic":"memory"}"#), json!({"topic": "memory"}));
    }

    #[test]
    fn from_settings_requires_key() {
        let settings = LlmSettings::default();
        let err = LlmClient::from_settings(&settings).err().unwrap();
        assert!(matches!(err, AgentError::Configuration(_)));

        let settings = LlmSettings { api_key: Some("sk-test".into()), ..LlmSettings::default() };
        let client = LlmClient::from_settings(&settings).unwrap();
        assert_eq!(client.model(), mentor_config::DEFAULT_MODEL);
    }

    #[test]
    fn converts_tool_turns() {
        let call = ToolCallRequest::new("system_info", json!({}));
        let assistant = to_request_message(&Message::assistant_tool_call(call)).unwrap();
        assert!(matches!(assistant, ChatCompletionRequestMessage::Assistant(_)));

        let tool = to_request_message(&Message::tool("call_system_info", "CPU: test")).unwrap();
        assert!(matches!(tool, ChatCompletionRequestMessage::Tool(_)));
    }

    #[tokio::test]
    async fn rejects_empty_message_list() {
        let client = LlmClient::new("m", "http://127.0.0.1:9", "k");
        let err = client.generate(&[], &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidRequest(_)));
    }
}

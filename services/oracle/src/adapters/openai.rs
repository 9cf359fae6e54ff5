//! services/oracle/src/adapters/openai.rs
//!
//! This module contains the adapter for an OpenAI-compatible chat model serving the
//! recommendation contract through its JSON-schema response format.
//! It implements the `LanguageModel` port from the `core` crate. Maps grounding has no
//! counterpart here, so grounded calls report `Unsupported`.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use literary_oracle_core::ports::{
    GroundedRequest, LanguageModel, ModelError, ModelResult, StructuredRequest,
};
use literary_oracle_core::GroundingChunk;
use tracing::error;

const SYSTEM_INSTRUCTIONS: &str = "You answer only with a JSON object that matches the \
    provided schema. No prose, no code fences.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LanguageModel` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiModel {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiModel {
    /// Creates a new `OpenAiModel`. Without an API key every call fails with
    /// `MissingCredential` before touching the network.
    pub fn new(api_key: Option<&str>, model: String) -> Self {
        let client = api_key.map(|key| Client::with_config(OpenAIConfig::new().with_api_key(key)));
        Self { client, model }
    }
}

//=========================================================================================
// `LanguageModel` Trait Implementation
//=========================================================================================

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn generate_structured(&self, request: &StructuredRequest) -> ModelResult<String> {
        let client = self.client.as_ref().ok_or(ModelError::MissingCredential)?;

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| ModelError::Provider(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.as_str())
                .build()
                .map_err(|e| ModelError::Provider(e.to_string()))?
                .into(),
        ];

        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: Some(
                    "Five book recommendations and a motivational message.".to_string(),
                ),
                name: "oracle_result".to_string(),
                schema: Some(request.schema.to_json_schema()),
                // Exact entry counts are enforced by local validation.
                strict: Some(false),
            },
        };

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(response_format)
            .n(1)
            .build()
            .map_err(|e| ModelError::Provider(e.to_string()))?;

        let response = client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| {
                error!("OpenAI chat completion failed: {}", e);
                match e {
                    OpenAIError::Reqwest(inner) => ModelError::Transport(inner.to_string()),
                    other => ModelError::Provider(other.to_string()),
                }
            })?;

        // An empty choice list becomes empty text, which validation rejects.
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    async fn generate_grounded(
        &self,
        _request: &GroundedRequest,
    ) -> ModelResult<Vec<GroundingChunk>> {
        if self.client.is_none() {
            return Err(ModelError::MissingCredential);
        }
        Err(ModelError::Unsupported(
            "maps grounding is only available from Gemini".to_string(),
        ))
    }
}

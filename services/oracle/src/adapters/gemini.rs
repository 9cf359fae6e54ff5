//! services/oracle/src/adapters/gemini.rs
//!
//! This module contains the adapter for Google's Gemini `generateContent` REST API.
//! It implements the `LanguageModel` port from the `core` crate: structured JSON output
//! for recommendations, and maps-grounded generation for the library search.

use async_trait::async_trait;
use literary_oracle_core::ports::{
    GroundedRequest, LanguageModel, ModelError, ModelResult, StructuredRequest,
};
use literary_oracle_core::schema::Schema;
use literary_oracle_core::{GroundingChunk, GroundingReference};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, error};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key; `None` makes every call fail with `MissingCredential`.
    pub api_key: Option<String>,
    /// Model used for structured recommendations.
    pub structured_model: String,
    /// Model used for maps-grounded queries.
    pub grounded_model: String,
    /// Base endpoint URL.
    pub endpoint: String,
    /// Request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            structured_model: "gemini-2.5-flash".to_string(),
            grounded_model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout: None,
        }
    }
}

/// An adapter that implements `LanguageModel` over the Gemini REST API.
#[derive(Clone)]
pub struct GeminiModel {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiModel {
    /// Creates a new `GeminiModel`.
    pub fn new(config: GeminiConfig) -> Result<Self, ModelError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn build_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            model
        )
    }

    /// Sends one `generateContent` call. The credential is checked before any I/O.
    async fn generate(&self, model: &str, body: &GeminiRequest) -> ModelResult<GeminiResponse> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ModelError::MissingCredential)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key).map_err(|_| {
                ModelError::Provider("API key is not a valid header value".to_string())
            })?,
        );

        let response = self
            .client
            .post(self.build_url(model))
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("Gemini returned HTTP {}: {}", status, text);
            return Err(ModelError::Provider(format!("HTTP {}: {}", status, text)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        debug!("Gemini raw response: {}", text);

        let parsed: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::Provider(format!("unreadable Gemini envelope: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(ModelError::Provider(format!(
                "Gemini API error: {}",
                error.message
            )));
        }

        Ok(parsed)
    }
}

//=========================================================================================
// Gemini API request/response structures
//=========================================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<Value>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<RawGroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGroundingChunk {
    maps: Option<RawReference>,
    web: Option<RawReference>,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl RawReference {
    fn complete(self) -> Option<GroundingReference> {
        match (self.uri, self.title) {
            (Some(uri), Some(title)) if !uri.is_empty() && !title.is_empty() => {
                Some(GroundingReference { uri, title })
            }
            _ => None,
        }
    }
}

impl RawGroundingChunk {
    /// A map reference wins; a web reference is the fallback; anything else is `Other`.
    fn classify(self) -> GroundingChunk {
        if let Some(reference) = self.maps.and_then(RawReference::complete) {
            GroundingChunk::Map(reference)
        } else if let Some(reference) = self.web.and_then(RawReference::complete) {
            GroundingChunk::Web(reference)
        } else {
            GroundingChunk::Other
        }
    }
}

impl GeminiResponse {
    /// Concatenated text of the first candidate; empty when there is none.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn into_grounding_chunks(self) -> Vec<GroundingChunk> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.grounding_metadata)
            .map(|m| {
                m.grounding_chunks
                    .into_iter()
                    .map(RawGroundingChunk::classify)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn user_content(text: &str) -> Vec<GeminiContent> {
    vec![GeminiContent {
        role: "user".to_string(),
        parts: vec![GeminiPart {
            text: text.to_string(),
        }],
    }]
}

fn structured_body(request: &StructuredRequest) -> GeminiRequest {
    GeminiRequest {
        contents: user_content(&request.prompt),
        generation_config: Some(GeminiGenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: gemini_schema(&request.schema),
        }),
        tools: Vec::new(),
        tool_config: None,
    }
}

/// Maps tool enabled, retrieval pinned to the caller's coordinates.
fn grounded_body(request: &GroundedRequest) -> GeminiRequest {
    GeminiRequest {
        contents: user_content(&request.query),
        generation_config: None,
        tools: vec![json!({ "googleMaps": {} })],
        tool_config: Some(json!({
            "retrievalConfig": {
                "latLng": {
                    "latitude": request.coordinates.latitude,
                    "longitude": request.coordinates.longitude,
                }
            }
        })),
    }
}

/// Renders a schema into Gemini's OpenAPI-subset dialect.
pub fn gemini_schema(schema: &Schema) -> Value {
    match schema {
        Schema::Object {
            properties,
            required,
        } => {
            let props: Map<String, Value> = properties
                .iter()
                .map(|(name, prop)| (name.clone(), gemini_schema(prop)))
                .collect();
            let ordering: Vec<&str> = properties.iter().map(|(name, _)| name.as_str()).collect();
            json!({
                "type": "OBJECT",
                "properties": props,
                "required": required,
                "propertyOrdering": ordering,
            })
        }
        Schema::Array {
            items,
            min_items,
            max_items,
        } => {
            let mut out = json!({ "type": "ARRAY", "items": gemini_schema(items) });
            if let Some(min) = min_items {
                out["minItems"] = json!(min);
            }
            if let Some(max) = max_items {
                out["maxItems"] = json!(max);
            }
            out
        }
        Schema::String { enumeration } if enumeration.is_empty() => json!({ "type": "STRING" }),
        Schema::String { enumeration } => {
            json!({ "type": "STRING", "format": "enum", "enum": enumeration })
        }
    }
}

//=========================================================================================
// `LanguageModel` Trait Implementation
//=========================================================================================

#[async_trait]
impl LanguageModel for GeminiModel {
    async fn generate_structured(&self, request: &StructuredRequest) -> ModelResult<String> {
        let body = structured_body(request);
        let response = self.generate(&self.config.structured_model, &body).await?;
        Ok(response.text())
    }

    async fn generate_grounded(
        &self,
        request: &GroundedRequest,
    ) -> ModelResult<Vec<GroundingChunk>> {
        let body = grounded_body(request);
        let response = self.generate(&self.config.grounded_model, &body).await?;
        Ok(response.into_grounding_chunks())
    }
}

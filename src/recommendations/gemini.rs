//! Gemini `generateContent` client.
//!
//! Sends the prompt with a response schema and `application/json` MIME type
//! so the model answers with bare JSON text.

use crate::config::ProviderConfig;
use crate::recommendations::backend::{GenerationBackend, GenerationRequest};
use crate::recommendations::errors::RecommendationError;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const API_KEY_HEADER: &str = "x-goog-api-key";
const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

pub struct GeminiBackend {
    client: Client,
    endpoint: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(config: &ProviderConfig) -> Result<Self, RecommendationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                RecommendationError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn request_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME_TYPE,
                response_schema: &request.response_schema,
                temperature: request.temperature,
            },
        }
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(response: GenerateContentResponse) -> Result<String, RecommendationError> {
        if let Some(reason) = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(RecommendationError::Provider(format!(
                "Prompt was blocked ({})",
                reason
            )));
        }

        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            RecommendationError::Provider("Response contained no candidates".to_string())
        })?;

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(RecommendationError::Provider(format!(
                "Response contained no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }

    /// Human-readable message for a non-2xx response.
    fn error_message(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => match parsed.error.status {
                Some(kind) => format!("API error {} ({}): {}", status, kind, parsed.error.message),
                None => format!("API error {}: {}", status, parsed.error.message),
            },
            Err(_) if body.trim().is_empty() => format!("API error {}", status),
            Err(_) => format!("API error {}: {}", status, body.trim()),
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "Gemini API"
    }

    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<String, RecommendationError> {
        log::debug!(
            "POST {} (temperature {}, {} prompt chars)",
            self.url(),
            request.temperature,
            request.prompt.len()
        );

        let response = self
            .client
            .post(self.url())
            .header(header::CONTENT_TYPE, JSON_MIME_TYPE)
            .header(API_KEY_HEADER, api_key)
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|e| RecommendationError::Provider(format!("API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecommendationError::Provider(Self::error_message(status, &body)));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            RecommendationError::Provider(format!("Failed to parse response: {}", e))
        })?;

        Self::extract_text(parsed)
    }
}

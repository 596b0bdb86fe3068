use crate::recommendations::errors::RecommendationError;
use async_trait::async_trait;
use serde_json::Value;

/// One structured-output call to a text generation service.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    /// JSON schema the generated text must conform to
    pub response_schema: Value,
}

/// A text generation service that can return schema-constrained JSON.
///
/// Implementations return the raw generated text; decoding and shape
/// checks happen in `RecommendationProvider`.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// User-friendly name, used in error messages (e.g. "Gemini API")
    fn name(&self) -> &str;

    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<String, RecommendationError>;
}

//! Recommendation provider.
//!
//! Turns a user request into one schema-constrained generation call and
//! re-checks the shape of whatever comes back before building
//! `Recommendation` values. A single attempt is made per call; failures
//! propagate to the caller with the operation's context attached.

use crate::config::ProviderConfig;
use crate::models::{Language, Recommendation};
use crate::recommendations::backend::{GenerationBackend, GenerationRequest};
use crate::recommendations::errors::RecommendationError;
use crate::recommendations::gemini::GeminiBackend;
use crate::recommendations::prompt::{response_schema, RecommendationRequest};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub struct RecommendationProvider {
    backend: Arc<dyn GenerationBackend>,
    api_key: Option<String>,
    timeout: Duration,
}

impl RecommendationProvider {
    /// Create a provider over an arbitrary backend.
    pub fn new(backend: Arc<dyn GenerationBackend>, config: &ProviderConfig) -> Self {
        Self {
            backend,
            api_key: config.api_key().map(str::to_string),
            timeout: config.timeout,
        }
    }

    /// Create a provider backed by the Gemini API.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, RecommendationError> {
        let backend = GeminiBackend::new(config)?;
        Ok(Self::new(Arc::new(backend), config))
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Five songs matching a mood, weather, situation or artist keyword.
    pub async fn search_by_keyword(
        &self,
        keyword: &str,
        language: Language,
    ) -> Result<Vec<Recommendation>, RecommendationError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(RecommendationError::Validation(
                language.empty_keyword_message().to_string(),
            ));
        }
        self.recommend(&RecommendationRequest::Keyword(keyword.to_string()), language)
            .await
    }

    /// A single song for today.
    pub async fn fetch_song_of_the_day(
        &self,
        language: Language,
    ) -> Result<Recommendation, RecommendationError> {
        let request = RecommendationRequest::SongOfTheDay;
        self.recommend(&request, language)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RecommendationError::Provider(
                    "API did not return a valid recommendation for Song of the Day.".to_string(),
                )
            })
    }

    /// Five signature songs by `artist`.
    pub async fn fetch_artist_playlist(
        &self,
        artist: &str,
        language: Language,
    ) -> Result<Vec<Recommendation>, RecommendationError> {
        let artist = artist.trim();
        if artist.is_empty() {
            return Err(RecommendationError::Validation(
                "Artist name must not be empty".to_string(),
            ));
        }
        self.recommend(&RecommendationRequest::Artist(artist.to_string()), language)
            .await
    }

    /// Run one request end to end: credential check, generation, validation.
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
        language: Language,
    ) -> Result<Vec<Recommendation>, RecommendationError> {
        let context = format!("{} from {}", request.failure_context(), self.backend.name());

        let result = self.recommend_inner(request, language).await;
        if let Err(ref e) = result {
            log::error!("{}: {}", context, e);
        }
        result.map_err(|e| e.context(context))
    }

    async fn recommend_inner(
        &self,
        request: &RecommendationRequest,
        language: Language,
    ) -> Result<Vec<Recommendation>, RecommendationError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            RecommendationError::Configuration(
                "API key not set (GEMINI_API_KEY or API_KEY)".to_string(),
            )
        })?;

        let generation = GenerationRequest {
            prompt: request.prompt(language),
            temperature: request.temperature(),
            response_schema: response_schema(),
        };

        log::info!("Requesting {:?} in '{}'", request, language);

        let text = tokio::time::timeout(self.timeout, self.backend.generate(api_key, &generation))
            .await
            .map_err(|_| {
                RecommendationError::Provider(format!(
                    "Request timed out after {}s",
                    self.timeout.as_secs_f32()
                ))
            })??;

        let recommendations = parse_recommendations(&text, request.expected_count())?;
        log::info!("Received {} recommendation(s)", recommendations.len());
        Ok(recommendations)
    }
}

/// Decode generated text into at most `expected` recommendations.
///
/// Gross shape errors (not JSON, not an array, empty) are provider errors;
/// a malformed entry rejects the whole response as a validation error.
pub fn parse_recommendations(
    text: &str,
    expected: usize,
) -> Result<Vec<Recommendation>, RecommendationError> {
    let json_text = strip_code_fence(text);

    let value: Value = serde_json::from_str(json_text).map_err(|e| {
        RecommendationError::Provider(format!("Response was not valid JSON: {}", e))
    })?;

    let items = value.as_array().ok_or_else(|| {
        RecommendationError::Provider(
            "API did not return a valid array of recommendations.".to_string(),
        )
    })?;

    if items.is_empty() {
        return Err(RecommendationError::Provider(
            "API returned an empty list of recommendations.".to_string(),
        ));
    }

    let mut recommendations = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_entry(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    if recommendations.len() > expected {
        log::warn!(
            "Provider returned {} entries, keeping the first {}",
            recommendations.len(),
            expected
        );
        recommendations.truncate(expected);
    } else if recommendations.len() < expected {
        log::warn!(
            "Provider returned {} of {} requested entries",
            recommendations.len(),
            expected
        );
    }

    Ok(recommendations)
}

fn parse_entry(index: usize, item: &Value) -> Result<Recommendation, RecommendationError> {
    let object = item.as_object().ok_or_else(|| {
        RecommendationError::Validation(format!("Entry {} is not an object", index))
    })?;

    let field = |name: &str| {
        object
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                RecommendationError::Validation(format!(
                    "Entry {} is missing a non-empty '{}'",
                    index, name
                ))
            })
    };

    Ok(Recommendation {
        artist: field("artist")?,
        song: field("song")?,
        reason: field("reason")?,
    })
}

/// Strip a surrounding Markdown code fence, if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip the optional language tag on the opening line
        let body = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest,
        };
        if let Some(end) = body.rfind("```") {
            return body[..end].trim();
        }
    }
    trimmed
}

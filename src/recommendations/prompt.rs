//! Prompt and response-schema construction.

use crate::models::Language;
use serde_json::{json, Value};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationRequest {
    /// Free text describing a mood, weather, situation or artist
    Keyword(String),
    /// One pick for today
    SongOfTheDay,
    /// Signature songs by a named artist
    Artist(String),
}

impl RecommendationRequest {
    /// How many recommendations the prompt asks for.
    pub fn expected_count(&self) -> usize {
        match self {
            RecommendationRequest::SongOfTheDay => 1,
            RecommendationRequest::Keyword(_) | RecommendationRequest::Artist(_) => 5,
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            RecommendationRequest::Keyword(_) => 0.7,
            RecommendationRequest::SongOfTheDay => 0.8,
            RecommendationRequest::Artist(_) => 0.6,
        }
    }

    /// Full prompt text, language directive included.
    pub fn prompt(&self, language: Language) -> String {
        let body = match self {
            RecommendationRequest::Keyword(keyword) => format!(
                "Recommend 5 American R&B songs based on the following keyword(s): \"{}\". \
                 The keywords could describe a mood, weather, a situation, or a favorite artist. \
                 For each song, provide the artist, song title, and a short, compelling reason \
                 for the recommendation.",
                keyword
            ),
            RecommendationRequest::SongOfTheDay => "Recommend 1 American R&B song that's perfect \
                 for today. Provide the artist, song title, and a short, compelling reason for \
                 the recommendation."
                .to_string(),
            RecommendationRequest::Artist(artist) => format!(
                "Recommend 5 signature songs by the R&B artist \"{}\". For each song, provide \
                 the artist name, the song title, and a short, compelling reason why it's a \
                 must-listen.",
                artist
            ),
        };
        format!("{} {}", body, language.reason_directive())
    }

    /// Context prefix used when this request fails.
    pub fn failure_context(&self) -> String {
        match self {
            RecommendationRequest::Keyword(_) => "Failed to get recommendations".to_string(),
            RecommendationRequest::SongOfTheDay => "Failed to get song of the day".to_string(),
            RecommendationRequest::Artist(artist) => {
                format!("Failed to get playlist for {}", artist)
            }
        }
    }
}

/// Array of `{artist, song, reason}` objects, every field a required string.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "artist": {
                    "type": "STRING",
                    "description": "The name of the artist."
                },
                "song": {
                    "type": "STRING",
                    "description": "The title of the song."
                },
                "reason": {
                    "type": "STRING",
                    "description": "A short reason for the recommendation."
                }
            },
            "required": ["artist", "song", "reason"],
            "propertyOrdering": ["artist", "song", "reason"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_prompt() {
        let prompt = RecommendationRequest::Keyword("Rainy day".to_string()).prompt(Language::En);
        assert!(prompt.starts_with("Recommend 5 American R&B songs"));
        assert!(prompt.contains("\"Rainy day\""));
        assert!(prompt.contains("mood, weather, a situation, or a favorite artist"));
        assert!(prompt.ends_with("The reason must be written in English."));
    }

    #[test]
    fn test_song_of_the_day_prompt() {
        let prompt = RecommendationRequest::SongOfTheDay.prompt(Language::Ko);
        assert!(prompt.contains("Recommend 1 American R&B song that's perfect for today."));
        assert!(prompt.ends_with("The reason must be written in Korean."));
    }

    #[test]
    fn test_artist_prompt_and_context() {
        let request = RecommendationRequest::Artist("Daniel Caesar".to_string());
        assert!(request
            .prompt(Language::En)
            .contains("signature songs by the R&B artist \"Daniel Caesar\""));
        assert!(request.failure_context().contains("Daniel Caesar"));
    }

    #[test]
    fn test_counts_and_temperatures() {
        let keyword = RecommendationRequest::Keyword("x".to_string());
        let artist = RecommendationRequest::Artist("x".to_string());
        assert_eq!(keyword.expected_count(), 5);
        assert_eq!(artist.expected_count(), 5);
        assert_eq!(RecommendationRequest::SongOfTheDay.expected_count(), 1);
        assert_eq!(keyword.temperature(), 0.7);
        assert_eq!(RecommendationRequest::SongOfTheDay.temperature(), 0.8);
        assert_eq!(artist.temperature(), 0.6);
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = response_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(schema["items"]["type"], "OBJECT");
        let required: Vec<&str> = schema["items"]["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, vec!["artist", "song", "reason"]);
        for field in ["artist", "song", "reason"] {
            assert_eq!(schema["items"]["properties"][field]["type"], "STRING");
        }
    }
}

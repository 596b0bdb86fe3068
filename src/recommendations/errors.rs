//! Typed errors for the recommendation system.
//!
//! Uses `thiserror` for ergonomic error definitions and implements
//! `Serialize` so errors can be handed to a UI layer as-is.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while asking the provider for recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum RecommendationError {
    /// No credential available; raised before any network attempt
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport failure, non-2xx status, timeout, unparseable or empty response
    #[error("Provider error: {0}")]
    Provider(String),

    /// The response was a JSON array but an entry had the wrong shape
    #[error("Validation error: {0}")]
    Validation(String),
}

impl RecommendationError {
    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            RecommendationError::Configuration(msg)
            | RecommendationError::Provider(msg)
            | RecommendationError::Validation(msg) => msg,
        }
    }

    /// Prefix the message with operation context, keeping the kind.
    pub fn context(self, context: impl std::fmt::Display) -> Self {
        match self {
            RecommendationError::Configuration(msg) => {
                RecommendationError::Configuration(format!("{}: {}", context, msg))
            }
            RecommendationError::Provider(msg) => {
                RecommendationError::Provider(format!("{}: {}", context, msg))
            }
            RecommendationError::Validation(msg) => {
                RecommendationError::Validation(format!("{}: {}", context, msg))
            }
        }
    }
}

impl From<reqwest::Error> for RecommendationError {
    fn from(e: reqwest::Error) -> Self {
        RecommendationError::Provider(e.to_string())
    }
}

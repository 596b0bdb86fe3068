//! Recommendation engine for R&B discovery.
//!
//! Asks a generative model for songs through a fixed JSON schema, validates
//! what comes back, and caches the daily pick.

pub mod backend;
pub mod cache;
pub mod errors;
pub mod gemini;
pub mod prompt;
pub mod provider;

pub use backend::{GenerationBackend, GenerationRequest};
pub use cache::DailyCache;
pub use errors::RecommendationError;
pub use gemini::GeminiBackend;
pub use prompt::RecommendationRequest;
pub use provider::RecommendationProvider;

pub mod config;
pub mod errors;
pub mod models;
pub mod playlist;
pub mod recommendations;
pub mod session;
pub mod storage;

pub use config::ProviderConfig;
pub use models::{Language, Recommendation, FEATURED_ARTISTS};
pub use playlist::PlaylistStore;
pub use recommendations::{
    DailyCache, GeminiBackend, GenerationBackend, GenerationRequest, RecommendationError,
    RecommendationProvider,
};
pub use session::{Outcome, RecommendationSession, SessionState};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

//! User session: the three request slots (song of the day, keyword search,
//! artist playlist), the current language and the saved playlist.
//!
//! Several requests may be in flight at once. Each slot only accepts the
//! response of its most recent request; older responses are dropped and
//! reported as [`Outcome::Discarded`].

pub mod slot;

pub use slot::{RequestSlot, RequestToken, SessionState};

use crate::config::{self, ProviderConfig};
use crate::models::{Language, Recommendation, FEATURED_ARTISTS};
use crate::playlist::PlaylistStore;
use crate::recommendations::{DailyCache, RecommendationError, RecommendationProvider};
use crate::storage::{FileStore, KeyValueStore};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::sync::Arc;

/// What happened to a response once it came back.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Committed to the slot
    Applied(T),
    /// A newer request owns the slot; the response was ignored
    Discarded,
    /// The request toggled the slot off instead of fetching
    Cleared,
}

pub struct RecommendationSession {
    provider: RecommendationProvider,
    daily_cache: DailyCache,
    playlist: Mutex<PlaylistStore>,
    language: Mutex<Language>,
    song_of_the_day: Mutex<RequestSlot<Recommendation>>,
    search: Mutex<RequestSlot<Vec<Recommendation>>>,
    artist: Mutex<RequestSlot<Vec<Recommendation>>>,
}

impl RecommendationSession {
    /// Build a session over `store`, loading the saved playlist from it.
    pub fn new(
        provider: RecommendationProvider,
        store: Arc<dyn KeyValueStore>,
        language: Language,
    ) -> Self {
        Self {
            provider,
            daily_cache: DailyCache::new(store.clone()),
            playlist: Mutex::new(PlaylistStore::load(store)),
            language: Mutex::new(language),
            song_of_the_day: Mutex::new(RequestSlot::new()),
            search: Mutex::new(RequestSlot::new()),
            artist: Mutex::new(RequestSlot::new()),
        }
    }

    /// Gemini-backed session persisting under the default data directory.
    pub fn open(config: &ProviderConfig, language: Language) -> Result<Self, RecommendationError> {
        let provider = RecommendationProvider::from_config(config)?;
        let data_dir = config::data_dir();
        log::info!("Using data directory {:?}", data_dir);
        Ok(Self::new(provider, Arc::new(FileStore::new(data_dir)), language))
    }

    pub fn featured_artists(&self) -> &'static [&'static str] {
        &FEATURED_ARTISTS
    }

    // =========================================================================
    // Language
    // =========================================================================

    pub fn language(&self) -> Language {
        *self.language.lock()
    }

    /// Switch language. The song of the day goes back to idle so the next
    /// load uses the new language's cache entry.
    pub fn set_language(&self, language: Language) {
        self.switch_language(|_| language);
    }

    pub fn toggle_language(&self) -> Language {
        self.switch_language(Language::toggled)
    }

    fn switch_language(&self, next: impl FnOnce(Language) -> Language) -> Language {
        let mut current = self.language.lock();
        let language = next(*current);
        if *current == language {
            return language;
        }
        // Reset under the language lock so no request can begin in between
        *current = language;
        self.song_of_the_day.lock().reset();
        drop(current);

        log::info!("Language switched to '{}'", language);
        language
    }

    /// Start a request on `slot` together with the language it will use.
    ///
    /// Both happen under the language lock, so a later language switch
    /// always leaves the token stale.
    fn begin<T>(
        &self,
        slot: &Mutex<RequestSlot<T>>,
        subject: Option<String>,
    ) -> (RequestToken, Language) {
        let language = self.language.lock();
        let token = slot.lock().begin(subject);
        (token, *language)
    }

    // =========================================================================
    // Song of the day
    // =========================================================================

    /// Load today's pick (local calendar date).
    pub async fn load_song_of_the_day(&self) -> Result<Outcome<Recommendation>, RecommendationError> {
        self.load_song_of_the_day_for(today()).await
    }

    /// Load the pick for `date`, from the cache when possible.
    pub async fn load_song_of_the_day_for(
        &self,
        date: NaiveDate,
    ) -> Result<Outcome<Recommendation>, RecommendationError> {
        let (token, language) = self.begin(&self.song_of_the_day, None);

        let result = match self.daily_cache.get(date, language) {
            Some(cached) => Ok(cached),
            None => {
                let fetched = self.provider.fetch_song_of_the_day(language).await;
                // Valid for its own date and language even if the slot moved on
                if let Ok(ref rec) = fetched {
                    self.daily_cache.put(date, language, rec);
                }
                fetched
            }
        };

        Self::commit(&self.song_of_the_day, token, result, "song of the day")
    }

    pub fn song_of_the_day_state(&self) -> SessionState<Recommendation> {
        self.song_of_the_day.lock().state().clone()
    }

    // =========================================================================
    // Keyword search
    // =========================================================================

    /// Search by free-text keyword. An empty keyword fails the search
    /// without calling the provider.
    pub async fn search(
        &self,
        keyword: &str,
    ) -> Result<Outcome<Vec<Recommendation>>, RecommendationError> {
        let (token, language) = self.begin(&self.search, Some(keyword.trim().to_string()));

        let result = self.provider.search_by_keyword(keyword, language).await;
        Self::commit(&self.search, token, result, "search")
    }

    pub fn search_state(&self) -> SessionState<Vec<Recommendation>> {
        self.search.lock().state().clone()
    }

    // =========================================================================
    // Artist playlists
    // =========================================================================

    /// Select an artist and fetch their signature songs.
    ///
    /// Selecting the artist that is already selected deselects it and
    /// clears the results instead of fetching again.
    pub async fn select_artist(
        &self,
        artist: &str,
    ) -> Result<Outcome<Vec<Recommendation>>, RecommendationError> {
        let artist = artist.trim();
        let (token, language) = {
            let language = self.language.lock();
            let mut slot = self.artist.lock();
            if slot.subject() == Some(artist) {
                slot.reset();
                log::info!("Deselected artist '{}'", artist);
                return Ok(Outcome::Cleared);
            }
            let token = slot.begin(Some(artist.to_string()));
            (token, *language)
        };

        let result = self.provider.fetch_artist_playlist(artist, language).await;
        Self::commit(&self.artist, token, result, "artist playlist")
    }

    pub fn selected_artist(&self) -> Option<String> {
        self.artist.lock().subject().map(str::to_string)
    }

    pub fn artist_state(&self) -> SessionState<Vec<Recommendation>> {
        self.artist.lock().state().clone()
    }

    // =========================================================================
    // Playlist
    // =========================================================================

    pub fn playlist(&self) -> Vec<Recommendation> {
        self.playlist.lock().entries().to_vec()
    }

    pub fn is_saved(&self, recommendation: &Recommendation) -> bool {
        self.playlist.lock().contains(recommendation)
    }

    pub fn add_to_playlist(&self, recommendation: Recommendation) -> bool {
        self.playlist.lock().add(recommendation)
    }

    pub fn remove_from_playlist(&self, recommendation: &Recommendation) -> usize {
        self.playlist.lock().remove(recommendation)
    }

    pub fn clear_playlist(&self) {
        self.playlist.lock().clear();
    }

    fn commit<T: Clone>(
        slot: &Mutex<RequestSlot<T>>,
        token: RequestToken,
        result: Result<T, RecommendationError>,
        label: &str,
    ) -> Result<Outcome<T>, RecommendationError> {
        let mut slot = slot.lock();
        if !slot.is_current(token) {
            match result {
                Ok(_) => log::debug!("Discarding stale {} response", label),
                Err(e) => log::debug!("Discarding stale {} failure: {}", label, e),
            }
            return Ok(Outcome::Discarded);
        }

        slot.complete(token, result.clone());
        result.map(Outcome::Applied)
    }
}

/// Today's date in the local time zone.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendations::{GenerationBackend, GenerationRequest};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Answers with five songs by whichever artist the prompt quotes.
    /// Prompts quoting a gated name wait until the gate is opened.
    #[derive(Default)]
    struct GatedBackend {
        gates: Mutex<HashMap<String, Arc<Notify>>>,
        fixed_reply: Mutex<Option<String>>,
        calls: AtomicUsize,
    }

    impl GatedBackend {
        fn gate(&self, name: &str) -> Arc<Notify> {
            let notify = Arc::new(Notify::new());
            self.gates.lock().insert(name.to_string(), notify.clone());
            notify
        }

        fn reply_with(&self, body: &str) {
            *self.fixed_reply.lock() = Some(body.to_string());
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationBackend for GatedBackend {
        fn name(&self) -> &str {
            "Gated API"
        }

        async fn generate(
            &self,
            _api_key: &str,
            request: &GenerationRequest,
        ) -> Result<String, RecommendationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let subject = request
                .prompt
                .split('"')
                .nth(1)
                .unwrap_or("Brent Faiyaz")
                .to_string();

            let gate = self.gates.lock().get(&subject).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            if let Some(body) = self.fixed_reply.lock().clone() {
                return Ok(body);
            }

            let reason = if request.prompt.ends_with("English.") {
                "Smooth and slow."
            } else {
                "부드럽고 느린 곡."
            };
            let songs: Vec<serde_json::Value> = (1..=5)
                .map(|i| {
                    serde_json::json!({
                        "artist": subject,
                        "song": format!("{} Song {}", subject, i),
                        "reason": reason,
                    })
                })
                .collect();
            Ok(serde_json::Value::Array(songs).to_string())
        }
    }

    fn session_with(backend: Arc<GatedBackend>, language: Language) -> RecommendationSession {
        let config = ProviderConfig::default().with_api_key("test-key");
        let provider = RecommendationProvider::new(backend, &config);
        RecommendationSession::new(provider, Arc::new(MemoryStore::new()), language)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    async fn wait_for_calls(backend: &GatedBackend, count: usize) {
        while backend.calls() < count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_search_goes_loading_then_success() {
        let backend = Arc::new(GatedBackend::default());
        let gate = backend.gate("Rainy day");
        let session = Arc::new(session_with(backend.clone(), Language::En));
        assert!(session.search_state().is_idle());

        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.search("Rainy day").await })
        };
        wait_for_calls(&backend, 1).await;
        assert!(session.search_state().is_loading());

        gate.notify_one();
        let outcome = pending.await.unwrap().unwrap();
        match outcome {
            Outcome::Applied(recs) => assert_eq!(recs.len(), 5),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let state = session.search_state();
        let recs = state.value().unwrap();
        assert_eq!(recs.len(), 5);
        assert!(recs.iter().all(|r| r.reason == "Smooth and slow."));
    }

    #[tokio::test]
    async fn test_empty_keyword_sets_error_without_call() {
        let backend = Arc::new(GatedBackend::default());
        let session = session_with(backend.clone(), Language::Ko);

        let err = session.search("  ").await.unwrap_err();
        assert_eq!(
            err,
            RecommendationError::Validation(Language::Ko.empty_keyword_message().to_string())
        );
        assert_eq!(session.search_state().error(), Some(&err));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_late_artist_response_is_discarded() {
        let backend = Arc::new(GatedBackend::default());
        let sza_gate = backend.gate("SZA");
        let session = Arc::new(session_with(backend.clone(), Language::En));

        let sza = {
            let session = session.clone();
            tokio::spawn(async move { session.select_artist("SZA").await })
        };
        wait_for_calls(&backend, 1).await;
        assert_eq!(session.selected_artist().as_deref(), Some("SZA"));

        let frank = session.select_artist("Frank Ocean").await.unwrap();
        assert!(matches!(frank, Outcome::Applied(ref recs) if recs[0].artist == "Frank Ocean"));

        sza_gate.notify_one();
        assert_eq!(sza.await.unwrap().unwrap(), Outcome::Discarded);

        assert_eq!(session.selected_artist().as_deref(), Some("Frank Ocean"));
        let state = session.artist_state();
        let recs = state.value().unwrap();
        assert!(recs.iter().all(|r| r.artist == "Frank Ocean"));
    }

    #[tokio::test]
    async fn test_reselecting_artist_toggles_off() {
        let backend = Arc::new(GatedBackend::default());
        let session = session_with(backend.clone(), Language::En);

        assert!(matches!(
            session.select_artist("SZA").await.unwrap(),
            Outcome::Applied(_)
        ));
        assert_eq!(session.select_artist("SZA").await.unwrap(), Outcome::Cleared);
        assert!(session.artist_state().is_idle());
        assert_eq!(session.selected_artist(), None);
        assert_eq!(backend.calls(), 1);

        // Selecting again after a toggle-off fetches anew
        assert!(matches!(
            session.select_artist("SZA").await.unwrap(),
            Outcome::Applied(_)
        ));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_reselecting_artist_ignores_surrounding_whitespace() {
        let backend = Arc::new(GatedBackend::default());
        let session = session_with(backend.clone(), Language::En);

        assert!(matches!(
            session.select_artist("SZA ").await.unwrap(),
            Outcome::Applied(_)
        ));
        assert_eq!(session.selected_artist().as_deref(), Some("SZA"));

        assert_eq!(session.select_artist("SZA").await.unwrap(), Outcome::Cleared);
        assert_eq!(session.selected_artist(), None);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_deselect_while_loading_discards_response() {
        let backend = Arc::new(GatedBackend::default());
        let gate = backend.gate("SZA");
        let session = Arc::new(session_with(backend.clone(), Language::En));

        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.select_artist("SZA").await })
        };
        wait_for_calls(&backend, 1).await;

        assert_eq!(session.select_artist("SZA").await.unwrap(), Outcome::Cleared);
        gate.notify_one();
        assert_eq!(pending.await.unwrap().unwrap(), Outcome::Discarded);
        assert!(session.artist_state().is_idle());
    }

    #[tokio::test]
    async fn test_song_of_the_day_uses_cache() {
        let backend = Arc::new(GatedBackend::default());
        let session = session_with(backend.clone(), Language::Ko);

        let first = session.load_song_of_the_day_for(day()).await.unwrap();
        let second = session.load_song_of_the_day_for(day()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls(), 1);

        // A new day is a new key
        session
            .load_song_of_the_day_for(day().succ_opt().unwrap())
            .await
            .unwrap();
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_language_switch_uses_other_cache_entry() {
        let backend = Arc::new(GatedBackend::default());
        let session = session_with(backend.clone(), Language::Ko);

        session.load_song_of_the_day_for(day()).await.unwrap();
        assert_eq!(session.toggle_language(), Language::En);
        assert!(session.song_of_the_day_state().is_idle());

        let outcome = session.load_song_of_the_day_for(day()).await.unwrap();
        assert!(matches!(outcome, Outcome::Applied(ref rec) if rec.reason == "Smooth and slow."));
        assert_eq!(backend.calls(), 2);

        // Back to Korean: served from cache
        session.set_language(Language::Ko);
        session.load_song_of_the_day_for(day()).await.unwrap();
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_song_of_the_day_empty_response() {
        let backend = Arc::new(GatedBackend::default());
        backend.reply_with("[]");
        let session = session_with(backend.clone(), Language::En);

        let err = session.load_song_of_the_day_for(day()).await.unwrap_err();
        assert!(matches!(err, RecommendationError::Provider(_)));

        let state = session.song_of_the_day_state();
        assert!(state.value().is_none());
        assert!(state.error().is_some());
    }

    #[test]
    fn test_language_switch_after_begin_leaves_token_stale() {
        let backend = Arc::new(GatedBackend::default());
        let session = session_with(backend, Language::Ko);

        let (token, language) = session.begin(&session.song_of_the_day, None);
        assert_eq!(language, Language::Ko);
        session.set_language(Language::En);
        assert!(!session.song_of_the_day.lock().is_current(token));

        let (token, language) = session.begin(&session.song_of_the_day, None);
        assert_eq!(language, Language::En);
        assert!(session.song_of_the_day.lock().is_current(token));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_visible_song_of_the_day_matches_language_under_contention() {
        let backend = Arc::new(GatedBackend::default());
        let session = Arc::new(session_with(backend, Language::Ko));

        let mut tasks = Vec::new();
        for worker in 0..4u32 {
            let session = session.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..50u32 {
                    if (i + worker) % 3 == 0 {
                        session.toggle_language();
                    }
                    let date = day() + chrono::Days::new(u64::from(i % 5));
                    session.load_song_of_the_day_for(date).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let expected = match session.language() {
            Language::En => "Smooth and slow.",
            Language::Ko => "부드럽고 느린 곡.",
        };
        if let Some(rec) = session.song_of_the_day_state().value() {
            assert_eq!(rec.reason, expected);
        }
    }

    #[tokio::test]
    async fn test_stale_song_of_the_day_still_cached() {
        let backend = Arc::new(GatedBackend::default());
        let gate = backend.gate("Brent Faiyaz");
        let session = Arc::new(session_with(backend.clone(), Language::Ko));

        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.load_song_of_the_day_for(day()).await })
        };
        wait_for_calls(&backend, 1).await;

        session.set_language(Language::En);
        gate.notify_one();
        assert_eq!(pending.await.unwrap().unwrap(), Outcome::Discarded);
        assert!(session.song_of_the_day_state().is_idle());

        // The Korean pick landed in the cache regardless
        session.set_language(Language::Ko);
        session.load_song_of_the_day_for(day()).await.unwrap();
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_playlist_through_session() {
        let backend = Arc::new(GatedBackend::default());
        let session = session_with(backend, Language::En);

        let recs = match session.search("slow jams").await.unwrap() {
            Outcome::Applied(recs) => recs,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert!(session.add_to_playlist(recs[0].clone()));
        assert!(!session.add_to_playlist(recs[0].clone()));
        assert!(session.is_saved(&recs[0]));
        assert!(!session.is_saved(&recs[1]));

        assert_eq!(session.remove_from_playlist(&recs[0]), 1);
        assert!(session.playlist().is_empty());

        session.add_to_playlist(recs[1].clone());
        session.clear_playlist();
        assert!(session.playlist().is_empty());
    }

    #[test]
    fn test_featured_artists() {
        let backend = Arc::new(GatedBackend::default());
        let session = session_with(backend, Language::Ko);
        assert_eq!(
            session.featured_artists(),
            &["The Weeknd", "SZA", "Frank Ocean", "Daniel Caesar"]
        );
    }
}

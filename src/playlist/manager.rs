use crate::models::Recommendation;
use crate::storage::{self, KeyValueStore};
use std::sync::Arc;

/// Storage key of the saved playlist.
pub const PLAYLIST_KEY: &str = "rnb_playlist";

/// The user's saved songs, in the order they were added.
///
/// Every mutation writes the whole list back before returning. A failed
/// write is logged; the in-memory list keeps the change.
pub struct PlaylistStore {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<Recommendation>,
}

impl PlaylistStore {
    /// Load the saved playlist. Missing or corrupt data yields an empty list.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let entries = match storage::load_json::<Vec<Recommendation>>(store.as_ref(), PLAYLIST_KEY)
        {
            Ok(Some(entries)) => {
                log::info!("Loaded playlist with {} song(s)", entries.len());
                entries
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Failed to load playlist, starting empty: {}", e);
                Vec::new()
            }
        };

        Self { store, entries }
    }

    pub fn entries(&self) -> &[Recommendation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a song with the same title and artist is already saved.
    pub fn contains(&self, recommendation: &Recommendation) -> bool {
        self.entries.iter().any(|e| e.same_track(recommendation))
    }

    /// Append `recommendation` unless the same song is already saved.
    ///
    /// Returns `true` if the playlist changed.
    pub fn add(&mut self, recommendation: Recommendation) -> bool {
        if self.contains(&recommendation) {
            log::debug!(
                "'{}' by {} is already in the playlist",
                recommendation.song,
                recommendation.artist
            );
            return false;
        }

        self.entries.push(recommendation);
        self.persist();
        true
    }

    /// Remove every entry for the same song. Returns how many were removed.
    pub fn remove(&mut self, recommendation: &Recommendation) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.same_track(recommendation));
        let removed = before - self.entries.len();

        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// Empty the playlist.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = storage::save_json(self.store.as_ref(), PLAYLIST_KEY, &self.entries) {
            log::warn!("Failed to save playlist: {}", e);
        }
    }
}

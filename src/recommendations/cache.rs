//! Persistent song-of-the-day cache.
//!
//! One entry per calendar day and language. The key itself carries the
//! date, so entries never need an expiry check: tomorrow simply looks up a
//! different key.
//!
//! ```text
//! [Request] → [rnb_song_of_the_day_{date}_{lang}] → [Provider]
//! ```

use crate::models::{Language, Recommendation};
use crate::storage::{self, KeyValueStore};
use chrono::NaiveDate;
use std::sync::Arc;

const KEY_PREFIX: &str = "rnb_song_of_the_day";

#[derive(Clone)]
pub struct DailyCache {
    store: Arc<dyn KeyValueStore>,
}

impl DailyCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Storage key for a day and language, e.g. `rnb_song_of_the_day_2024-05-01_en`.
    pub fn cache_key(date: NaiveDate, language: Language) -> String {
        format!("{}_{}_{}", KEY_PREFIX, date.format("%Y-%m-%d"), language)
    }

    /// Look up the pick for `date` in `language`.
    ///
    /// Unreadable, corrupt or blank-field entries are logged and reported
    /// as a miss.
    pub fn get(&self, date: NaiveDate, language: Language) -> Option<Recommendation> {
        let key = Self::cache_key(date, language);
        match storage::load_json::<Recommendation>(self.store.as_ref(), &key) {
            Ok(Some(rec)) if !rec.is_complete() => {
                log::warn!("Ignoring incomplete song of the day cache '{}'", key);
                None
            }
            Ok(Some(rec)) => {
                log::debug!("Song of the day cache hit for '{}'", key);
                Some(rec)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Ignoring unreadable song of the day cache '{}': {}", key, e);
                None
            }
        }
    }

    /// Store the pick for `date` in `language`, replacing any previous entry.
    ///
    /// A failed write is logged and otherwise ignored.
    pub fn put(&self, date: NaiveDate, language: Language, recommendation: &Recommendation) {
        let key = Self::cache_key(date, language);
        match storage::save_json(self.store.as_ref(), &key, recommendation) {
            Ok(()) => log::debug!("Cached song of the day under '{}'", key),
            Err(e) => log::warn!("Failed to cache song of the day under '{}': {}", key, e),
        }
    }
}

pub mod manager;

pub use manager::{PlaylistStore, PLAYLIST_KEY};

use serde::{Deserialize, Serialize};

/// Artists offered as one-click playlists.
pub const FEATURED_ARTISTS: [&str; 4] = ["The Weeknd", "SZA", "Frank Ocean", "Daniel Caesar"];

/// A single song suggestion returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub artist: String,
    pub song: String,
    /// Short justification, written in the requested language
    pub reason: String,
}

impl Recommendation {
    pub fn new(
        artist: impl Into<String>,
        song: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            artist: artist.into(),
            song: song.into(),
            reason: reason.into(),
        }
    }

    /// Two recommendations name the same track when song and artist match exactly.
    /// The reason is not part of the identity.
    pub fn same_track(&self, other: &Recommendation) -> bool {
        self.song == other.song && self.artist == other.artist
    }

    /// Every field carries visible text.
    pub fn is_complete(&self) -> bool {
        [&self.artist, &self.song, &self.reason]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ko,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
        }
    }

    /// The other language, as flipped by the UI toggle.
    pub fn toggled(self) -> Self {
        match self {
            Language::Ko => Language::En,
            Language::En => Language::Ko,
        }
    }

    /// Sentence appended to every prompt; it only governs the `reason` field.
    pub fn reason_directive(&self) -> &'static str {
        match self {
            Language::Ko => "The reason must be written in Korean.",
            Language::En => "The reason must be written in English.",
        }
    }

    /// Shown when a search is submitted without a keyword.
    pub fn empty_keyword_message(&self) -> &'static str {
        match self {
            Language::Ko => "추천을 받으려면 키워드를 입력해주세요.",
            Language::En => "Please enter a keyword.",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ko" => Ok(Language::Ko),
            "en" => Ok(Language::En),
            _ => Err(format!("Invalid language: {}", s)),
        }
    }
}

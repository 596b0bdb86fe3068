use crate::recommendations::RecommendationError;

/// Visible state of one logical request slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState<T> {
    #[default]
    Idle,
    Loading,
    Success(T),
    Error(RecommendationError),
}

impl<T> SessionState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            SessionState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RecommendationError> {
        match self {
            SessionState::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// Identifies one request issued against a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// A request/response slot guarded by a generation counter.
///
/// Every `begin` or `reset` bumps the generation, so a response can only
/// land if no newer request started (and no reset happened) after it was
/// issued.
#[derive(Debug)]
pub struct RequestSlot<T> {
    generation: u64,
    subject: Option<String>,
    state: SessionState<T>,
}

impl<T> Default for RequestSlot<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            subject: None,
            state: SessionState::Idle,
        }
    }
}

impl<T> RequestSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, dropping the previous result.
    ///
    /// `subject` names what the request is about (keyword, artist).
    pub fn begin(&mut self, subject: Option<String>) -> RequestToken {
        self.generation += 1;
        self.subject = subject;
        self.state = SessionState::Loading;
        RequestToken(self.generation)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.generation
    }

    /// Apply the response for `token`. Returns `false`, leaving the slot
    /// untouched, if a newer request or a reset superseded it.
    pub fn complete(&mut self, token: RequestToken, result: Result<T, RecommendationError>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.state = match result {
            Ok(value) => SessionState::Success(value),
            Err(e) => SessionState::Error(e),
        };
        true
    }

    /// Back to idle with nothing selected; in-flight responses become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.subject = None;
        self.state = SessionState::Idle;
    }

    pub fn state(&self) -> &SessionState<T> {
        &self.state
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }
}

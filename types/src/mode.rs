use std::fmt;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositiveCountError {
    #[error("expected a positive integer, got {0:?}")]
    Invalid(String),
}

fn parse_positive(raw: &str) -> Result<NonZeroUsize, PositiveCountError> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| PositiveCountError::Invalid(raw.trim().to_string()))
}

/// Positive message limit for the "last N messages" mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCount(NonZeroUsize);

impl MessageCount {
    pub fn parse(raw: &str) -> Result<Self, PositiveCountError> {
        parse_positive(raw).map(Self)
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for MessageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positive "N broadcasts ago" selector for the broadcast-scoped mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastsAgo(NonZeroUsize);

impl BroadcastsAgo {
    pub fn parse(raw: &str) -> Result<Self, PositiveCountError> {
        parse_positive(raw).map(Self)
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for BroadcastsAgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What slice of the sender's history a fetch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Everything the log endpoint will page out.
    All,
    /// Stop after N messages.
    LastN(MessageCount),
    /// Only messages sent during the Nth-most-recent archived broadcast.
    FromBroadcast(BroadcastsAgo),
}

//! Events reported by a streaming session

use std::fmt;

/// Error category reported alongside a session error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Media,
    Mux,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "networkError"),
            Self::Media => write!(f, "mediaError"),
            Self::Mux => write!(f, "muxError"),
            Self::Other => write!(f, "otherError"),
        }
    }
}

/// Render an optional error kind, `Unknown` when the session did not say
pub fn kind_label(kind: &Option<ErrorKind>) -> String {
    match kind {
        Some(kind) => kind.to_string(),
        None => "Unknown".to_string(),
    }
}

/// Error payload of a session `Error` event
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{details} [{}]", kind_label(.kind))]
pub struct PlayerError {
    pub fatal: bool,
    pub kind: Option<ErrorKind>,
    pub details: String,
}

impl PlayerError {
    pub fn fatal(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            fatal: true,
            kind: Some(kind),
            details: details.into(),
        }
    }

    pub fn recoverable(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            fatal: false,
            kind: Some(kind),
            details: details.into(),
        }
    }
}

/// Events a session delivers to its subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Playlist loaded and parsed, the stream can start
    ManifestParsed,
    Error(PlayerError),
}

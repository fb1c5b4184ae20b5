//! Status values reported to the UI

use super::events::{kind_label, ErrorKind};

/// Receives status updates from the loader and the card lifecycle
pub trait StatusSink {
    fn update(&self, message: &str, is_error: bool);
}

impl<F> StatusSink for F
where
    F: Fn(&str, bool),
{
    fn update(&self, message: &str, is_error: bool) {
        self(message, is_error)
    }
}

/// Status shown on a camera card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Connecting,
    Live,
    Buffering,
    PlaybackBlocked,
    Offline,
    UnsupportedFormat,
    StreamError(String),
}

impl StreamStatus {
    pub fn stream_error(kind: Option<ErrorKind>) -> Self {
        Self::StreamError(kind_label(&kind))
    }

    pub fn message(&self) -> String {
        match self {
            Self::Connecting => "Connecting...".to_string(),
            Self::Live => "Live".to_string(),
            Self::Buffering => "Buffering...".to_string(),
            Self::PlaybackBlocked => "Playback Blocked".to_string(),
            Self::Offline => "Offline".to_string(),
            Self::UnsupportedFormat => "Unsupported Format".to_string(),
            Self::StreamError(kind) => format!("Stream Error: {}", kind),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::PlaybackBlocked | Self::Offline | Self::UnsupportedFormat | Self::StreamError(_)
        )
    }
}

/// Push a status into a sink
pub fn report_status<K: StatusSink + ?Sized>(sink: &K, status: &StreamStatus) {
    sink.update(&status.message(), status.is_error());
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn test_status_messages() {
        assert_eq!(StreamStatus::Connecting.message(), "Connecting...");
        assert_eq!(StreamStatus::Live.message(), "Live");
        assert_eq!(StreamStatus::PlaybackBlocked.message(), "Playback Blocked");
        assert_eq!(
            StreamStatus::stream_error(Some(ErrorKind::Network)).message(),
            "Stream Error: networkError"
        );
        assert_eq!(
            StreamStatus::stream_error(None).message(),
            "Stream Error: Unknown"
        );
    }

    #[test]
    fn test_status_error_flags() {
        assert!(!StreamStatus::Connecting.is_error());
        assert!(!StreamStatus::Live.is_error());
        assert!(!StreamStatus::Buffering.is_error());
        assert!(StreamStatus::PlaybackBlocked.is_error());
        assert!(StreamStatus::Offline.is_error());
        assert!(StreamStatus::UnsupportedFormat.is_error());
        assert!(StreamStatus::stream_error(None).is_error());
    }

    #[test]
    fn test_closure_sink() {
        let seen = RefCell::new(Vec::new());
        let sink = |message: &str, is_error: bool| {
            seen.borrow_mut().push((message.to_string(), is_error));
        };
        report_status(&sink, &StreamStatus::Offline);
        assert_eq!(seen.into_inner(), vec![("Offline".to_string(), true)]);
    }
}

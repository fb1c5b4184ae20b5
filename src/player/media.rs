//! Collaborator seams: streaming engine, session and media element

use futures::future::BoxFuture;

use super::events::PlayerEvent;

/// MIME type probed for native HLS playback
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Subscriber callback registered on a session
pub type EventHandler = Box<dyn FnMut(&PlayerEvent) + Send>;

/// Playback start was refused by the media element
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    #[error("playback not allowed: {0}")]
    NotAllowed(String),
    #[error("media element detached")]
    Detached,
}

/// Playback events raised by a media element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    Play,
    Waiting,
    LoadedData,
    Error,
}

/// A media element that can play a stream
pub trait MediaElement {
    /// Start playback; may be refused (autoplay policy)
    fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>>;

    fn can_play_type(&self, mime: &str) -> bool;

    /// Point the element at a source for native playback
    fn set_source(&self, url: &str);
}

/// One adaptive-streaming session bound to one media element.
///
/// Events may be delivered synchronously from `load_source`/`attach_media`
/// or later from another task; subscribers must tolerate both.
pub trait StreamingSession {
    fn load_source(&mut self, url: &str);

    fn attach_media(&mut self, media: &dyn MediaElement);

    fn on_event(&mut self, handler: EventHandler);

    /// Release the session; no events are delivered afterwards
    fn destroy(&mut self);
}

/// Factory for streaming sessions
pub trait StreamingEngine {
    type Session: StreamingSession;

    fn is_supported(&self) -> bool;

    fn create_session(&self) -> Self::Session;
}

//! Player module - stream loader and the streaming collaborators it drives

mod events;
mod loader;
mod media;
mod status;

pub use events::{kind_label, ErrorKind, PlayerError, PlayerEvent};
pub use loader::{
    load_with_retry, wait_for_outcome, AttemptSettler, LoadOutcome, LoadReport, RetryPolicy,
    SettleError, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_MS,
};
pub use media::{
    EventHandler, MediaElement, MediaEvent, PlaybackError, StreamingEngine, StreamingSession,
    HLS_MIME_TYPE,
};
pub use status::{report_status, StatusSink, StreamStatus};

//! Stream loader - bounded retry with exponential backoff
//!
//! Each attempt subscribes a single-resolution settler to the session, issues
//! `load_source` + `attach_media`, then suspends until the session reports
//! either a parsed manifest or a fatal error. Failed attempts back off by
//! `base_delay * 2^attempt`; the last failure is reported to the status sink.

use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::events::{kind_label, ErrorKind, PlayerError, PlayerEvent};
use super::media::{EventHandler, MediaElement, StreamingSession};
use super::status::{report_status, StatusSink, StreamStatus};

/// Default number of load attempts per card
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default base backoff delay in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Attempt budget and backoff base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one attempt
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay after the failure of attempt `attempt` (zero-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RETRY_ATTEMPTS,
            Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        )
    }
}

/// Why an attempt did not reach a parsed manifest
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettleError {
    #[error("fatal stream error: {0}")]
    Fatal(PlayerError),
    #[error("session released the attempt without an outcome")]
    Abandoned,
}

impl SettleError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Fatal(err) => err.kind,
            Self::Abandoned => None,
        }
    }
}

/// Resolves one attempt exactly once from the session's event stream
pub struct AttemptSettler {
    sender: Option<oneshot::Sender<Result<(), PlayerError>>>,
}

impl AttemptSettler {
    /// Create a settler and the receiver the loader awaits
    pub fn new() -> (Self, oneshot::Receiver<Result<(), PlayerError>>) {
        let (tx, rx) = oneshot::channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// Feed one event; returns true when this event settled the attempt
    pub fn settle(&mut self, event: &PlayerEvent) -> bool {
        let outcome = match event {
            PlayerEvent::ManifestParsed => Ok(()),
            PlayerEvent::Error(err) if err.fatal => Err(err.clone()),
            PlayerEvent::Error(err) => {
                debug!("Ignoring non-fatal stream error: {}", err);
                return false;
            }
        };

        match self.sender.take() {
            Some(sender) => {
                // Receiver gone means the loader already moved on
                let _ = sender.send(outcome);
                true
            }
            None => false,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.sender.is_none()
    }

    pub fn into_handler(mut self) -> EventHandler {
        Box::new(move |event| {
            self.settle(event);
        })
    }
}

/// Await the settled outcome of one attempt
pub async fn wait_for_outcome(
    receiver: oneshot::Receiver<Result<(), PlayerError>>,
) -> Result<(), SettleError> {
    match receiver.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(SettleError::Fatal(err)),
        Err(_) => Err(SettleError::Abandoned),
    }
}

/// Final result of a load, for logging and summaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Live,
    Failed(Option<ErrorKind>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub attempts: u32,
    pub outcome: LoadOutcome,
}

/// Start a stream on `session`, retrying fatal failures with backoff.
///
/// Every outcome is reported through `sink`; nothing is returned as an error.
pub async fn load_with_retry<S, M, K>(
    session: &mut S,
    media: &M,
    sink: &K,
    url: &str,
    policy: &RetryPolicy,
) -> LoadReport
where
    S: StreamingSession + ?Sized,
    M: MediaElement,
    K: StatusSink + ?Sized,
{
    let max_attempts = policy.max_attempts();
    let mut last_kind = None;

    for attempt in 0..max_attempts {
        info!(
            "Loading stream {} (attempt {}/{})",
            url,
            attempt + 1,
            max_attempts
        );

        // Subscribe before loading so synchronously delivered events are seen
        let (settler, receiver) = AttemptSettler::new();
        session.on_event(settler.into_handler());
        session.load_source(url);
        session.attach_media(media);

        match wait_for_outcome(receiver).await {
            Ok(()) => {
                info!("Stream ready: {}", url);
                report_status(sink, &StreamStatus::Live);
                if let Err(e) = media.play().await {
                    warn!("Playback start failed for {}: {}", url, e);
                    report_status(sink, &StreamStatus::PlaybackBlocked);
                }
                return LoadReport {
                    attempts: attempt + 1,
                    outcome: LoadOutcome::Live,
                };
            }
            Err(e) => {
                last_kind = e.kind();
                if attempt + 1 < max_attempts {
                    let delay = policy.delay_for_attempt(attempt);
                    warn!(
                        "Stream attempt {}/{} failed for {}: {}, retrying in {}ms...",
                        attempt + 1,
                        max_attempts,
                        url,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    warn!(
                        "Stream attempt {}/{} failed for {}: {}, giving up ({})",
                        attempt + 1,
                        max_attempts,
                        url,
                        e,
                        kind_label(&last_kind)
                    );
                    report_status(sink, &StreamStatus::stream_error(last_kind));
                }
            }
        }
    }

    LoadReport {
        attempts: max_attempts,
        outcome: LoadOutcome::Failed(last_kind),
    }
}

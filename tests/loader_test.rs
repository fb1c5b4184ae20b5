//! Tests for the retrying stream loader

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use camwall::player::{
    load_with_retry, ErrorKind, EventHandler, LoadOutcome, MediaElement, PlaybackError,
    PlayerError, PlayerEvent, RetryPolicy, StreamingSession,
};
use futures::future::{self, BoxFuture, FutureExt};
use tokio::time::Instant;

/// Session replaying one scripted event list per attempt
struct ScriptedSession {
    script: VecDeque<Vec<PlayerEvent>>,
    handlers: Vec<EventHandler>,
    loads: Arc<Mutex<Vec<Instant>>>,
    source: Option<String>,
    drop_handlers: bool,
}

impl ScriptedSession {
    fn new(script: Vec<Vec<PlayerEvent>>) -> Self {
        Self {
            script: script.into(),
            handlers: Vec::new(),
            loads: Arc::new(Mutex::new(Vec::new())),
            source: None,
            drop_handlers: false,
        }
    }

    fn load_times(&self) -> Vec<Instant> {
        self.loads.lock().unwrap().clone()
    }
}

impl StreamingSession for ScriptedSession {
    fn load_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
        self.loads.lock().unwrap().push(Instant::now());
    }

    fn attach_media(&mut self, _media: &dyn MediaElement) {
        let events = self
            .script
            .pop_front()
            .unwrap_or_else(|| vec![fatal(ErrorKind::Network)]);
        for event in &events {
            for handler in self.handlers.iter_mut() {
                handler(event);
            }
        }
    }

    fn on_event(&mut self, handler: EventHandler) {
        if !self.drop_handlers {
            self.handlers.push(handler);
        }
    }

    fn destroy(&mut self) {
        self.handlers.clear();
    }
}

struct TestMedia {
    allow_play: bool,
    plays: Mutex<usize>,
}

impl TestMedia {
    fn new(allow_play: bool) -> Self {
        Self {
            allow_play,
            plays: Mutex::new(0),
        }
    }
}

impl MediaElement for TestMedia {
    fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>> {
        *self.plays.lock().unwrap() += 1;
        let result = if self.allow_play {
            Ok(())
        } else {
            Err(PlaybackError::NotAllowed("autoplay blocked".to_string()))
        };
        future::ready(result).boxed()
    }

    fn can_play_type(&self, _mime: &str) -> bool {
        false
    }

    fn set_source(&self, _url: &str) {}
}

fn fatal(kind: ErrorKind) -> PlayerEvent {
    PlayerEvent::Error(PlayerError::fatal(kind, "fatal"))
}

fn non_fatal() -> PlayerEvent {
    PlayerEvent::Error(PlayerError::recoverable(ErrorKind::Media, "bufferStalledError"))
}

fn policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1000))
}

const URL: &str = "http://cam.example/api/v1/stream/abc/hls/index.m3u8";

#[tokio::test(start_paused = true)]
async fn test_three_fatal_errors_exhaust_budget() {
    let mut session = ScriptedSession::new(vec![
        vec![fatal(ErrorKind::Network)],
        vec![fatal(ErrorKind::Network)],
        vec![fatal(ErrorKind::Network)],
        vec![PlayerEvent::ManifestParsed],
    ]);
    let media = TestMedia::new(true);
    let updates = RefCell::new(Vec::new());
    let sink = |message: &str, is_error: bool| {
        updates.borrow_mut().push((message.to_string(), is_error));
    };

    let report = load_with_retry(&mut session, &media, &sink, URL, &policy()).await;

    let loads = session.load_times();
    assert_eq!(loads.len(), 3);
    assert_eq!(loads[1] - loads[0], Duration::from_millis(1000));
    assert_eq!(loads[2] - loads[1], Duration::from_millis(2000));
    assert_eq!(
        updates.into_inner(),
        vec![("Stream Error: networkError".to_string(), true)]
    );
    assert_eq!(report.attempts, 3);
    assert_eq!(report.outcome, LoadOutcome::Failed(Some(ErrorKind::Network)));
    assert_eq!(*media.plays.lock().unwrap(), 0);
    assert_eq!(session.source.as_deref(), Some(URL));
}

#[tokio::test(start_paused = true)]
async fn test_no_wait_after_last_attempt() {
    let mut session = ScriptedSession::new(vec![
        vec![fatal(ErrorKind::Media)],
        vec![fatal(ErrorKind::Media)],
        vec![fatal(ErrorKind::Mux)],
    ]);
    let media = TestMedia::new(true);
    let sink = |_: &str, _: bool| {};

    let start = Instant::now();
    let report = load_with_retry(&mut session, &media, &sink, URL, &policy()).await;

    assert_eq!(start.elapsed(), Duration::from_millis(3000));
    assert_eq!(report.outcome, LoadOutcome::Failed(Some(ErrorKind::Mux)));
}

#[tokio::test(start_paused = true)]
async fn test_success_on_second_attempt_stops_retries() {
    let mut session = ScriptedSession::new(vec![
        vec![fatal(ErrorKind::Network)],
        vec![PlayerEvent::ManifestParsed],
        vec![fatal(ErrorKind::Network)],
    ]);
    let media = TestMedia::new(true);
    let updates = RefCell::new(Vec::new());
    let sink = |message: &str, is_error: bool| {
        updates.borrow_mut().push((message.to_string(), is_error));
    };

    let report = load_with_retry(&mut session, &media, &sink, URL, &policy()).await;

    assert_eq!(session.load_times().len(), 2);
    assert_eq!(report.attempts, 2);
    assert_eq!(report.outcome, LoadOutcome::Live);
    assert_eq!(updates.into_inner(), vec![("Live".to_string(), false)]);
    assert_eq!(*media.plays.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_non_fatal_error_is_ignored() {
    let mut session = ScriptedSession::new(vec![vec![
        non_fatal(),
        non_fatal(),
        PlayerEvent::ManifestParsed,
    ]]);
    let media = TestMedia::new(true);
    let updates = RefCell::new(Vec::new());
    let sink = |message: &str, is_error: bool| {
        updates.borrow_mut().push((message.to_string(), is_error));
    };

    let start = Instant::now();
    let report = load_with_retry(&mut session, &media, &sink, URL, &policy()).await;

    assert_eq!(session.load_times().len(), 1);
    assert_eq!(report.attempts, 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(updates.into_inner(), vec![("Live".to_string(), false)]);
}

#[tokio::test(start_paused = true)]
async fn test_playback_blocked_is_not_retried() {
    let mut session = ScriptedSession::new(vec![vec![PlayerEvent::ManifestParsed]]);
    let media = TestMedia::new(false);
    let updates = RefCell::new(Vec::new());
    let sink = |message: &str, is_error: bool| {
        updates.borrow_mut().push((message.to_string(), is_error));
    };

    let report = load_with_retry(&mut session, &media, &sink, URL, &policy()).await;

    assert_eq!(session.load_times().len(), 1);
    assert_eq!(report.outcome, LoadOutcome::Live);
    assert_eq!(
        updates.into_inner(),
        vec![
            ("Live".to_string(), false),
            ("Playback Blocked".to_string(), true)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_events_after_settle_are_ignored() {
    let mut session = ScriptedSession::new(vec![vec![
        PlayerEvent::ManifestParsed,
        fatal(ErrorKind::Network),
        PlayerEvent::ManifestParsed,
    ]]);
    let media = TestMedia::new(true);
    let updates = RefCell::new(Vec::new());
    let sink = |message: &str, is_error: bool| {
        updates.borrow_mut().push((message.to_string(), is_error));
    };

    let report = load_with_retry(&mut session, &media, &sink, URL, &policy()).await;

    assert_eq!(report.attempts, 1);
    assert_eq!(updates.into_inner(), vec![("Live".to_string(), false)]);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_attempts_report_unknown() {
    let mut session = ScriptedSession::new(vec![]);
    session.drop_handlers = true;
    let media = TestMedia::new(true);
    let updates = RefCell::new(Vec::new());
    let sink = |message: &str, is_error: bool| {
        updates.borrow_mut().push((message.to_string(), is_error));
    };

    let report = load_with_retry(&mut session, &media, &sink, URL, &policy()).await;

    assert_eq!(session.load_times().len(), 3);
    assert_eq!(report.outcome, LoadOutcome::Failed(None));
    assert_eq!(
        updates.into_inner(),
        vec![("Stream Error: Unknown".to_string(), true)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_policy() {
    let mut session = ScriptedSession::new(vec![vec![fatal(ErrorKind::Other)]]);
    let media = TestMedia::new(true);
    let updates = RefCell::new(Vec::new());
    let sink = |message: &str, is_error: bool| {
        updates.borrow_mut().push((message.to_string(), is_error));
    };

    let policy = RetryPolicy::new(1, Duration::from_millis(1000));
    let start = Instant::now();
    let report = load_with_retry(&mut session, &media, &sink, URL, &policy).await;

    assert_eq!(report.attempts, 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(
        updates.into_inner(),
        vec![("Stream Error: otherError".to_string(), true)]
    );
}

//! Tests for camera card lifecycle

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use camwall::catalog::Camera;
use camwall::grid::{CameraCard, CardStatus, PlaybackMode};
use camwall::player::{
    ErrorKind, EventHandler, LoadOutcome, MediaElement, MediaEvent, PlaybackError, PlayerError,
    PlayerEvent, RetryPolicy, StatusSink, StreamingEngine, StreamingSession, HLS_MIME_TYPE,
};
use futures::future::{self, BoxFuture, FutureExt};

type Script = Arc<Mutex<VecDeque<Vec<PlayerEvent>>>>;

struct ScriptedSession {
    script: Script,
    handlers: Vec<EventHandler>,
    destroy_calls: Arc<Mutex<usize>>,
    destroyed: bool,
}

impl StreamingSession for ScriptedSession {
    fn load_source(&mut self, _url: &str) {}

    fn attach_media(&mut self, _media: &dyn MediaElement) {
        if self.destroyed {
            return;
        }
        let events = self.script.lock().unwrap().pop_front().unwrap_or_default();
        for event in &events {
            for handler in self.handlers.iter_mut() {
                handler(event);
            }
        }
    }

    fn on_event(&mut self, handler: EventHandler) {
        if !self.destroyed {
            self.handlers.push(handler);
        }
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.handlers.clear();
        *self.destroy_calls.lock().unwrap() += 1;
    }
}

struct ScriptedEngine {
    supported: bool,
    script: Script,
    destroy_calls: Arc<Mutex<usize>>,
}

impl ScriptedEngine {
    fn new(supported: bool, script: Vec<Vec<PlayerEvent>>) -> Self {
        Self {
            supported,
            script: Arc::new(Mutex::new(script.into())),
            destroy_calls: Arc::new(Mutex::new(0)),
        }
    }

    fn destroy_calls(&self) -> usize {
        *self.destroy_calls.lock().unwrap()
    }
}

impl StreamingEngine for ScriptedEngine {
    type Session = ScriptedSession;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create_session(&self) -> Self::Session {
        ScriptedSession {
            script: self.script.clone(),
            handlers: Vec::new(),
            destroy_calls: self.destroy_calls.clone(),
            destroyed: false,
        }
    }
}

#[derive(Default)]
struct TestMedia {
    native_hls: bool,
    source: Mutex<Option<String>>,
}

impl MediaElement for TestMedia {
    fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>> {
        future::ready(Ok(())).boxed()
    }

    fn can_play_type(&self, mime: &str) -> bool {
        self.native_hls && mime == HLS_MIME_TYPE
    }

    fn set_source(&self, url: &str) {
        *self.source.lock().unwrap() = Some(url.to_string());
    }
}

fn camera() -> Camera {
    Camera {
        id_user: "1001".to_string(),
        devcode: "abc".to_string(),
        name: Some("Front Gate".to_string()),
        stream_url: "http://cam.example/api/v1/stream/abc/hls/index.m3u8".to_string(),
    }
}

fn status(message: &str, is_error: bool) -> CardStatus {
    CardStatus {
        message: message.to_string(),
        is_error,
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10))
}

#[test]
fn test_new_card_is_connecting() {
    let card: CameraCard<ScriptedSession> = CameraCard::new(camera());
    assert_eq!(card.status(), status("Connecting...", false));
    assert_eq!(card.title(), "Front Gate");
    assert!(card.mode().is_none());
}

#[tokio::test]
async fn test_engine_path_goes_live() {
    let engine = ScriptedEngine::new(true, vec![vec![PlayerEvent::ManifestParsed]]);
    let media = TestMedia::default();
    let mut card = CameraCard::new(camera());

    let job = card.mount(&engine, &media).expect("engine job");
    assert_eq!(card.mode(), Some(PlaybackMode::Engine));

    let report = job.run(&media, &fast_policy()).await;
    assert_eq!(report.outcome, LoadOutcome::Live);
    assert_eq!(card.status(), status("Live", false));
}

#[tokio::test(start_paused = true)]
async fn test_engine_path_reports_terminal_error() {
    let fatal = PlayerEvent::Error(PlayerError::fatal(ErrorKind::Network, "manifestLoadError"));
    let engine = ScriptedEngine::new(
        true,
        vec![vec![fatal.clone()], vec![fatal.clone()], vec![fatal]],
    );
    let media = TestMedia::default();
    let mut card = CameraCard::new(camera());

    let job = card.mount(&engine, &media).unwrap();
    let report = job.run(&media, &fast_policy()).await;

    assert_eq!(report.attempts, 3);
    assert_eq!(card.status(), status("Stream Error: networkError", true));
}

#[test]
fn test_native_path_sets_source() {
    let engine = ScriptedEngine::new(false, vec![]);
    let media = TestMedia {
        native_hls: true,
        ..TestMedia::default()
    };
    let mut card = CameraCard::new(camera());

    assert!(card.mount(&engine, &media).is_none());
    assert_eq!(card.mode(), Some(PlaybackMode::Native));
    assert_eq!(
        media.source.lock().unwrap().as_deref(),
        Some(camera().stream_url.as_str())
    );
    assert_eq!(card.status(), status("Connecting...", false));

    card.on_media_event(MediaEvent::LoadedData);
    assert_eq!(card.status(), status("Live", false));

    card.on_media_event(MediaEvent::Error);
    assert_eq!(card.status(), status("Offline", true));
}

#[test]
fn test_unsupported_format_reported_immediately() {
    let engine = ScriptedEngine::new(false, vec![]);
    let media = TestMedia::default();
    let mut card = CameraCard::new(camera());

    assert!(card.mount(&engine, &media).is_none());
    assert_eq!(card.mode(), Some(PlaybackMode::Unsupported));
    assert_eq!(card.status(), status("Unsupported Format", true));
    assert!(media.source.lock().unwrap().is_none());
}

#[test]
fn test_engine_mode_ignores_native_only_events() {
    let engine = ScriptedEngine::new(true, vec![]);
    let media = TestMedia::default();
    let mut card = CameraCard::new(camera());
    let _job = card.mount(&engine, &media);

    card.on_media_event(MediaEvent::Error);
    assert_eq!(card.status(), status("Connecting...", false));

    card.on_media_event(MediaEvent::Waiting);
    assert_eq!(card.status(), status("Buffering...", false));

    card.on_media_event(MediaEvent::Play);
    assert_eq!(card.status(), status("Live", false));
}

#[test]
fn test_cleanup_destroys_once_and_detaches() {
    let engine = ScriptedEngine::new(true, vec![]);
    let media = TestMedia::default();
    let mut card = CameraCard::new(camera());
    let _job = card.mount(&engine, &media);
    let handle = card.handle();

    card.cleanup();
    card.cleanup();
    assert!(card.is_destroyed());
    assert_eq!(engine.destroy_calls(), 1);
    assert!(handle.is_detached());

    handle.update("Live", false);
    assert_eq!(handle.status(), status("Connecting...", false));

    drop(card);
    assert_eq!(engine.destroy_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_removed_card_ignores_late_loader_updates() {
    let engine = ScriptedEngine::new(true, vec![]);
    let media = TestMedia::default();
    let mut card = CameraCard::new(camera());
    let handle = card.handle();

    let job = card.mount(&engine, &media).unwrap();
    drop(card);

    // Destroyed session drops every subscriber, so each attempt is abandoned
    let report = job.run(&media, &fast_policy()).await;
    assert_eq!(report.attempts, 3);
    assert_eq!(report.outcome, LoadOutcome::Failed(None));
    assert_eq!(handle.status(), status("Connecting...", false));
    assert_eq!(engine.destroy_calls(), 1);
}

//! Camera card - per-camera player lifecycle and status

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::catalog::Camera;
use crate::player::{
    load_with_retry, report_status, EventHandler, LoadReport, MediaElement, MediaEvent,
    RetryPolicy, StatusSink, StreamStatus, StreamingEngine, StreamingSession, HLS_MIME_TYPE,
};

/// Status currently shown on a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardStatus {
    pub message: String,
    pub is_error: bool,
}

/// How the card plays its stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Adaptive-streaming session driven by the loader
    Engine,
    /// Media element plays the playlist itself
    Native,
    Unsupported,
}

/// Status sink bound to one card; ignores updates once the card is removed
#[derive(Clone)]
pub struct CardHandle {
    id: String,
    status: Arc<Mutex<CardStatus>>,
    detached: Arc<AtomicBool>,
}

impl CardHandle {
    fn new(id: String) -> Self {
        let initial = StreamStatus::Connecting;
        Self {
            id,
            status: Arc::new(Mutex::new(CardStatus {
                message: initial.message(),
                is_error: initial.is_error(),
            })),
            detached: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn status(&self) -> CardStatus {
        self.status
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }
}

impl StatusSink for CardHandle {
    fn update(&self, message: &str, is_error: bool) {
        if self.is_detached() {
            debug!("Dropping status '{}' for removed card {}", message, self.id);
            return;
        }

        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        status.message = message.to_string();
        status.is_error = is_error;
        info!(
            "Status for {}: {}{}",
            self.id,
            message,
            if is_error { " (error)" } else { "" }
        );
    }
}

/// Session shared between the running loader and the card's cleanup
pub struct SharedSession<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> SharedSession<S> {
    fn new(session: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }
}

impl<S> Clone for SharedSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: StreamingSession> StreamingSession for SharedSession<S> {
    fn load_source(&mut self, url: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .load_source(url);
    }

    fn attach_media(&mut self, media: &dyn MediaElement) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .attach_media(media);
    }

    fn on_event(&mut self, handler: EventHandler) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .on_event(handler);
    }

    fn destroy(&mut self) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .destroy();
    }
}

/// Pending engine load for a mounted card
pub struct StreamJob<S> {
    session: SharedSession<S>,
    sink: CardHandle,
    url: String,
}

impl<S: StreamingSession> StreamJob<S> {
    /// Run the retrying loader to completion
    pub async fn run<M: MediaElement>(mut self, media: &M, policy: &RetryPolicy) -> LoadReport {
        load_with_retry(&mut self.session, media, &self.sink, &self.url, policy).await
    }
}

/// One camera tile in the grid
pub struct CameraCard<S: StreamingSession> {
    camera: Camera,
    handle: CardHandle,
    session: Option<SharedSession<S>>,
    mode: Option<PlaybackMode>,
    destroyed: bool,
}

impl<S: StreamingSession> CameraCard<S> {
    pub fn new(camera: Camera) -> Self {
        let handle = CardHandle::new(camera.id_user.clone());
        Self {
            camera,
            handle,
            session: None,
            mode: None,
            destroyed: false,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn title(&self) -> &str {
        self.camera.display_name()
    }

    pub fn status(&self) -> CardStatus {
        self.handle.status()
    }

    pub fn handle(&self) -> CardHandle {
        self.handle.clone()
    }

    pub fn mode(&self) -> Option<PlaybackMode> {
        self.mode
    }

    /// Choose a playback path for the card.
    ///
    /// Returns the loader job when the engine is supported; native playback and
    /// unsupported media are settled immediately.
    pub fn mount<E, M>(&mut self, engine: &E, media: &M) -> Option<StreamJob<S>>
    where
        E: StreamingEngine<Session = S>,
        M: MediaElement,
    {
        let url = self.camera.stream_url.clone();

        if engine.is_supported() {
            let session = SharedSession::new(engine.create_session());
            self.session = Some(session.clone());
            self.mode = Some(PlaybackMode::Engine);
            return Some(StreamJob {
                session,
                sink: self.handle.clone(),
                url,
            });
        }

        if media.can_play_type(HLS_MIME_TYPE) {
            info!("Using native HLS for {}", url);
            media.set_source(&url);
            self.mode = Some(PlaybackMode::Native);
            return None;
        }

        warn!("Unsupported format for {}", url);
        self.mode = Some(PlaybackMode::Unsupported);
        report_status(&self.handle, &StreamStatus::UnsupportedFormat);
        None
    }

    /// Map a media element event onto the card status
    pub fn on_media_event(&self, event: MediaEvent) {
        let native = self.mode == Some(PlaybackMode::Native);
        let status = match event {
            MediaEvent::Play => StreamStatus::Live,
            MediaEvent::Waiting => StreamStatus::Buffering,
            MediaEvent::LoadedData if native => StreamStatus::Live,
            MediaEvent::Error if native => {
                warn!("Native playback error for {}", self.camera.stream_url);
                StreamStatus::Offline
            }
            _ => return,
        };
        report_status(&self.handle, &status);
    }

    /// Release the session (at most once) and detach the card's status
    pub fn cleanup(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if !self.destroyed {
                info!("Releasing stream session for {}", self.camera.id_user);
                session.destroy();
                self.destroyed = true;
            }
        }
        self.handle.detach();
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl<S: StreamingSession> Drop for CameraCard<S> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

//! Streaming session that checks a playlist over HTTP

use std::sync::{Arc, Mutex};

use anyhow::Result;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::Config;
use crate::player::{
    ErrorKind, EventHandler, MediaElement, PlayerError, PlayerEvent, StreamingEngine,
    StreamingSession,
};

/// First line of every HLS playlist
const PLAYLIST_TAG: &str = "#EXTM3U";

/// Fetch `url` and classify the response as a session event
pub async fn probe_manifest(client: &Client, url: &str) -> PlayerEvent {
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            return PlayerEvent::Error(PlayerError::fatal(
                ErrorKind::Network,
                format!("manifestLoadError: {}", e),
            ));
        }
    };

    let status = response.status();
    if !status.is_success() {
        return PlayerEvent::Error(PlayerError::fatal(
            ErrorKind::Network,
            format!("manifestLoadError: HTTP {}", status),
        ));
    }

    match response.text().await {
        Ok(body) if body.trim_start().starts_with(PLAYLIST_TAG) => PlayerEvent::ManifestParsed,
        Ok(_) => PlayerEvent::Error(PlayerError::fatal(
            ErrorKind::Other,
            "manifestParsingError: no #EXTM3U header",
        )),
        Err(e) => PlayerEvent::Error(PlayerError::fatal(
            ErrorKind::Network,
            format!("manifestLoadError: {}", e),
        )),
    }
}

type Handlers = Arc<Mutex<Vec<EventHandler>>>;

/// Deliver `event` to every subscriber
fn dispatch(handlers: &Handlers, event: &PlayerEvent) {
    let mut handlers = handlers.lock().unwrap_or_else(|e| e.into_inner());
    for handler in handlers.iter_mut() {
        handler(event);
    }
}

/// Session whose "manifest parsed" means the playlist downloaded and looked valid
pub struct HttpManifestSession {
    client: Client,
    source: Option<String>,
    handlers: Handlers,
    task: Option<JoinHandle<()>>,
    destroyed: bool,
}

impl HttpManifestSession {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            source: None,
            handlers: Arc::new(Mutex::new(Vec::new())),
            task: None,
            destroyed: false,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl StreamingSession for HttpManifestSession {
    fn load_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
    }

    /// Starts the playlist fetch for the loaded source
    fn attach_media(&mut self, _media: &dyn MediaElement) {
        if self.destroyed {
            return;
        }
        let Some(url) = self.source.clone() else {
            return;
        };

        if let Some(task) = self.task.take() {
            task.abort();
        }

        let client = self.client.clone();
        let handlers = self.handlers.clone();
        self.task = Some(tokio::spawn(async move {
            let event = probe_manifest(&client, &url).await;
            debug!("Manifest probe for {}: {:?}", url, event);
            dispatch(&handlers, &event);
        }));
    }

    fn on_event(&mut self, handler: EventHandler) {
        if self.destroyed {
            return;
        }
        self.handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handler);
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Drop for HttpManifestSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Engine producing HTTP playlist sessions sharing one client
pub struct HttpManifestEngine {
    client: Client,
}

impl HttpManifestEngine {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl StreamingEngine for HttpManifestEngine {
    type Session = HttpManifestSession;

    fn is_supported(&self) -> bool {
        true
    }

    fn create_session(&self) -> Self::Session {
        HttpManifestSession::new(self.client.clone())
    }
}

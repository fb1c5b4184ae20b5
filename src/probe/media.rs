//! Media element without a screen

use std::sync::Mutex;

use futures::future::{self, BoxFuture, FutureExt};

use crate::player::{MediaElement, PlaybackError};

/// Accepts playback unconditionally and has no native HLS support
#[derive(Default)]
pub struct HeadlessMedia {
    source: Mutex<Option<String>>,
}

impl HeadlessMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<String> {
        self.source
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl MediaElement for HeadlessMedia {
    fn play(&self) -> BoxFuture<'_, Result<(), PlaybackError>> {
        future::ready(Ok(())).boxed()
    }

    fn can_play_type(&self, _mime: &str) -> bool {
        false
    }

    fn set_source(&self, url: &str) {
        *self.source.lock().unwrap_or_else(|e| e.into_inner()) = Some(url.to_string());
    }
}

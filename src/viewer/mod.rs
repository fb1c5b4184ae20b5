//! Viewer module
//! Local web server for watching the camera wall in a browser

pub mod server;
pub mod templates;

pub use server::ViewerServer;
pub use templates::VIEWER_UI_HTML;

use tracing::{info, warn};

/// Open `url` in the default browser; failures are only logged
pub fn open_browser(url: &str) {
    info!("Opening browser: {}", url);
    if let Err(e) = open::that(url) {
        warn!("Failed to open browser: {}. Please open manually: {}", e, url);
    }
}

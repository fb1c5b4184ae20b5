//! camwall library - live camera wall with retrying HLS stream loader

pub mod catalog;
pub mod config;
pub mod grid;
pub mod http_logger;
pub mod player;
pub mod probe;
pub mod viewer;

// Re-export commonly used types
pub use catalog::{Camera, CameraRecord, CatalogManager, FileStorage, UpdateStats};
pub use config::{Config, ConfigOptions};
pub use grid::{CameraCard, GridView, Paginator};
pub use player::{load_with_retry, LoadOutcome, LoadReport, RetryPolicy, StatusSink, StreamStatus};
pub use viewer::ViewerServer;

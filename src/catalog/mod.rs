//! Camera catalogue: records, file storage and the refresh pipeline

mod camera;
mod manager;
mod storage;

pub use camera::{Camera, CameraRecord, UNNAMED_CAMERA};
pub use manager::{CatalogManager, UpdateStats};
pub use storage::FileStorage;

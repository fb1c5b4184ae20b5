//! Grid module - paginated camera cards

mod card;
mod debounce;
mod pagination;
mod view;

pub use card::{CameraCard, CardHandle, CardStatus, PlaybackMode, SharedSession, StreamJob};
pub use debounce::Debouncer;
pub use pagination::{PageButton, Paginator};
pub use view::{render_page, GridView, PageRequest, RenderedPage};

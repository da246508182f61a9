//! Transform engine for a swipeable, zoomable gallery.
//!
//! Raw pointer samples flow through [`GestureRecognizer`] into the
//! [`ZoomController`] of the current item, which either consumes them or
//! hands them to the [`PagingCoordinator`]. Everything is advanced by a
//! monotonic timestamp passed to `tick`; nothing here spawns threads or
//! reads a clock.

pub mod animation;
pub mod config;
pub mod geometry;
pub mod gesture;
pub mod paging;
pub mod scroller;
pub mod velocity;
pub mod zoom;

pub use animation::{Easing, RectAnimation};
pub use config::{ConfigError, GalleryConfig};
pub use geometry::{
    aligned_rect, available_translate_space, fit_center_rect, get_transform, transformed_rect,
    Point, Rect, Size, Transform, TranslateSpace,
};
pub use gesture::{
    GestureEvent, GesturePhase, GestureRecognizer, GestureState, PointerEvent, RecognizerConfig,
    ScheduledTask,
};
pub use paging::{Command, GalleryEvent, GallerySnapshot, PagingCoordinator};
pub use scroller::{ScrollStep, Scroller};
pub use velocity::VelocityTracker;
pub use zoom::{ZoomController, ZoomEvent};

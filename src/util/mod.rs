//! UI-facing helpers: drawer resizing, value text round-trips, save box.

pub mod resize;
pub mod save_controls;
pub mod value;

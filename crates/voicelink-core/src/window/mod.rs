//! Window registry and the UI window contract.

mod port;
mod registry;

pub use {
    port::{CONTENT_WINDOW_ID, STATUS_WINDOW_ID, WindowFactory, WindowPort},
    registry::WindowRegistry,
};

//! Area Bars
//!
//! Client-side titlebars for the Area compositor: a title, a row of
//! circular buttons with icons, and click/drag handling on top of every
//! decorated window.

pub mod bar;
pub mod buttons;
pub mod config;
pub mod events;
pub mod geometry;
pub mod host;
pub mod interaction;
pub mod manager;
pub mod render;

#[cfg(test)]
mod testing;

pub use bar::{Bar, DirtyFlags, Frame};
pub use buttons::{ButtonDescriptor, ButtonRegistry};
pub use config::{BarsConfig, ButtonConfig};
pub use events::{CallbackRegistry, EventBus, EventKind, Subscription};
pub use host::{Host, HostAction, MemoryHost, WindowId, WindowSnapshot};
pub use manager::BarManager;

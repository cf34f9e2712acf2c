//! Frame composition and the panels frames are pushed to.

pub mod frame;
pub mod oled;
pub mod panel;
pub mod screens;

pub use frame::Frame;
pub use panel::{MemoryPanel, Panel};

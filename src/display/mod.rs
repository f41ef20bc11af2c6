// src/display/mod.rs
//! Full-screen presentation on external display servers.
//!
//! - `driver`: the seams between the crash screen and a display server
//!   (`FullscreenClient`, `OutputSurface`, `ScreenPainter`, `DisplayConnector`)
//! - `output`: output descriptions (`OutputInfo`, `Transform`)
//! - `drivers`: Wayland and headless implementations

pub mod driver;
pub mod drivers;
pub mod output;

pub use driver::{DisplayConnector, FullscreenClient, OutputSurface, ScreenPainter};
pub use drivers::headless::{HeadlessClient, HeadlessDisplay, HeadlessFrame, HeadlessSurface};
pub use drivers::wayland::{WaylandClient, WaylandDisplay};
pub use output::{OutputInfo, Transform};

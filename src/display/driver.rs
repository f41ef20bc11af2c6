// src/display/driver.rs
//! Seams between the crash screen and a display server.
//!
//! ## Threading Model
//! - `FullscreenClient::run` blocks the calling thread on the display
//!   server's event loop and calls the `ScreenPainter` from that thread
//!   whenever an output needs a new frame.
//! - `FullscreenClient::stop` may be called from any other thread and makes
//!   `run` return.
//!
//! ## Lifecycle
//! 1. `DisplayConnector::connect()` - one client per `run` cycle
//! 2. `run(painter)` - per output: create a full-screen surface, then
//!    `draw_screen` on every configure/redraw request
//! 3. `stop()` - from anywhere
//! 4. `Drop` - surfaces and buffers are destroyed with the client

use crate::colour::ChannelOrder;
use crate::display::output::OutputInfo;
use crate::geometry::Size;
use anyhow::Result;

/// A full-screen surface on one output, as seen from a single draw call.
pub trait OutputSurface {
    /// Byte order of pixels in the memory handed out by `buffer`.
    fn channel_order(&self) -> ChannelOrder;

    /// Returns memory for one frame of `size`, with a stride of
    /// `4 * size.width`. Any previous buffer of a different size is replaced.
    fn buffer(&mut self, size: Size) -> Result<&mut [u8]>;

    /// Attaches the buffer last returned by `buffer`, applies the output's
    /// scale factor and commits the surface.
    fn present(&mut self, scale_factor: i32) -> Result<()>;
}

/// Paints a complete frame for one output.
pub trait ScreenPainter: Send + Sync {
    fn draw_screen(&self, output: &OutputInfo, surface: &mut dyn OutputSurface);
}

/// A client that covers every output of a display with a full-screen surface.
pub trait FullscreenClient: Send + Sync {
    /// Runs the client's event loop until `stop` is called or the display
    /// goes away.
    fn run(&self, painter: &dyn ScreenPainter) -> Result<()>;

    /// Requests that `run` return. Calling it before `run` makes `run`
    /// return as soon as it has started.
    fn stop(&self);
}

/// Something that can open a `FullscreenClient` on a display.
pub trait DisplayConnector {
    type Client: FullscreenClient + 'static;

    fn connect(&self) -> Result<Self::Client>;
}

//! The crash screen overlay controller.
//!
//! `CrashReporter` owns the text renderer and the background colour, paints
//! every output it is asked to (background fill, then one status line) and
//! manages one full-screen client at a time:
//!
//! 1. `run(&connector)` connects a client, registers it as live, blocks in
//!    its event loop and deregisters it when the loop ends.
//! 2. `stop()` asks the live client, if there is one, to end its loop. It may
//!    be called from any thread.

pub mod background;
pub mod live;
pub mod status;

pub use live::LiveInstance;
pub use status::StatusLine;

use crate::colour::Colour;
use crate::config::Config;
use crate::display::{DisplayConnector, FullscreenClient, OutputInfo, OutputSurface, ScreenPainter};
use crate::pixel_buffer::PixelBuffer;
use crate::rasterizer::{FontDriver, FreeTypeDriver, InitError, TextRenderer};
use anyhow::{Context, Result};
use log::{debug, error, info, trace};
use std::sync::{Arc, Mutex, PoisonError};

pub struct CrashReporter<D: FontDriver = FreeTypeDriver> {
    renderer: TextRenderer<D>,
    background: Mutex<Colour>,
    status: StatusLine,
    live: LiveInstance<dyn FullscreenClient>,
}

impl CrashReporter<FreeTypeDriver> {
    /// Builds a reporter drawing with the default system font.
    ///
    /// Fails if the font cannot be found or loaded; without it the crash
    /// screen cannot be drawn at all.
    pub fn new(config: &Config) -> Result<Self, InitError> {
        Ok(Self::with_renderer(config, TextRenderer::new()?))
    }
}

impl<D: FontDriver> CrashReporter<D> {
    pub fn with_renderer(config: &Config, renderer: TextRenderer<D>) -> Self {
        let reporter = Self {
            renderer,
            background: Mutex::new(Colour::BLACK),
            status: StatusLine::from_config(&config.status),
            live: LiveInstance::new(),
        };
        reporter.set_background_colour(&config.background);
        reporter
    }

    /// Sets the background from an `RRGGBB` hex string. Malformed input is
    /// ignored and the current colour kept.
    pub fn set_background_colour(&self, hex: &str) {
        let mut background = self.background.lock().unwrap_or_else(PoisonError::into_inner);
        if background.set_from_hex(hex) {
            debug!("CrashReporter: background colour is now {:?}", *background);
        }
    }

    pub fn background_colour(&self) -> Colour {
        *self.background.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connects a full-screen client and runs it until it is stopped.
    pub fn run<C: DisplayConnector>(&self, connector: &C) -> Result<()> {
        let client: Arc<dyn FullscreenClient> =
            Arc::new(connector.connect().context("Failed to connect full-screen client")?);
        self.live.register(Arc::clone(&client));
        info!("CrashReporter: running");

        let result = client.run(self);

        // A concurrent `run` may have registered its own client since.
        self.live.clear_if_current(&client);
        info!("CrashReporter: client finished");
        result.context("Full-screen client failed")
    }

    /// Asks the running client, if any, to stop. Returns whether there was
    /// one.
    pub fn stop(&self) -> bool {
        match self.live.current() {
            Some(client) => {
                info!("CrashReporter: stopping client");
                client.stop();
                true
            }
            None => {
                debug!("CrashReporter: stop requested with no running client");
                false
            }
        }
    }

    /// Paints one full frame for `output` into `surface` and presents it.
    ///
    /// Outputs with a non-positive effective width or height are skipped.
    /// Failures are logged and only affect this frame.
    pub fn draw(&self, output: &OutputInfo, surface: &mut dyn OutputSurface) {
        let size = output.effective_size();
        if size.width <= 0 || size.height <= 0 {
            trace!("CrashReporter: skipping degenerate output {:?}", output);
            return;
        }

        let order = surface.channel_order();
        let background = self.background_colour().in_order(order);
        let text_colour = self.status.colour.in_order(order);
        // Read before taking any renderer lock.
        let text = self.status.text();

        let data = match surface.buffer(size) {
            Ok(data) => data,
            Err(e) => {
                error!("CrashReporter: no {}x{} buffer: {:#}", size.width, size.height, e);
                return;
            }
        };
        let Some(mut buffer) = PixelBuffer::new(data, size) else {
            error!("CrashReporter: surface buffer too small for {}x{}", size.width, size.height);
            return;
        };

        background::fill(&mut buffer, background);
        self.renderer.render(
            &mut buffer,
            &*text,
            self.status.top_left,
            self.status.height_px,
            text_colour,
        );

        if let Err(e) = surface.present(output.scale_factor) {
            error!("CrashReporter: failed to present frame: {:#}", e);
        }
    }
}

impl<D: FontDriver> ScreenPainter for CrashReporter<D> {
    fn draw_screen(&self, output: &OutputInfo, surface: &mut dyn OutputSurface) {
        self.draw(output, surface);
    }
}

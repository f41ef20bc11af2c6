//! Headless display implementation.
//!
//! Keeps frames in memory instead of presenting them. Used by tests and for
//! rendering the crash screen without a display server.

use crate::colour::ChannelOrder;
use crate::display::driver::{DisplayConnector, FullscreenClient, OutputSurface, ScreenPainter};
use crate::display::output::OutputInfo;
use crate::geometry::Size;
use crate::pixel_buffer::BYTES_PER_PIXEL;
use anyhow::{anyhow, Result};
use log::{info, trace};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// An in-memory surface with RGBA byte order.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    data: Vec<u8>,
    size: Size,
    buffers_created: usize,
    presented: Option<i32>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// How many times the backing memory had to be (re)allocated.
    pub fn buffers_created(&self) -> usize {
        self.buffers_created
    }

    /// Scale factor passed to the last `present`, if any.
    pub fn presented_scale(&self) -> Option<i32> {
        self.presented
    }
}

impl OutputSurface for HeadlessSurface {
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgba
    }

    fn buffer(&mut self, size: Size) -> Result<&mut [u8]> {
        if size.area() == 0 {
            return Err(anyhow!("Cannot allocate a {}x{} buffer", size.width, size.height));
        }
        if size != self.size {
            self.data = vec![0; size.area() * BYTES_PER_PIXEL];
            self.size = size;
            self.buffers_created += 1;
        }
        self.presented = None;
        Ok(&mut self.data)
    }

    fn present(&mut self, scale_factor: i32) -> Result<()> {
        if self.data.is_empty() {
            return Err(anyhow!("Nothing to present"));
        }
        trace!("HeadlessSurface: present {:?} at scale {}", self.size, scale_factor);
        self.presented = Some(scale_factor);
        Ok(())
    }
}

/// A frame presented to a headless output.
#[derive(Debug, Clone)]
pub struct HeadlessFrame {
    pub output: OutputInfo,
    pub size: Size,
    pub scale_factor: i32,
    pub pixels: Vec<u8>,
}

/// A fake display with a fixed set of outputs.
///
/// Every client it opens draws each output once when `run` starts and keeps
/// the presented frames, shared by all clients of this display.
#[derive(Debug, Clone, Default)]
pub struct HeadlessDisplay {
    outputs: Vec<OutputInfo>,
    frames: Arc<Mutex<Vec<HeadlessFrame>>>,
}

impl HeadlessDisplay {
    pub fn new(outputs: Vec<OutputInfo>) -> Self {
        Self {
            outputs,
            frames: Arc::default(),
        }
    }

    /// Frames presented so far, in presentation order.
    pub fn frames(&self) -> Vec<HeadlessFrame> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl DisplayConnector for HeadlessDisplay {
    type Client = HeadlessClient;

    fn connect(&self) -> Result<HeadlessClient> {
        info!("HeadlessDisplay: connecting with {} output(s)", self.outputs.len());
        Ok(HeadlessClient {
            outputs: self.outputs.clone(),
            frames: Arc::clone(&self.frames),
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        })
    }
}

/// Client of a `HeadlessDisplay`.
#[derive(Debug)]
pub struct HeadlessClient {
    outputs: Vec<OutputInfo>,
    frames: Arc<Mutex<Vec<HeadlessFrame>>>,
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl HeadlessClient {
    fn draw_outputs(&self, painter: &dyn ScreenPainter) {
        for output in &self.outputs {
            let mut surface = HeadlessSurface::new();
            painter.draw_screen(output, &mut surface);

            if let Some(scale_factor) = surface.presented_scale() {
                self.frames
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(HeadlessFrame {
                        output: *output,
                        size: surface.size(),
                        scale_factor,
                        pixels: surface.data,
                    });
            }
        }
    }
}

impl FullscreenClient for HeadlessClient {
    fn run(&self, painter: &dyn ScreenPainter) -> Result<()> {
        self.draw_outputs(painter);

        let mut stopped = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        while !*stopped {
            stopped = self.wake.wait(stopped).unwrap_or_else(PoisonError::into_inner);
        }
        info!("HeadlessClient: stopped");
        Ok(())
    }

    fn stop(&self) {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.wake.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_reallocated_only_when_the_size_changes() {
        let mut surface = HeadlessSurface::new();
        assert_eq!(surface.buffer(Size::new(4, 2)).unwrap().len(), 32);
        surface.buffer(Size::new(4, 2)).unwrap()[0] = 7;
        assert_eq!(surface.buffers_created(), 1);
        assert_eq!(surface.pixels()[0], 7);

        assert_eq!(surface.buffer(Size::new(2, 4)).unwrap().len(), 32);
        assert_eq!(surface.buffers_created(), 2);
        assert!(surface.buffer(Size::new(0, 4)).is_err());
    }

    #[test]
    fn present_requires_a_buffer() {
        let mut surface = HeadlessSurface::new();
        assert!(surface.present(1).is_err());
        surface.buffer(Size::new(1, 1)).unwrap();
        surface.present(2).unwrap();
        assert_eq!(surface.presented_scale(), Some(2));
    }
}

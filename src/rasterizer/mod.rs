//! Text rasterization for the crash screen.
//!
//! ```text
//! &[u8] text ──► utf8::decode_text ──► [char]
//!                                        │
//!        FontDriver (FreeType / headless) ◄┘  set_pixel_height, rasterize
//!                                        │
//!        compositor::composite_glyph ◄────┘  coverage bitmap + placement
//!                                        │
//!                               PixelBuffer (surface memory)
//! ```
//!
//! `TextRenderer` ties the pieces together and owns the driver behind a lock.
//! `font_locator` finds the font file the FreeType driver loads.

pub mod compositor;
pub mod font_driver;
pub mod font_locator;
pub mod freetype_driver;
pub mod headless_font_driver;
pub mod text_renderer;
pub mod utf8;

pub use compositor::composite_glyph;
pub use font_driver::{FontDriver, GlyphBitmap, GlyphError, InitError, RasterizedGlyph};
pub use font_locator::{locate_default_font, locate_font, FontCandidate};
pub use freetype_driver::FreeTypeDriver;
pub use headless_font_driver::HeadlessFontDriver;
pub use text_renderer::TextRenderer;
pub use utf8::decode_text;

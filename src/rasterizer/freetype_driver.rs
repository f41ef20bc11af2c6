//! FreeType font driver.
//!
//! Thin RAII wrappers around the FreeType library and face handles, and a
//! `FontDriver` implementation that renders 8-bit anti-aliased coverage
//! bitmaps through the face's glyph slot.

use crate::rasterizer::font_driver::{FontDriver, GlyphBitmap, GlyphError, InitError, RasterizedGlyph};
use freetype_sys::{
    FT_Done_Face, FT_Done_FreeType, FT_Error, FT_Face, FT_Get_Char_Index, FT_Init_FreeType,
    FT_Library, FT_Load_Glyph, FT_New_Face, FT_Render_Glyph, FT_Set_Pixel_Sizes,
    FT_RENDER_MODE_NORMAL,
};
use log::{trace, warn};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;

const FT_ERR_OK: FT_Error = 0;
const FT_ERR_UNKNOWN_FILE_FORMAT: FT_Error = 0x02;
const FT_LOAD_DEFAULT: i32 = 0;

/// Owns an `FT_Library`, released with `FT_Done_FreeType` on drop.
#[derive(Debug)]
struct Library {
    raw: FT_Library,
}

impl Library {
    fn init() -> Result<Self, InitError> {
        let mut raw: FT_Library = ptr::null_mut();
        // SAFETY: FT_Init_FreeType writes a fresh handle into `raw` on success.
        let error = unsafe { FT_Init_FreeType(&mut raw) };
        if error != FT_ERR_OK {
            return Err(InitError::Engine(error));
        }
        Ok(Self { raw })
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        if self.raw.is_null() {
            return;
        }
        // SAFETY: `raw` came from FT_Init_FreeType and every face created from
        // it has already been released (see field order in FreeTypeDriver).
        let error = unsafe { FT_Done_FreeType(self.raw) };
        if error != FT_ERR_OK {
            warn!("Failed to uninitialize FreeType with error {}", error);
        }
        self.raw = ptr::null_mut();
    }
}

/// Owns an `FT_Face`, released with `FT_Done_Face` on drop.
#[derive(Debug)]
struct Face {
    raw: FT_Face,
}

impl Face {
    fn open(library: &Library, path: &Path) -> Result<Self, InitError> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| InitError::InvalidPath(path.to_path_buf()))?;

        let mut raw: FT_Face = ptr::null_mut();
        // SAFETY: `library.raw` is a live library handle and `c_path` is a
        // NUL-terminated string that outlives the call.
        let error = unsafe { FT_New_Face(library.raw, c_path.as_ptr(), 0, &mut raw) };
        match error {
            FT_ERR_OK => Ok(Self { raw }),
            FT_ERR_UNKNOWN_FILE_FORMAT => Err(InitError::UnsupportedFormat(path.to_path_buf())),
            code => Err(InitError::Load {
                path: path.to_path_buf(),
                code,
            }),
        }
    }
}

impl Drop for Face {
    fn drop(&mut self) {
        if self.raw.is_null() {
            return;
        }
        // SAFETY: `raw` came from FT_New_Face and is released exactly once.
        let error = unsafe { FT_Done_Face(self.raw) };
        if error != FT_ERR_OK {
            warn!("Failed to uninitialize font face with error {}", error);
        }
        self.raw = ptr::null_mut();
    }
}

/// A FreeType library with one loaded face.
#[derive(Debug)]
pub struct FreeTypeDriver {
    // Declared before `library` so the face is released first.
    face: Face,
    library: Library,
}

// SAFETY: FreeType handles have no thread affinity. The driver is only
// reachable through `&mut self`, so a library and its face are never used
// from two threads at once.
unsafe impl Send for FreeTypeDriver {}

impl FreeTypeDriver {
    /// Initializes FreeType and loads the face at `path`.
    pub fn new(path: &Path) -> Result<Self, InitError> {
        let library = Library::init()?;
        let face = Face::open(&library, path)?;
        trace!("FreeTypeDriver: loaded face from {}", path.display());
        Ok(Self { face, library })
    }
}

impl FontDriver for FreeTypeDriver {
    fn set_pixel_height(&mut self, height_px: u32) -> Result<(), GlyphError> {
        // SAFETY: the face handle is live for the lifetime of `self`.
        let error = unsafe { FT_Set_Pixel_Sizes(self.face.raw, 0, height_px) };
        if error != FT_ERR_OK {
            return Err(GlyphError::PixelSize {
                height_px,
                code: error,
            });
        }
        Ok(())
    }

    fn rasterize(&mut self, ch: char) -> Result<RasterizedGlyph<'_>, GlyphError> {
        debug_assert!(!self.library.raw.is_null());
        let face = self.face.raw;

        // SAFETY: all calls operate on the live face owned by `self`. The
        // glyph slot and its bitmap stay valid until the next load on this
        // face, which cannot happen while the returned borrow of `self` lives.
        unsafe {
            let index = FT_Get_Char_Index(face, ch as _);

            let error = FT_Load_Glyph(face, index, FT_LOAD_DEFAULT);
            if error != FT_ERR_OK {
                return Err(GlyphError::Load { ch, index, code: error });
            }

            let slot = (*face).glyph;
            let error = FT_Render_Glyph(slot, FT_RENDER_MODE_NORMAL);
            if error != FT_ERR_OK {
                return Err(GlyphError::Render { ch, index, code: error });
            }

            let raw_bitmap = &(*slot).bitmap;
            let width = raw_bitmap.width as u32;
            let rows = raw_bitmap.rows as u32;
            let pitch = raw_bitmap.pitch as i32;
            let len = pitch.unsigned_abs() as usize * rows as usize;
            let buffer = if raw_bitmap.buffer.is_null() || len == 0 {
                &[][..]
            } else {
                std::slice::from_raw_parts(raw_bitmap.buffer as *const u8, len)
            };

            Ok(RasterizedGlyph {
                bitmap: GlyphBitmap {
                    width,
                    rows,
                    pitch,
                    buffer,
                },
                bitmap_left: (*slot).bitmap_left as i32,
                bitmap_top: (*slot).bitmap_top as i32,
                advance_x: (*slot).advance.x as i64,
                advance_y: (*slot).advance.y as i64,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_log::test;

    #[test]
    fn non_font_files_are_an_unsupported_format() {
        let mut file = tempfile::Builder::new().suffix(".ttf").tempfile().unwrap();
        writeln!(file, "this is not a font").unwrap();

        match FreeTypeDriver::new(file.path()) {
            Err(InitError::UnsupportedFormat(path)) => assert_eq!(path, file.path()),
            other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn missing_files_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("Missing-B.ttf");

        match FreeTypeDriver::new(&missing) {
            Err(InitError::Load { path, code }) => {
                assert_eq!(path, missing);
                assert_ne!(code, FT_ERR_OK);
            }
            other => panic!("expected Load, got {:?}", other.map(|_| ())),
        }
    }
}

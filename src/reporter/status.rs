//! The single line of status text shown on the crash screen.

use crate::colour::Colour;
use crate::config::StatusConfig;
use crate::geometry::Point;
use log::{debug, warn};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

const SNAP_VAR: &str = "SNAP";

/// What to draw, where, and how large.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub colour: Colour,
    pub top_left: Point,
    pub height_px: i32,
    /// When set, the file's last non-empty line is drawn instead of `text`.
    pub log_path: Option<PathBuf>,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::from_config(&StatusConfig::default())
    }
}

impl StatusLine {
    pub fn from_config(config: &StatusConfig) -> Self {
        let mut colour = Colour::WHITE;
        if !colour.set_from_hex(&config.colour) {
            warn!("Status text colour {:?} is not RRGGBB; using white", config.colour);
        }
        Self {
            text: config.text.clone(),
            colour,
            top_left: Point::new(config.x, config.y),
            height_px: config.height_px,
            log_path: config
                .log_path
                .as_deref()
                .map(|path| expand_snap(path, std::env::var_os(SNAP_VAR).as_deref())),
        }
    }

    /// The bytes to render for the next frame.
    pub fn text(&self) -> Cow<'_, [u8]> {
        let Some(path) = &self.log_path else {
            return Cow::Borrowed(self.text.as_bytes());
        };

        match std::fs::read(path) {
            Ok(contents) => match last_non_empty_line(&contents) {
                Some(line) => Cow::Owned(line.to_vec()),
                None => {
                    debug!("{} has no non-empty line", path.display());
                    Cow::Borrowed(self.text.as_bytes())
                }
            },
            Err(e) => {
                debug!("Failed to read {}: {}", path.display(), e);
                Cow::Borrowed(self.text.as_bytes())
            }
        }
    }
}

/// Replaces a leading `$SNAP` component with `snap`. Paths are returned
/// unchanged when there is no such component or `snap` is unknown.
pub fn expand_snap(path: &Path, snap: Option<&OsStr>) -> PathBuf {
    match (path.strip_prefix("$SNAP"), snap) {
        (Ok(rest), Some(snap)) => Path::new(snap).join(rest),
        _ => path.to_path_buf(),
    }
}

/// The last line of `contents` with something other than whitespace in it,
/// without its line terminator.
fn last_non_empty_line(contents: &[u8]) -> Option<&[u8]> {
    contents
        .split(|&b| b == b'\n')
        .rev()
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .find(|line| !line.iter().all(u8::is_ascii_whitespace))
}

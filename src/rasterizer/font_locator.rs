//! Discovery of a bold sans-serif font file on a Linux filesystem.
//!
//! Distributions install the same font families under different directory
//! names, so each candidate carries the install prefixes it is known under.

use log::{debug, warn};
use std::path::{Path, PathBuf};

/// A font file name and the install-prefix subdirectories it may live under.
///
/// An empty prefix means the file sits directly in the search root.
#[derive(Debug, Clone, Copy)]
pub struct FontCandidate {
    pub filename: &'static str,
    pub prefixes: &'static [&'static str],
}

/// Candidate fonts, most preferred first.
pub const DEFAULT_FONTS: &[FontCandidate] = &[
    FontCandidate {
        filename: "Ubuntu-B.ttf",
        prefixes: &[
            "ubuntu-font-family", // Ubuntu < 18.04
            "ubuntu",             // Ubuntu >= 18.04, Arch
        ],
    },
    FontCandidate {
        filename: "FreeSansBold.ttf",
        prefixes: &[
            "freefont", // Debian, Ubuntu
            "gnu-free", // Fedora, Arch
        ],
    },
    FontCandidate {
        filename: "DejaVuSans-Bold.ttf",
        prefixes: &[
            "dejavu", // Ubuntu
            "",       // Arch
        ],
    },
    FontCandidate {
        filename: "LiberationSans-Bold.ttf",
        prefixes: &[
            "liberation-sans", // Fedora
            "liberation",      // Arch
        ],
    },
];

/// Font search roots, most preferred first.
pub const SEARCH_ROOTS: &[&str] = &[
    "/usr/share/fonts/truetype", // Ubuntu, Debian
    "/usr/share/fonts/TTF",      // Arch
    "/usr/share/fonts",          // Fedora, Arch
];

/// Returns the first installed default font, or `None` if none is present.
pub fn locate_default_font() -> Option<PathBuf> {
    let found = locate_font(SEARCH_ROOTS, DEFAULT_FONTS);
    if found.is_none() {
        warn!("Can't find a default font!");
    }
    found
}

/// Probes `root/prefix/filename` for every candidate.
///
/// Candidates are tried in order; within a candidate, its prefixes in order;
/// within a prefix, every root in order. Roots that do not exist are dropped
/// once before probing starts.
pub fn locate_font<P: AsRef<Path>>(roots: &[P], fonts: &[FontCandidate]) -> Option<PathBuf> {
    let usable_roots: Vec<&Path> = roots
        .iter()
        .map(AsRef::as_ref)
        .filter(|root| root.exists())
        .collect();

    for font in fonts {
        for prefix in font.prefixes {
            for root in &usable_roots {
                let candidate = root.join(prefix).join(font.filename);
                if candidate.exists() {
                    debug!("Using font {}", candidate.display());
                    return Some(candidate);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use test_log::test;

    const FONTS: &[FontCandidate] = &[
        FontCandidate {
            filename: "First.ttf",
            prefixes: &["first-a", "first-b"],
        },
        FontCandidate {
            filename: "Second.ttf",
            prefixes: &["second", ""],
        },
    ];

    fn install(root: &Path, prefix: &str, filename: &str) -> PathBuf {
        let dir = root.join(prefix);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(filename);
        fs::write(&path, b"not really a font").unwrap();
        path
    }

    #[test]
    fn nothing_installed_is_not_found() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(locate_font(&[tmp.path()], FONTS), None);
    }

    #[test]
    fn missing_roots_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let expected = install(tmp.path(), "second", "Second.ttf");
        let missing = tmp.path().join("does-not-exist");

        assert_eq!(locate_font(&[missing.as_path(), tmp.path()], FONTS), Some(expected));
    }

    #[test]
    fn font_priority_beats_root_priority() {
        let preferred_root = TempDir::new().unwrap();
        let later_root = TempDir::new().unwrap();
        install(preferred_root.path(), "second", "Second.ttf");
        let expected = install(later_root.path(), "first-b", "First.ttf");

        assert_eq!(
            locate_font(&[preferred_root.path(), later_root.path()], FONTS),
            Some(expected)
        );
    }

    #[test]
    fn prefix_priority_beats_root_priority() {
        let preferred_root = TempDir::new().unwrap();
        let later_root = TempDir::new().unwrap();
        install(preferred_root.path(), "first-b", "First.ttf");
        let expected = install(later_root.path(), "first-a", "First.ttf");

        assert_eq!(
            locate_font(&[preferred_root.path(), later_root.path()], FONTS),
            Some(expected)
        );
    }

    #[test]
    fn root_order_breaks_ties_within_a_prefix() {
        let preferred_root = TempDir::new().unwrap();
        let later_root = TempDir::new().unwrap();
        let expected = install(preferred_root.path(), "first-a", "First.ttf");
        install(later_root.path(), "first-a", "First.ttf");

        assert_eq!(
            locate_font(&[preferred_root.path(), later_root.path()], FONTS),
            Some(expected)
        );
    }

    #[test]
    fn empty_prefix_means_directly_in_the_root() {
        let tmp = TempDir::new().unwrap();
        let expected = install(tmp.path(), "", "Second.ttf");

        let found = locate_font(&[tmp.path()], FONTS).unwrap();
        assert_eq!(found, expected);
        assert_eq!(found.parent(), Some(tmp.path()));
    }

    #[test]
    fn default_candidates_cover_the_known_distribution_layouts() {
        let names: Vec<_> = DEFAULT_FONTS.iter().map(|font| font.filename).collect();
        assert_eq!(
            names,
            ["Ubuntu-B.ttf", "FreeSansBold.ttf", "DejaVuSans-Bold.ttf", "LiberationSans-Bold.ttf"]
        );
        assert!(DEFAULT_FONTS[2].prefixes.contains(&""));
        assert_eq!(SEARCH_ROOTS.len(), 3);
    }
}

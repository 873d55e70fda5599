//! Image descriptors and the minimal playlist the binary drives the player with.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use walkdir::{DirEntry, WalkDir};

use crate::error::Error;
use crate::render::loader::has_extension;

/// One entry handed to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Image file; may be empty, in which case nothing is drawn.
    pub filename: PathBuf,
    /// How many times the per-loop duration the image stays up; `<= -1` is forever.
    pub repeats: i64,
}

impl ImageDescriptor {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            repeats: 1,
        }
    }

    #[must_use]
    pub fn with_repeats(mut self, repeats: i64) -> Self {
        self.repeats = repeats;
        self
    }
}

/// Recursively collect image files under `root`, sorted by path.
///
/// # Errors
/// Returns [`Error::BadDir`] if `root` is missing or not a directory.
pub fn scan_images(root: &Path, exts: &[String]) -> Result<Vec<PathBuf>, Error> {
    if !root.is_dir() {
        return Err(Error::BadDir(root.to_string_lossy().into_owned()));
    }

    let mut out: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        // Skip hidden dot-directories *below* the root only.
        .filter_entry(|e| !should_skip_dir(e))
        .flatten()
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), exts))
        .map(DirEntry::into_path)
        .collect();
    out.sort();
    Ok(out)
}

fn should_skip_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}

/// Circular buffer over image descriptors.
#[derive(Debug, Clone)]
pub struct Playlist {
    items: Vec<ImageDescriptor>,
    idx: usize,
}

impl Playlist {
    /// # Errors
    /// Returns [`Error::EmptyScan`] if `items` is empty.
    pub fn from_vec(items: Vec<ImageDescriptor>) -> Result<Self, Error> {
        if items.is_empty() {
            return Err(Error::EmptyScan);
        }
        Ok(Self { items, idx: 0 })
    }

    /// # Errors
    /// Returns [`Error::EmptyScan`] if `paths` is empty.
    pub fn from_paths(paths: Vec<PathBuf>) -> Result<Self, Error> {
        Self::from_vec(paths.into_iter().map(ImageDescriptor::new).collect())
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Advance and return the next item, wrapping at the end.
    pub fn advance(&mut self) -> &ImageDescriptor {
        let out = &self.items[self.idx];
        self.idx = (self.idx + 1) % self.items.len();
        out
    }

    /// Deterministically reorder for `seed` and rewind.
    pub fn shuffle_with_seed(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.items.shuffle(&mut rng);
        self.idx = 0;
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ImageDescriptor] {
        &self.items
    }
}

//! Byte-bounded LRU cache of decoded images keyed by file path.
//!
//! Entry count is unbounded; eviction is driven purely by the summed
//! [`estimate_size`](crate::render::loader::estimate_size) of the entries.
use std::path::{Path, PathBuf};

use lru::LruCache;
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::render::loader::{DecodedImage, Decoder, ImageDecoder};

pub struct ImageCache<D: Decoder = ImageDecoder> {
    decoder: D,
    entries: LruCache<PathBuf, DecodedImage>,
    current_size_bytes: u64,
    capacity_bytes: u64,
}

impl<D: Decoder> ImageCache<D> {
    pub fn new(decoder: D, capacity_bytes: u64) -> Self {
        Self {
            decoder,
            entries: LruCache::unbounded(),
            current_size_bytes: 0,
            capacity_bytes,
        }
    }

    /// Return the cached image for `path`, decoding and admitting it on a miss.
    ///
    /// A hit promotes the entry to most-recently-used without touching the
    /// decoder. On a miss, least-recently-used entries are evicted until the
    /// new image fits; if it does not fit even in an empty cache it is
    /// admitted anyway.
    ///
    /// # Errors
    /// Returns the decoder's [`DecodeError`]; the cache is left unchanged.
    pub fn get_or_load(&mut self, path: &Path) -> Result<&DecodedImage, DecodeError> {
        let image = match self.entries.pop(path) {
            Some(image) => {
                debug!(path = %path.display(), "image cache hit");
                image
            }
            None => {
                let image = self.decoder.decode(path)?;
                self.make_room(path, image.size_bytes());
                image
            }
        };
        // Reinserting the popped or fresh image makes it most-recently-used.
        Ok(self.entries.get_or_insert(path.to_path_buf(), || image))
    }

    /// Evict from the LRU end until `size` more bytes fit, then account for them.
    fn make_room(&mut self, path: &Path, size: u64) {
        while self.current_size_bytes + size > self.capacity_bytes && !self.entries.is_empty() {
            self.evict_one();
        }
        if size > self.capacity_bytes {
            warn!(
                path = %path.display(),
                bytes = size,
                capacity = self.capacity_bytes,
                "image exceeds cache capacity; admitting it alone"
            );
        }
        self.current_size_bytes += size;
        debug!(
            path = %path.display(),
            bytes = size,
            total = self.current_size_bytes,
            "image cache miss; admitted"
        );
    }

    /// Drop the least-recently-used entry, returning its key and size.
    pub fn evict_one(&mut self) -> Option<(PathBuf, u64)> {
        let (path, image) = self.entries.pop_lru()?;
        let size = image.size_bytes();
        self.current_size_bytes -= size;
        debug!(path = %path.display(), bytes = size, "evicted from image cache");
        Some((path, size))
    }

    /// Presence check that does not affect recency.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains(path)
    }

    /// Look at a cached image without promoting it.
    pub fn peek(&self, path: &Path) -> Option<&DecodedImage> {
        self.entries.peek(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_size_bytes(&self) -> u64 {
        self.current_size_bytes
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// Cached keys from the eviction end to the most-recently-used end.
    pub fn keys_lru_to_mru(&self) -> Vec<&Path> {
        self.entries.iter().rev().map(|(k, _)| k.as_path()).collect()
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size_bytes = 0;
    }
}

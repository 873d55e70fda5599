//! Drawing target abstraction and a headless in-memory implementation.
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage, imageops};
use tracing::trace;

/// A display the player can draw to.
pub trait Surface {
    /// Target width and height in pixels.
    fn size(&self) -> (u32, u32);

    fn fill(&mut self, rgb: [u8; 3]);

    /// Draw `image` with its top-left corner at (`x`, `y`), clipped to the surface.
    fn blit(&mut self, image: &RgbaImage, x: i64, y: i64);

    /// Make everything drawn since the last present visible.
    fn present(&mut self) -> Result<()>;
}

/// RGBA8 back buffer that optionally writes each presented frame to disk.
#[derive(Debug, Clone)]
pub struct Canvas {
    back: RgbaImage,
    presented: u64,
    output: Option<PathBuf>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            back: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            presented: 0,
            output: None,
        }
    }

    /// Write the back buffer as PNG to `path` on every present.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn frame(&self) -> &RgbaImage {
        &self.back
    }

    /// Number of frames presented so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Surface for Canvas {
    fn size(&self) -> (u32, u32) {
        self.back.dimensions()
    }

    fn fill(&mut self, rgb: [u8; 3]) {
        let px = Rgba([rgb[0], rgb[1], rgb[2], 255]);
        for p in self.back.pixels_mut() {
            *p = px;
        }
    }

    fn blit(&mut self, image: &RgbaImage, x: i64, y: i64) {
        imageops::overlay(&mut self.back, image, x, y);
    }

    fn present(&mut self) -> Result<()> {
        self.presented += 1;
        if let Some(path) = &self.output {
            self.back
                .save(path)
                .with_context(|| format!("writing frame to {}", path.display()))?;
        }
        trace!(frame = self.presented, "presented");
        Ok(())
    }
}

//! Places a cached image on a surface over the configured background.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use fast_image_resize as fir;
use image::RgbaImage;
use tracing::{debug, trace};

use crate::error::{PlayerError, ScaleError};
use crate::playlist::ImageDescriptor;
use crate::processing::layout::{Placement, center_offset, compute_placement};
use crate::render::cache::ImageCache;
use crate::render::loader::Decoder;
use crate::render::surface::Surface;

/// Bitmap drawn behind every frame at a fixed offset.
#[derive(Debug, Clone)]
pub struct BackgroundImage {
    pub bitmap: Arc<RgbaImage>,
    pub x: i64,
    pub y: i64,
}

/// What the screen shows when no foreground image is drawn.
#[derive(Debug, Clone, Default)]
pub struct Background {
    pub color: [u8; 3],
    pub image: Option<BackgroundImage>,
}

impl Background {
    pub fn solid(color: [u8; 3]) -> Self {
        Self { color, image: None }
    }

    /// Load `path` (if any) and center it on a `screen`-sized surface.
    pub fn load(color: [u8; 3], path: Option<&Path>, screen: (u32, u32)) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::solid(color));
        };
        let bitmap = image::open(path)
            .with_context(|| format!("failed to load background image at {}", path.display()))?
            .to_rgba8();
        let (x, y) = center_offset(bitmap.width(), bitmap.height(), screen.0, screen.1);
        debug!(path = %path.display(), x, y, "loaded background image");
        Ok(Self {
            color,
            image: Some(BackgroundImage {
                bitmap: Arc::new(bitmap),
                x,
                y,
            }),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor {
    pub scale: bool,
    pub center: bool,
}

impl Compositor {
    pub fn new(scale: bool, center: bool) -> Self {
        Self { scale, center }
    }

    /// Clear to the background colour and image, presenting when asked.
    pub fn blank<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        background: &Background,
        present: bool,
    ) -> Result<()> {
        surface.fill(background.color);
        if let Some(bg) = &background.image {
            surface.blit(&bg.bitmap, bg.x, bg.y);
        }
        if present {
            surface.present()?;
        }
        Ok(())
    }

    /// Draw `image` and present it.
    ///
    /// An empty or non-file path leaves the surface untouched and yields
    /// `Ok(None)`.
    ///
    /// # Errors
    /// A decode failure, or a failure to scale or present.
    pub fn render<D, S>(
        &self,
        image: &ImageDescriptor,
        cache: &mut ImageCache<D>,
        surface: &mut S,
        background: &Background,
    ) -> Result<Option<Placement>, PlayerError>
    where
        D: Decoder,
        S: Surface + ?Sized,
    {
        let path = image.filename.as_path();
        if path.as_os_str().is_empty() || !path.is_file() {
            debug!(path = %path.display(), "nothing to draw");
            return Ok(None);
        }

        self.blank(surface, background, false)
            .map_err(PlayerError::Render)?;
        let decoded = cache.get_or_load(path)?;
        let (screen_w, screen_h) = surface.size();
        let placement = compute_placement(
            screen_w,
            screen_h,
            decoded.width(),
            decoded.height(),
            self.scale,
            self.center,
        );
        trace!(path = %path.display(), ?placement, "computed placement");

        if placement.scaled && (placement.width, placement.height) != decoded.dimensions() {
            let scaled = scale_to_placement(decoded.bitmap(), &placement)?;
            surface.blit(&scaled, placement.x, placement.y);
        } else {
            surface.blit(decoded.bitmap(), placement.x, placement.y);
        }
        surface.present().map_err(PlayerError::Render)?;
        Ok(Some(placement))
    }
}

/// Scale `bitmap` to the placement's size into a fresh buffer; the cached
/// original stays untouched.
fn scale_to_placement(
    bitmap: &RgbaImage,
    placement: &Placement,
) -> Result<RgbaImage, ScaleError> {
    let (from_w, from_h) = bitmap.dimensions();
    let (to_w, to_h) = (placement.width, placement.height);
    let src = fir::images::ImageRef::new(from_w, from_h, bitmap.as_raw(), fir::PixelType::U8x4)
        .map_err(|source| ScaleError::Buffer {
            width: from_w,
            height: from_h,
            source,
        })?;

    let mut scaled = RgbaImage::new(to_w, to_h);
    {
        let mut dst =
            fir::images::Image::from_slice_u8(to_w, to_h, &mut scaled, fir::PixelType::U8x4)
                .map_err(|source| ScaleError::Buffer {
                    width: to_w,
                    height: to_h,
                    source,
                })?;
        let options = fir::ResizeOptions::new()
            .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
        fir::Resizer::new()
            .resize(&src, &mut dst, &options)
            .map_err(|source| ScaleError::Resize {
                from_w,
                from_h,
                to_w,
                to_h,
                source,
            })?;
    }
    trace!(from_w, from_h, to_w, to_h, "scaled bitmap");
    Ok(scaled)
}

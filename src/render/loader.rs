//! Image decoding for the cache.
//!
//! Every decoded bitmap is normalised to RGBA8 with EXIF orientation applied,
//! so the compositor only ever deals with one pixel layout.
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::debug;

use crate::error::DecodeError;

/// A decoded bitmap together with its pixel geometry.
///
/// Immutable once produced; the cache owns it and consumers borrow it for a
/// single draw.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    path: PathBuf,
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
    bitmap: RgbaImage,
}

impl DecodedImage {
    /// Bytes per pixel of the RGBA8 layout produced by [`ImageDecoder`].
    pub const RGBA8_BYTES_PER_PIXEL: u32 = 4;

    pub fn new(path: PathBuf, bytes_per_pixel: u32, bitmap: RgbaImage) -> Self {
        let (width, height) = bitmap.dimensions();
        Self {
            path,
            width,
            height,
            bytes_per_pixel,
            bitmap,
        }
    }

    pub fn from_rgba(path: PathBuf, bitmap: RgbaImage) -> Self {
        Self::new(path, Self::RGBA8_BYTES_PER_PIXEL, bitmap)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.bytes_per_pixel
    }

    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    /// Memory footprint used for cache accounting.
    pub fn size_bytes(&self) -> u64 {
        estimate_size(self)
    }
}

/// `width * height * bytes_per_pixel`, without row padding.
pub fn estimate_size(image: &DecodedImage) -> u64 {
    u64::from(image.width) * u64::from(image.height) * u64::from(image.bytes_per_pixel)
}

/// Source of decoded images for the cache.
pub trait Decoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError>;
}

/// Default decoder backed by the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct ImageDecoder {
    /// Lowercase extensions without the dot; empty accepts everything.
    extensions: Vec<String>,
}

impl ImageDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn accepts(&self, path: &Path) -> bool {
        self.extensions.is_empty() || has_extension(path, &self.extensions)
    }
}

/// Return `true` if `path` has one of `exts` (lowercase, without dot),
/// comparing case-insensitively.
#[must_use]
pub fn has_extension(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| *e == ext)
        })
}

impl Decoder for ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        if !self.accepts(path) {
            return Err(DecodeError::UnsupportedExtension {
                path: path.to_path_buf(),
            });
        }
        let bitmap = decode_rgba8_apply_exif(path)?;
        debug!(
            path = %path.display(),
            width = bitmap.width(),
            height = bitmap.height(),
            "decoded image"
        );
        Ok(DecodedImage::from_rgba(path.to_path_buf(), bitmap))
    }
}

// Orientation handling is best-effort; missing metadata keeps the original orientation.
fn decode_rgba8_apply_exif(path: &Path) -> Result<RgbaImage, DecodeError> {
    let open_err = |source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    };
    let img = image::ImageReader::open(path)
        .map_err(open_err)?
        .with_guessed_format()
        .map_err(open_err)?
        .decode()
        .map_err(|source| DecodeError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let img = img.to_rgba8();
    let orientation = read_orientation(path).unwrap_or(1);
    Ok(apply_orientation(img, orientation))
}

fn apply_orientation(img: RgbaImage, orientation: u16) -> RgbaImage {
    use image::imageops::{flip_horizontal, flip_vertical, rotate90, rotate180, rotate270};
    match orientation {
        2 => flip_horizontal(&img),
        3 => rotate180(&img),
        4 => flip_vertical(&img),
        // transpose
        5 => flip_horizontal(&rotate90(&img)),
        6 => rotate90(&img),
        // transverse
        7 => flip_horizontal(&rotate270(&img)),
        8 => rotate270(&img),
        _ => img,
    }
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let o = field.value.get_uint(0)? as u16;
    debug!("exif orientation {} for {}", o, path.display());
    Some(o)
}

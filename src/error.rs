use std::path::PathBuf;

use thiserror::Error;

/// Library error type for playlist and configuration operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured image directory is missing or not a directory.
    #[error("invalid image directory: {0}")]
    BadDir(String),

    /// The scan completed but found no images.
    #[error("no images found in configured directory")]
    EmptyScan,

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}

/// Failure to turn an image file into a [`DecodedImage`](crate::render::loader::DecodedImage).
///
/// Surfaced from a cache miss and never retried.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open image {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {} has an extension outside the configured list", .path.display())]
    UnsupportedExtension { path: PathBuf },
}

impl DecodeError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Open { path, .. }
            | Self::Decode { path, .. }
            | Self::UnsupportedExtension { path } => path,
        }
    }
}

/// Failure to scale a decoded bitmap to its on-screen placement.
#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("pixel buffer does not hold a {width}x{height} RGBA bitmap")]
    Buffer {
        width: u32,
        height: u32,
        #[source]
        source: fast_image_resize::ImageBufferError,
    },

    #[error("failed to scale {from_w}x{from_h} bitmap to {to_w}x{to_h}")]
    Resize {
        from_w: u32,
        from_h: u32,
        to_w: u32,
        to_h: u32,
        #[source]
        source: fast_image_resize::ResizeError,
    },
}

/// Errors returned by [`ImagePlayer::play`](crate::player::ImagePlayer::play).
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The image could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Scale(#[from] ScaleError),

    /// Drawing or presenting the frame failed.
    #[error("render error: {0}")]
    Render(anyhow::Error),
}

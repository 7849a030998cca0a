//! Pixel codec: encoded image files to canonical RGBA buffers
//!
//! Container parsing is delegated to the `image` crate. This module owns the
//! translation contract on top of it: indexed palettes are captured before
//! expansion, every static image is composited to 32 bits with alpha, rows
//! must be tightly packed, and channels end up in RGBA order. Animated GIFs
//! with more than one frame are returned frame by frame.

pub mod animation;
pub mod bitmap;
pub mod palette;

use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub use bitmap::{Bitmap, PixelBuffer, PixelFormat};

/// Error type for image decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Image decoding error: {0}")]
    DecodeFailure(String),

    #[error("Invalid stride encountered: {stride} bytes per row for width {width}, expected {expected}")]
    UnsupportedLayout {
        width: u32,
        stride: usize,
        expected: usize,
    },
}

/// One entry of an indexed color table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb24 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb24 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A decoded static image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    /// 24 or 32; images produced by [`decode`] are always 32 bit RGBA
    pub bits_per_pixel: u8,
    /// Row-major, top-to-bottom, no row padding
    pub pixels: Vec<u8>,
    /// Color table of the source, present only for indexed sources
    pub palette: Option<Vec<Rgb24>>,
}

impl RawImage {
    /// A single-color RGBA image
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            bits_per_pixel: 32,
            pixels: rgba.repeat(count),
            palette: None,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        usize::from(self.bits_per_pixel / 8)
    }

    pub fn stride(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    /// Bytes of the pixel at `(x, y)`, or `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.bytes_per_pixel();
        let start = y as usize * self.stride() + x as usize * bpp;
        self.pixels.get(start..start + bpp)
    }
}

/// A decoded multi-frame image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimatedImage {
    pub frame_size: (u32, u32),
    /// One RGBA buffer of `frame_size` per frame
    pub frames: Vec<Vec<u8>>,
    /// Display time of each frame, same length as `frames`
    pub frame_durations_micros: Vec<u64>,
}

impl AnimatedImage {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn total_duration_micros(&self) -> u64 {
        self.frame_durations_micros.iter().sum()
    }

    /// Mean frame duration, used when a renderer plays frames at a fixed rate
    pub fn average_frame_duration(&self) -> Duration {
        if self.frames.is_empty() {
            return Duration::ZERO;
        }
        Duration::from_micros(self.total_duration_micros() / self.frames.len() as u64)
    }

    /// Frame visible after `elapsed` of looping playback
    pub fn frame_at(&self, elapsed: Duration) -> &[u8] {
        let total = self.total_duration_micros();
        if total == 0 {
            return self.frames.first().map(Vec::as_slice).unwrap_or(&[]);
        }
        let mut t = (elapsed.as_micros() % u128::from(total)) as u64;
        for (frame, &duration) in self.frames.iter().zip(&self.frame_durations_micros) {
            if t < duration {
                return frame;
            }
            t -= duration;
        }
        self.frames.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Result of decoding an image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedImage {
    Static(RawImage),
    Animated(AnimatedImage),
}

impl DecodedImage {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            DecodedImage::Static(image) => (image.width, image.height),
            DecodedImage::Animated(anim) => anim.frame_size,
        }
    }

    /// Bytes held by the pixel buffers, used for cache accounting
    pub fn byte_size(&self) -> usize {
        match self {
            DecodedImage::Static(image) => image.pixels.len(),
            DecodedImage::Animated(anim) => anim.frames.iter().map(Vec::len).sum(),
        }
    }

    pub fn as_static(&self) -> Option<&RawImage> {
        match self {
            DecodedImage::Static(image) => Some(image),
            DecodedImage::Animated(_) => None,
        }
    }

    pub fn as_animated(&self) -> Option<&AnimatedImage> {
        match self {
            DecodedImage::Animated(anim) => Some(anim),
            DecodedImage::Static(_) => None,
        }
    }

    /// RGBA pixels to draw after `elapsed` of display time
    pub fn pixels_at(&self, elapsed: Duration) -> &[u8] {
        match self {
            DecodedImage::Static(image) => &image.pixels,
            DecodedImage::Animated(anim) => anim.frame_at(elapsed),
        }
    }
}

/// Decode an image file from disk
pub fn decode<P: AsRef<Path>>(path: P) -> Result<DecodedImage, CodecError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| CodecError::DecodeFailure(format!("{}: {e}", path.display())))?;
    decode_bytes(&bytes)
}

/// Decode an image held in memory
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, CodecError> {
    let format =
        image::guess_format(bytes).map_err(|e| CodecError::DecodeFailure(e.to_string()))?;

    if format == ImageFormat::Gif {
        if let Some(anim) = animation::decode_gif_frames(bytes)? {
            log::debug!(
                "Decoded animated GIF: {} frames of {:?}",
                anim.frame_count(),
                anim.frame_size
            );
            return Ok(DecodedImage::Animated(anim));
        }
    }

    let palette = palette::sniff(bytes);

    let image = image::io::Reader::with_format(Cursor::new(bytes), format)
        .decode()
        .map_err(|e| CodecError::DecodeFailure(e.to_string()))?;

    Bitmap::from_dynamic(image)?
        .with_palette(palette)
        .into_raw_image()
        .map(DecodedImage::Static)
}

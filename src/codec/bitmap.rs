//! Intermediate bitmaps and the conversion steps between them
//!
//! Every step takes a [`Bitmap`] by value and returns a new owned one, so an
//! intermediate buffer is released as soon as the next step no longer needs
//! it, including on the error path.

use super::{CodecError, RawImage, Rgb24};
use image::DynamicImage;

#[cfg(test)]
thread_local! {
    static LIVE_BUFFERS: std::cell::Cell<isize> = const { std::cell::Cell::new(0) };
}

#[cfg(test)]
fn track_buffer(delta: isize) {
    LIVE_BUFFERS.with(|live| live.set(live.get() + delta));
}

/// Number of pixel buffers currently alive on this thread
#[cfg(test)]
pub(crate) fn live_buffers() -> isize {
    LIVE_BUFFERS.with(|live| live.get())
}

/// Owned pixel storage of one intermediate bitmap
#[derive(Debug)]
pub struct PixelBuffer(Vec<u8>);

impl PixelBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        #[cfg(test)]
        track_buffer(1);
        Self(bytes)
    }

    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Hand the bytes over to a final image
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }
}

impl Drop for PixelBuffer {
    fn drop(&mut self) {
        #[cfg(test)]
        track_buffer(-1);
    }
}

/// Native pixel layout of a source bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Gray8,
    GrayAlpha8,
    Rgb24,
    Bgr24,
    Rgba32,
    Bgra32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::GrayAlpha8 => 2,
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => 3,
            PixelFormat::Rgba32 | PixelFormat::Bgra32 => 4,
        }
    }

    /// Whether pixels are already 32 bit with an alpha channel
    pub fn is_32_bit_alpha(self) -> bool {
        matches!(self, PixelFormat::Rgba32 | PixelFormat::Bgra32)
    }

    fn canvas_format(self) -> PixelFormat {
        match self {
            PixelFormat::Bgr24 | PixelFormat::Bgra32 => PixelFormat::Bgra32,
            _ => PixelFormat::Rgba32,
        }
    }
}

/// A source bitmap in its native layout
#[derive(Debug)]
pub struct Bitmap {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    data: PixelBuffer,
    palette: Option<Vec<Rgb24>>,
}

impl Bitmap {
    /// Wrap raw rows; `stride` is the byte distance between row starts
    pub fn new(
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::DecodeFailure(format!(
                "bitmap of {width}x{height} pixels has no content"
            )));
        }
        let required = stride
            .checked_mul(height as usize)
            .ok_or_else(|| CodecError::DecodeFailure("bitmap size overflows".to_string()))?;
        if data.len() < required {
            return Err(CodecError::DecodeFailure(format!(
                "pixel buffer holds {} bytes, {height} rows of stride {stride} need {required}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            stride,
            format,
            data: PixelBuffer::new(data),
            palette: None,
        })
    }

    /// Take over the pixels of a decoded `image` buffer
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, CodecError> {
        let (width, height) = (image.width(), image.height());
        let (format, data) = match image {
            DynamicImage::ImageLuma8(buf) => (PixelFormat::Gray8, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (PixelFormat::GrayAlpha8, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (PixelFormat::Rgb24, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (PixelFormat::Rgba32, buf.into_raw()),
            // Deeper sources are narrowed to 8 bits per channel by `image`
            other => (PixelFormat::Rgba32, other.into_rgba8().into_raw()),
        };
        let stride = width as usize * format.bytes_per_pixel();
        Self::new(width, height, stride, format, data)
    }

    pub fn with_palette(mut self, palette: Option<Vec<Rgb24>>) -> Self {
        self.palette = palette;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn expected_stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    pub fn take_palette(&mut self) -> Option<Vec<Rgb24>> {
        self.palette.take()
    }

    fn check_layout(&self) -> Result<(), CodecError> {
        let expected = self.expected_stride();
        if self.stride != expected {
            return Err(CodecError::UnsupportedLayout {
                width: self.width,
                stride: self.stride,
                expected,
            });
        }
        Ok(())
    }

    /// Composite onto a fresh 32-bit canvas unless already 32 bit with alpha
    pub fn into_argb32(self) -> Result<Bitmap, CodecError> {
        if self.format.is_32_bit_alpha() {
            return Ok(self);
        }
        self.check_layout()?;

        let canvas_format = self.format.canvas_format();
        let canvas_stride = self.width as usize * 4;
        let mut canvas = PixelBuffer::zeroed(canvas_stride * self.height as usize);
        let src_bpp = self.format.bytes_per_pixel();

        for (src_row, dst_row) in self
            .data
            .as_slice()
            .chunks(self.stride)
            .zip(canvas.as_mut_slice().chunks_exact_mut(canvas_stride))
        {
            let src_row = &src_row[..self.width as usize * src_bpp];
            for (src, dst) in src_row
                .chunks_exact(src_bpp)
                .zip(dst_row.chunks_exact_mut(4))
            {
                // Blitting onto a transparent canvas keeps the source alpha
                let px = match self.format {
                    PixelFormat::Gray8 => [src[0], src[0], src[0], 255],
                    PixelFormat::GrayAlpha8 => [src[0], src[0], src[0], src[1]],
                    PixelFormat::Rgb24 | PixelFormat::Bgr24 => [src[0], src[1], src[2], 255],
                    PixelFormat::Rgba32 | PixelFormat::Bgra32 => [src[0], src[1], src[2], src[3]],
                };
                dst.copy_from_slice(&px);
            }
        }

        Ok(Bitmap {
            width: self.width,
            height: self.height,
            stride: canvas_stride,
            format: canvas_format,
            data: canvas,
            palette: self.palette,
        })
    }

    /// Run the full canonicalization: palette capture, 32-bit composite,
    /// stride validation and RGBA reordering
    pub fn into_raw_image(mut self) -> Result<RawImage, CodecError> {
        self.check_layout()?;
        let palette = self.take_palette();

        let canvas = self.into_argb32()?;
        if canvas.stride != canvas.width as usize * 4 {
            return Err(CodecError::UnsupportedLayout {
                width: canvas.width,
                stride: canvas.stride,
                expected: canvas.width as usize * 4,
            });
        }

        let (width, height, format) = (canvas.width, canvas.height, canvas.format);
        let len = canvas.stride * height as usize;
        let mut pixels = canvas.data.into_vec();
        pixels.truncate(len);

        if format == PixelFormat::Bgra32 {
            for px in pixels.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
        }

        Ok(RawImage {
            width,
            height,
            bits_per_pixel: 32,
            pixels,
            palette,
        })
    }
}

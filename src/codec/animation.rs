//! Multi-frame GIF decoding

use super::{AnimatedImage, CodecError};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageDecoder};
use std::io::Cursor;

/// Decode every frame of a GIF
///
/// Returns `None` for a single-frame GIF so the caller can take the static
/// path instead.
pub fn decode_gif_frames(bytes: &[u8]) -> Result<Option<AnimatedImage>, CodecError> {
    let decoder =
        GifDecoder::new(Cursor::new(bytes)).map_err(|e| CodecError::DecodeFailure(e.to_string()))?;
    let frame_size = decoder.dimensions();

    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| CodecError::DecodeFailure(e.to_string()))?;

    if frames.len() <= 1 {
        return Ok(None);
    }

    let mut buffers = Vec::with_capacity(frames.len());
    let mut durations = Vec::with_capacity(frames.len());
    for frame in frames {
        let (numer, denom) = frame.delay().numer_denom_ms();
        durations.push(u64::from(numer) * 1000 / u64::from(denom.max(1)));

        let buffer = frame.into_buffer();
        if buffer.dimensions() != frame_size {
            return Err(CodecError::DecodeFailure(format!(
                "frame of {:?} does not match the {frame_size:?} canvas",
                buffer.dimensions()
            )));
        }
        buffers.push(buffer.into_raw());
    }

    Ok(Some(AnimatedImage {
        frame_size,
        frames: buffers,
        frame_durations_micros: durations,
    }))
}

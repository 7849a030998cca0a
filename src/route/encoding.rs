//! Best-effort text encoding detection for route files

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use std::borrow::Cow;
use std::io;
use std::path::Path;

/// Encoding tag handed to route parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextEncoding(&'static Encoding);

impl TextEncoding {
    pub fn utf8() -> Self {
        Self(UTF_8)
    }

    /// Stand-in for text that is not valid UTF-8
    pub fn legacy() -> Self {
        Self(WINDOWS_1252)
    }

    pub fn new(encoding: &'static Encoding) -> Self {
        Self(encoding)
    }

    pub fn encoding(self) -> &'static Encoding {
        self.0
    }

    pub fn name(self) -> &'static str {
        self.0.name()
    }

    pub fn is_legacy(self) -> bool {
        self.0 == WINDOWS_1252
    }

    /// Decode `bytes`, dropping a leading byte order mark
    pub fn decode(self, bytes: &[u8]) -> Cow<'_, str> {
        let (text, _) = self.0.decode_with_bom_removal(bytes);
        text
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::utf8()
    }
}

/// Guess the encoding of `bytes`
pub fn detect(bytes: &[u8]) -> TextEncoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return TextEncoding(encoding);
    }

    if let Some(encoding) = detect_bomless_utf16(bytes) {
        return TextEncoding(encoding);
    }

    if std::str::from_utf8(bytes).is_ok() {
        TextEncoding::utf8()
    } else {
        TextEncoding::legacy()
    }
}

/// ASCII-heavy UTF-16 without a BOM has a zero in every other byte
fn detect_bomless_utf16(bytes: &[u8]) -> Option<&'static Encoding> {
    let sample = &bytes[..bytes.len().min(4096) & !1];
    if sample.len() < 4 {
        return None;
    }
    let pairs = sample.len() / 2;
    let even_zeros = sample.iter().step_by(2).filter(|&&b| b == 0).count();
    let odd_zeros = sample.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();

    if odd_zeros * 10 >= pairs * 9 && even_zeros == 0 {
        Some(UTF_16LE)
    } else if even_zeros * 10 >= pairs * 9 && odd_zeros == 0 {
        Some(UTF_16BE)
    } else {
        None
    }
}

/// Guess the encoding of the file at `path`
pub fn detect_file<P: AsRef<Path>>(path: P) -> io::Result<TextEncoding> {
    let bytes = std::fs::read(path)?;
    Ok(detect(&bytes))
}

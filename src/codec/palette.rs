//! Color table capture for indexed sources
//!
//! `image` expands indexed pixels on decode and drops the table, so the table
//! is read straight from the container header before decoding.

use super::Rgb24;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const PNG_INDEXED: u8 = 3;

/// Color table of an indexed PNG, GIF or BMP; `None` for direct-color sources
pub fn sniff(bytes: &[u8]) -> Option<Vec<Rgb24>> {
    if bytes.starts_with(PNG_SIGNATURE) {
        png_palette(bytes)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        gif_palette(bytes)
    } else if bytes.starts_with(b"BM") {
        bmp_palette(bytes)
    } else {
        None
    }
}

fn read_u16_le(bytes: &[u8], offset: usize) -> Option<u16> {
    let b = bytes.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let b = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_u32_be(bytes: &[u8], offset: usize) -> Option<u32> {
    let b = bytes.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn png_palette(bytes: &[u8]) -> Option<Vec<Rgb24>> {
    let mut offset = PNG_SIGNATURE.len();
    let mut indexed = false;

    while offset + 8 <= bytes.len() {
        let len = read_u32_be(bytes, offset)? as usize;
        let kind = bytes.get(offset + 4..offset + 8)?;
        let data = bytes.get(offset + 8..offset + 8 + len)?;

        match kind {
            b"IHDR" => indexed = data.get(9) == Some(&PNG_INDEXED),
            b"PLTE" if indexed => {
                return Some(
                    data.chunks_exact(3)
                        .map(|c| Rgb24::new(c[0], c[1], c[2]))
                        .collect(),
                )
            }
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }

        // length + type + data + crc
        offset += 12 + len;
    }
    None
}

fn gif_palette(bytes: &[u8]) -> Option<Vec<Rgb24>> {
    let packed = *bytes.get(10)?;
    if packed & 0x80 == 0 {
        return None;
    }
    let count = 1usize << ((packed & 0x07) + 1);
    let table = bytes.get(13..13 + count * 3)?;
    Some(
        table
            .chunks_exact(3)
            .map(|c| Rgb24::new(c[0], c[1], c[2]))
            .collect(),
    )
}

fn bmp_palette(bytes: &[u8]) -> Option<Vec<Rgb24>> {
    let header_size = read_u32_le(bytes, 14)? as usize;

    // BITMAPCOREHEADER stores 3-byte entries and no explicit color count
    let (bit_count, colors_used, entry_size) = if header_size == 12 {
        (read_u16_le(bytes, 24)?, 0, 3)
    } else {
        (read_u16_le(bytes, 28)?, read_u32_le(bytes, 46)? as usize, 4)
    };
    if bit_count == 0 || bit_count > 8 {
        return None;
    }

    let count = if colors_used == 0 {
        1usize << bit_count
    } else {
        colors_used
    };
    let start = 14 + header_size;
    let table = bytes.get(start..start + count * entry_size)?;
    Some(
        table
            .chunks_exact(entry_size)
            .map(|c| Rgb24::new(c[2], c[1], c[0]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_container_has_no_palette() {
        assert_eq!(sniff(b"\xff\xd8\xff\xe0 jpeg"), None);
        assert_eq!(sniff(&[]), None);
    }

    #[test]
    fn test_gif_global_table() {
        let mut gif = b"GIF89a".to_vec();
        gif.extend_from_slice(&[1, 0, 1, 0]); // 1x1 screen
        gif.push(0x80 | 0x01); // global table, 4 entries
        gif.extend_from_slice(&[0, 0]);
        for i in 0..4u8 {
            gif.extend_from_slice(&[i, i + 10, i + 20]);
        }

        let palette = sniff(&gif).expect("palette");
        assert_eq!(palette.len(), 4);
        assert_eq!(palette[3], Rgb24::new(3, 13, 23));
    }

    #[test]
    fn test_gif_without_global_table() {
        let mut gif = b"GIF89a".to_vec();
        gif.extend_from_slice(&[1, 0, 1, 0, 0x00, 0, 0]);
        assert_eq!(sniff(&gif), None);
    }

    #[test]
    fn test_truncated_bmp_table_is_ignored() {
        let mut bmp = vec![0u8; 54];
        bmp[0] = b'B';
        bmp[1] = b'M';
        bmp[14] = 40;
        bmp[28] = 8;
        assert_eq!(sniff(&bmp), None);
    }

    #[test]
    fn test_direct_color_png_has_no_palette() {
        let img = image::RgbImage::new(1, 1);
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(sniff(&png), None);
    }
}

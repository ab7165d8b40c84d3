//! ROOT compression blocks.
//!
//! Compressed payloads are a sequence of blocks, each with a 9-byte header:
//! ```text
//! bytes 0-1  algorithm: "ZL" zlib, "L4" LZ4, "ZS" zstd, "XZ" lzma
//! byte  2    method (unused here)
//! bytes 3-5  compressed size, little-endian u24
//! bytes 6-8  uncompressed size, little-endian u24
//! ```

use std::io::{Read, Write};

use crate::error::{Result, RootError};

/// Block header length.
pub const HEADER_LEN: usize = 9;
/// Largest payload a single block can describe.
pub const MAX_BLOCK: usize = 0xFF_FFFF;

std::thread_local! {
    static ZSTD_DECODER: std::cell::RefCell<ruzstd::decoding::FrameDecoder> =
        std::cell::RefCell::new(ruzstd::decoding::FrameDecoder::new());
}

/// Decompress a block sequence into exactly `expected_len` bytes.
///
/// `expected_len` comes from the key and is not trusted: it must not exceed
/// the total the block headers declare.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let declared = declared_len(src);
    if expected_len > declared {
        return Err(RootError::Decompression(format!(
            "expected {expected_len} bytes but the block headers declare {declared}"
        )));
    }
    let mut out = Vec::with_capacity(expected_len);
    let mut offset = 0;

    while out.len() < expected_len {
        if offset + HEADER_LEN > src.len() {
            return Err(RootError::Decompression(format!(
                "truncated block header at offset {offset} ({} of {expected_len} bytes decoded)",
                out.len()
            )));
        }
        let header = &src[offset..offset + HEADER_LEN];
        let c_size = read_le24(&header[3..6]);
        let u_size = read_le24(&header[6..9]);
        offset += HEADER_LEN;

        let body = src.get(offset..offset + c_size).ok_or_else(|| {
            RootError::Decompression(format!(
                "block claims {c_size} bytes but only {} remain",
                src.len() - offset
            ))
        })?;

        let block = match &header[0..2] {
            b"ZL" => inflate_zlib(body, u_size)?,
            b"L4" => inflate_lz4(body, u_size)?,
            b"ZS" => inflate_zstd(body, u_size)?,
            b"XZ" => inflate_xz(body, u_size)?,
            tag => {
                return Err(RootError::Decompression(format!(
                    "unsupported compression algorithm {:?}",
                    String::from_utf8_lossy(tag)
                )));
            }
        };
        if block.len() != u_size {
            return Err(RootError::Decompression(format!(
                "block decoded to {} bytes, header says {u_size}",
                block.len()
            )));
        }
        out.extend_from_slice(&block);
        offset += c_size;
    }

    if out.len() != expected_len {
        return Err(RootError::Decompression(format!(
            "decoded {} bytes, expected {expected_len}",
            out.len()
        )));
    }
    Ok(out)
}

/// Compress `src` into zlib blocks. Returns `None` when compression does not
/// shrink the payload, in which case ROOT stores the bytes as-is.
pub fn compress_zlib(src: &[u8], level: u32) -> Result<Option<Vec<u8>>> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    let mut out = Vec::new();
    for chunk in src.chunks(MAX_BLOCK) {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::new(level.min(9)));
        enc.write_all(chunk)?;
        let body = enc.finish()?;
        if body.len() > MAX_BLOCK {
            return Ok(None);
        }
        out.extend_from_slice(b"ZL");
        out.push(0x08);
        write_le24(&mut out, body.len());
        write_le24(&mut out, chunk.len());
        out.extend_from_slice(&body);
    }
    Ok(if out.len() < src.len() { Some(out) } else { None })
}

fn inflate_zlib(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| RootError::Decompression(format!("zlib: {e}")))?;
    Ok(out)
}

fn inflate_lz4(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    // An 8-byte xxhash64 checksum precedes the LZ4 payload; it is not verified.
    let payload = data
        .get(8..)
        .ok_or_else(|| RootError::Decompression("LZ4 block shorter than its checksum".into()))?;
    lz4_flex::decompress(payload, expected).map_err(|e| RootError::Decompression(format!("lz4: {e}")))
}

fn inflate_zstd(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; expected];
    let written = ZSTD_DECODER
        .with(|cell| cell.borrow_mut().decode_all(data, &mut out))
        .map_err(|e| RootError::Decompression(format!("zstd: {e}")))?;
    out.truncate(written);
    Ok(out)
}

fn inflate_xz(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    lzma_rs::xz_decompress(&mut std::io::BufReader::new(data), &mut out)
        .map_err(|e| RootError::Decompression(format!("xz: {e}")))?;
    Ok(out)
}

/// Sum of the uncompressed sizes in the block headers of `src`.
fn declared_len(src: &[u8]) -> usize {
    let mut offset = 0usize;
    let mut total = 0usize;
    while let Some(header) = src.get(offset..offset.saturating_add(HEADER_LEN)) {
        total += read_le24(&header[6..9]);
        offset = offset.saturating_add(HEADER_LEN + read_le24(&header[3..6]));
    }
    total
}

fn read_le24(b: &[u8]) -> usize {
    b[0] as usize | (b[1] as usize) << 8 | (b[2] as usize) << 16
}

fn write_le24(out: &mut Vec<u8>, v: usize) {
    out.extend_from_slice(&[(v & 0xFF) as u8, (v >> 8 & 0xFF) as u8, (v >> 16 & 0xFF) as u8]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(tag: &[u8; 2], method: u8, body: &[u8], u_len: usize) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.push(method);
        write_le24(&mut out, body.len());
        write_le24(&mut out, u_len);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn le24() {
        assert_eq!(read_le24(&[0x10, 0x00, 0x00]), 16);
        assert_eq!(read_le24(&[0x00, 0x01, 0x00]), 256);
        assert_eq!(read_le24(&[0xff, 0xff, 0xff]), MAX_BLOCK);
    }

    #[test]
    fn zlib_blocks_decode() {
        let original = b"pT response pT response pT response pT response pT response".repeat(20);
        let packed = compress_zlib(&original, 6).unwrap().expect("repetitive input compresses");
        assert!(packed.starts_with(b"ZL"));
        assert_eq!(decompress(&packed, original.len()).unwrap(), original);
    }

    #[test]
    fn incompressible_input_is_left_alone() {
        assert!(compress_zlib(&[1, 2, 3], 6).unwrap().is_none());
    }

    #[test]
    fn zstd_block_decodes() {
        let original = b"zstd block zstd block zstd block zstd block".to_vec();
        let body = ruzstd::encoding::compress_to_vec(
            &original[..],
            ruzstd::encoding::CompressionLevel::Fastest,
        );
        let src = block(b"ZS", 0x04, &body, original.len());
        assert_eq!(decompress(&src, original.len()).unwrap(), original);
    }

    #[test]
    fn xz_block_decodes() {
        let original = b"xz block xz block xz block xz block".to_vec();
        let mut body = Vec::new();
        lzma_rs::xz_compress(&mut std::io::BufReader::new(&original[..]), &mut body).unwrap();
        let src = block(b"XZ", 0x05, &body, original.len());
        assert_eq!(decompress(&src, original.len()).unwrap(), original);
    }

    #[test]
    fn lz4_block_decodes() {
        let original = b"lz4 block lz4 block lz4 block lz4 block".to_vec();
        let mut body = vec![0u8; 8];
        body.extend_from_slice(&lz4_flex::compress(&original));
        let src = block(b"L4", 0x01, &body, original.len());
        assert_eq!(decompress(&src, original.len()).unwrap(), original);
    }

    #[test]
    fn unknown_tag_and_truncation_fail() {
        let src = block(b"QQ", 0, &[0u8; 4], 4);
        assert!(matches!(decompress(&src, 4), Err(RootError::Decompression(_))));
        let src = block(b"ZL", 8, &[0u8; 4], 4);
        assert!(decompress(&src[..src.len() - 2], 4).is_err());
        assert!(decompress(&[], 10).is_err());
    }

    #[test]
    fn length_beyond_block_headers_is_rejected() {
        let original = b"pT response pT response pT response pT response".repeat(8);
        let packed = compress_zlib(&original, 6).unwrap().expect("repetitive input compresses");
        assert_eq!(declared_len(&packed), original.len());

        let err = decompress(&packed, usize::MAX).unwrap_err();
        assert!(err.to_string().contains("block headers declare"), "{err}");
        assert!(decompress(&packed, original.len() + 1).is_err());
        assert_eq!(decompress(&packed, original.len()).unwrap(), original);
    }
}

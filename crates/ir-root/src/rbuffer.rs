//! Big-endian cursors for ROOT's streamer encoding.
//!
//! [`RBuffer`] reads, [`WBuffer`] writes. Both follow the same conventions:
//! integers and floats are big-endian, strings carry a one-byte length (or
//! `255` followed by a `u32` length), and versioned objects start with a `u32`
//! byte count tagged with `0x4000_0000` followed by a `u16` class version.

use crate::error::{Result, RootError};

/// Flag marking the presence of a byte count in a version header.
pub const BYTECOUNT_MASK: u32 = 0x4000_0000;

/// TObject bit flagging that a process id follows the `fBits` word.
const K_IS_REFERENCED: u32 = 0x0000_0010;

/// Read cursor over a byte slice.
pub struct RBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RBuffer<'a> {
    /// Cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Cursor at an absolute offset.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// Current read position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Advance by `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.data.len()).ok_or(
            RootError::BufferUnderflow { offset: self.pos, need: n, have: self.remaining() },
        )?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a `u8`.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    /// Read a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.array().map(u16::from_be_bytes)
    }

    /// Read a big-endian `i16`.
    pub fn read_i16(&mut self) -> Result<i16> {
        self.array().map(i16::from_be_bytes)
    }

    /// Read a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.array().map(u32::from_be_bytes)
    }

    /// Read a big-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.array().map(i32::from_be_bytes)
    }

    /// Read a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.array().map(u64::from_be_bytes)
    }

    /// Read a big-endian `f32`.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.array().map(f32::from_be_bytes)
    }

    /// Read a big-endian `f64`.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.array().map(f64::from_be_bytes)
    }

    /// Read a seek pointer: `u64` in large files, `u32` otherwise.
    pub fn read_seek(&mut self, large: bool) -> Result<u64> {
        if large { self.read_u64() } else { self.read_u32().map(u64::from) }
    }

    /// Read a length-prefixed string (TString encoding).
    pub fn read_string(&mut self) -> Result<String> {
        let len = match self.read_u8()? {
            255 => self.read_u32()? as usize,
            n => n as usize,
        };
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a streamer version header.
    ///
    /// Returns the class version and, when a byte count is present, the
    /// absolute position where the object ends.
    pub fn read_version(&mut self) -> Result<(u16, Option<usize>)> {
        let start = self.pos;
        let raw = self.read_u32()?;
        if raw & BYTECOUNT_MASK == 0 {
            // Old-style header: only a u16 version.
            self.pos = start;
            return Ok((self.read_u16()?, None));
        }
        let byte_count = (raw & !BYTECOUNT_MASK) as usize;
        let version = self.read_u16()?;
        Ok((version, Some(start + 4 + byte_count)))
    }

    /// Jump to an object end returned by [`RBuffer::read_version`].
    ///
    /// A declared end before the cursor means the layout was misread.
    pub fn seek_end(&mut self, end: Option<usize>, what: &str) -> Result<()> {
        if let Some(end) = end {
            if end < self.pos {
                return Err(RootError::Deserialization(format!(
                    "{what}: read past declared end ({} > {end})",
                    self.pos
                )));
            }
            if end > self.data.len() {
                return Err(RootError::BufferUnderflow {
                    offset: self.pos,
                    need: end - self.pos,
                    have: self.remaining(),
                });
            }
            self.pos = end;
        }
        Ok(())
    }

    /// Skip a whole versioned object using its byte count.
    pub fn skip_object(&mut self, what: &str) -> Result<()> {
        let (_, end) = self.read_version()?;
        if end.is_none() {
            return Err(RootError::Deserialization(format!("{what}: missing byte count")));
        }
        self.seek_end(end, what)
    }

    /// Read a `TObject` body, returning `fBits`.
    pub fn read_tobject(&mut self) -> Result<u32> {
        let _version = self.read_u16()?;
        let _unique_id = self.read_u32()?;
        let bits = self.read_u32()?;
        if bits & K_IS_REFERENCED != 0 {
            self.skip(2)?;
        }
        Ok(bits)
    }

    /// Read a `TNamed`, returning `(name, title)`.
    pub fn read_tnamed(&mut self) -> Result<(String, String)> {
        let (_, end) = self.read_version()?;
        self.read_tobject()?;
        let name = self.read_string()?;
        let title = self.read_string()?;
        self.seek_end(end, "TNamed")?;
        Ok((name, title))
    }

    /// Read a `TArrayD`: `i32` length then `f64` values.
    pub fn read_tarray_f64(&mut self) -> Result<Vec<f64>> {
        let n = self.read_array_len()?;
        (0..n).map(|_| self.read_f64()).collect()
    }

    /// Read a `TArrayF` widened to `f64`.
    pub fn read_tarray_f32(&mut self) -> Result<Vec<f64>> {
        let n = self.read_array_len()?;
        (0..n).map(|_| self.read_f32().map(f64::from)).collect()
    }

    /// Read a `TArrayI` widened to `f64`.
    pub fn read_tarray_i32(&mut self) -> Result<Vec<f64>> {
        let n = self.read_array_len()?;
        (0..n).map(|_| self.read_i32().map(f64::from)).collect()
    }

    /// Read a `TArrayS` widened to `f64`.
    pub fn read_tarray_i16(&mut self) -> Result<Vec<f64>> {
        let n = self.read_array_len()?;
        (0..n).map(|_| self.read_i16().map(f64::from)).collect()
    }

    fn read_array_len(&mut self) -> Result<usize> {
        let n = self.read_i32()?;
        if n < 0 {
            return Err(RootError::Deserialization(format!("negative array length {n}")));
        }
        let n = n as usize;
        // Each element takes at least two bytes; reject lengths the buffer cannot hold.
        if n > self.remaining() / 2 + 1 {
            return Err(RootError::BufferUnderflow {
                offset: self.pos,
                need: n * 2,
                have: self.remaining(),
            });
        }
        Ok(n)
    }
}

/// Growable write cursor producing ROOT streamer bytes.
#[derive(Debug, Default)]
pub struct WBuffer {
    data: Vec<u8>,
}

impl WBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take the written bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, b: &[u8]) {
        self.data.extend_from_slice(b);
    }

    /// Write a `u8`.
    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    /// Write a big-endian `u16`.
    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_be_bytes());
    }

    /// Write a big-endian `i16`.
    pub fn write_i16(&mut self, v: i16) {
        self.write_bytes(&v.to_be_bytes());
    }

    /// Write a big-endian `u32`.
    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_be_bytes());
    }

    /// Write a big-endian `i32`.
    pub fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_be_bytes());
    }

    /// Write a big-endian `f32`.
    pub fn write_f32(&mut self, v: f32) {
        self.write_bytes(&v.to_be_bytes());
    }

    /// Write a big-endian `f64`.
    pub fn write_f64(&mut self, v: f64) {
        self.write_bytes(&v.to_be_bytes());
    }

    /// Write a TString.
    pub fn write_string(&mut self, s: &str) {
        let b = s.as_bytes();
        if b.len() < 255 {
            self.write_u8(b.len() as u8);
        } else {
            self.write_u8(255);
            self.write_u32(b.len() as u32);
        }
        self.write_bytes(b);
    }

    /// Open a versioned object; pass the returned mark to [`WBuffer::end_object`].
    pub fn begin_object(&mut self, version: u16) -> usize {
        let mark = self.data.len();
        self.write_u32(0);
        self.write_u16(version);
        mark
    }

    /// Patch the byte count of the object opened at `mark`.
    pub fn end_object(&mut self, mark: usize) {
        let count = (self.data.len() - mark - 4) as u32 | BYTECOUNT_MASK;
        self.data[mark..mark + 4].copy_from_slice(&count.to_be_bytes());
    }

    /// Write a `TObject` body with the given `fBits`.
    pub fn write_tobject(&mut self, bits: u32) {
        self.write_u16(1);
        self.write_u32(0);
        self.write_u32(bits);
    }

    /// Write a `TNamed`.
    pub fn write_tnamed(&mut self, name: &str, title: &str) {
        let mark = self.begin_object(1);
        self.write_tobject(0x0300_0000);
        self.write_string(name);
        self.write_string(title);
        self.end_object(mark);
    }

    /// Write a `TArrayD`.
    pub fn write_tarray_f64(&mut self, values: &[f64]) {
        self.write_i32(values.len() as i32);
        for &v in values {
            self.write_f64(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x40, 0x09, 0x21, 0xfb, 0x54, 0x44, 0x2d, 0x18];
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_u32().unwrap(), 0x0102_0304);
        assert!((r.read_f64().unwrap() - std::f64::consts::PI).abs() < 1e-15);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn long_string_uses_escape_byte() {
        let s = "x".repeat(300);
        let mut w = WBuffer::new();
        w.write_string(&s);
        assert_eq!(w.len(), 1 + 4 + 300);
        let bytes = w.into_inner();
        assert_eq!(bytes[0], 255);
        assert_eq!(RBuffer::new(&bytes).read_string().unwrap(), s);
    }

    #[test]
    fn version_with_bytecount() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x4000_0010u32.to_be_bytes());
        data.extend_from_slice(&3u16.to_be_bytes());
        data.extend_from_slice(&[0u8; 20]);
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_version().unwrap(), (3, Some(20)));
    }

    #[test]
    fn version_without_bytecount() {
        let data = [0x00, 0x05, 0x00, 0x00];
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_version().unwrap(), (5, None));
        assert_eq!(r.pos(), 2);
    }

    #[test]
    fn nested_objects_patch_counts() {
        let mut w = WBuffer::new();
        let outer = w.begin_object(8);
        w.write_tnamed("h", "title");
        w.write_i32(7);
        w.end_object(outer);
        let bytes = w.into_inner();

        let mut r = RBuffer::new(&bytes);
        let (ver, end) = r.read_version().unwrap();
        assert_eq!(ver, 8);
        assert_eq!(end, Some(bytes.len()));
        assert_eq!(r.read_tnamed().unwrap(), ("h".to_string(), "title".to_string()));
        assert_eq!(r.read_i32().unwrap(), 7);
        r.seek_end(end, "outer").unwrap();
    }

    #[test]
    fn underflow_reports_offset() {
        let mut r = RBuffer::new(&[1, 2, 3]);
        r.skip(2).unwrap();
        match r.read_u32() {
            Err(RootError::BufferUnderflow { offset, need, have }) => {
                assert_eq!((offset, need, have), (2, 4, 1));
            }
            other => panic!("expected underflow, got {other:?}"),
        }
    }

    #[test]
    fn absurd_array_length_rejected() {
        let mut w = WBuffer::new();
        w.write_i32(1_000_000);
        let bytes = w.into_inner();
        assert!(RBuffer::new(&bytes).read_tarray_f64().is_err());
    }
}

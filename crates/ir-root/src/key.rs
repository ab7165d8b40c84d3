//! TKey records: the headers locating every object in a ROOT file.

use crate::error::Result;
use crate::rbuffer::{RBuffer, WBuffer};

/// Key class version above which seek pointers are 64-bit.
const LARGE_KEY_VERSION: u16 = 1000;

/// A parsed TKey header.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    /// Key header plus stored (possibly compressed) object bytes.
    pub n_bytes: u32,
    /// Key class version.
    pub version: u16,
    /// Uncompressed object length.
    pub obj_len: u32,
    /// Packed ROOT date/time.
    pub datime: u32,
    /// Length of this header.
    pub key_len: u16,
    /// Cycle number of the object within its directory.
    pub cycle: u16,
    /// Absolute offset of the key.
    pub seek_key: u64,
    /// Offset of the owning directory.
    pub seek_pdir: u64,
    /// Stored object class.
    pub class_name: String,
    /// Object name.
    pub name: String,
    /// Object title.
    pub title: String,
}

/// Summary of a key as returned by `RootFile::list_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Object name.
    pub name: String,
    /// Class name, e.g. `TH1D` or `TDirectoryFile`.
    pub class_name: String,
    /// Cycle number.
    pub cycle: u16,
}

impl From<&Key> for KeyInfo {
    fn from(key: &Key) -> Self {
        Self { name: key.name.clone(), class_name: key.class_name.clone(), cycle: key.cycle }
    }
}

impl Key {
    /// Parse a header at the cursor. `is_large` forces 64-bit seeks.
    pub fn read(r: &mut RBuffer, is_large: bool) -> Result<Self> {
        let n_bytes = r.read_u32()?;
        let version = r.read_u16()?;
        let obj_len = r.read_u32()?;
        let datime = r.read_u32()?;
        let key_len = r.read_u16()?;
        let cycle = r.read_u16()?;
        let large = is_large || version > LARGE_KEY_VERSION;
        let seek_key = r.read_seek(large)?;
        let seek_pdir = r.read_seek(large)?;
        let class_name = r.read_string()?;
        let name = r.read_string()?;
        let title = r.read_string()?;
        Ok(Key {
            n_bytes,
            version,
            obj_len,
            datime,
            key_len,
            cycle,
            seek_key,
            seek_pdir,
            class_name,
            name,
            title,
        })
    }

    /// Serialized header length for small-file keys with these strings.
    pub fn header_len(class_name: &str, name: &str, title: &str) -> usize {
        fn tstring_len(s: &str) -> usize {
            if s.len() < 255 { 1 + s.len() } else { 5 + s.len() }
        }
        4 + 2 + 4 + 4 + 2 + 2 + 4 + 4 + tstring_len(class_name) + tstring_len(name) + tstring_len(title)
    }

    /// Write a small-file (32-bit seek) header.
    pub fn write(&self, w: &mut WBuffer) {
        w.write_u32(self.n_bytes);
        w.write_u16(self.version);
        w.write_u32(self.obj_len);
        w.write_u32(self.datime);
        w.write_u16(self.key_len);
        w.write_u16(self.cycle);
        w.write_u32(self.seek_key as u32);
        w.write_u32(self.seek_pdir as u32);
        w.write_string(&self.class_name);
        w.write_string(&self.name);
        w.write_string(&self.title);
    }

    /// Whether the stored object bytes are compressed.
    pub fn is_compressed(&self) -> bool {
        self.obj_len as usize != (self.n_bytes as usize).saturating_sub(self.key_len as usize)
    }
}

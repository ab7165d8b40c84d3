//! TDirectory key lists.

use std::collections::HashMap;

use crate::error::{Result, RootError};
use crate::key::Key;
use crate::rbuffer::RBuffer;

/// Directory class version above which seek pointers are 64-bit.
const LARGE_DIR_VERSION: u16 = 1000;

/// Location of a directory's key list, decoded from a TDirectory streamer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryHeader {
    /// Bytes occupied by the key list record.
    pub nbytes_keys: u32,
    /// Offset of the key list record (0 for an empty directory).
    pub seek_keys: u64,
}

impl DirectoryHeader {
    /// Decode the TDirectory streamer at the cursor.
    pub fn read(r: &mut RBuffer) -> Result<Self> {
        let version = r.read_u16()?;
        let _datime_c = r.read_u32()?;
        let _datime_m = r.read_u32()?;
        let nbytes_keys = r.read_u32()?;
        let _nbytes_name = r.read_u32()?;
        let large = version > LARGE_DIR_VERSION;
        let _seek_dir = r.read_seek(large)?;
        let _seek_parent = r.read_seek(large)?;
        let seek_keys = r.read_seek(large)?;
        Ok(Self { nbytes_keys, seek_keys })
    }
}

/// The ordered keys of one directory.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    keys: Vec<Key>,
}

impl Directory {
    /// Read the key list record at `header.seek_keys`.
    ///
    /// The record is itself a TKey header followed by a `u32` key count and
    /// that many key headers.
    pub fn read_key_list(file_data: &[u8], header: DirectoryHeader, is_large: bool) -> Result<Self> {
        if header.seek_keys == 0 {
            return Ok(Self::default());
        }
        let seek = usize::try_from(header.seek_keys).map_err(|_| {
            RootError::Deserialization(format!("key list offset too large: {}", header.seek_keys))
        })?;
        let mut r = RBuffer::at(file_data, seek);
        let _list_key = Key::read(&mut r, is_large)?;
        let nkeys = r.read_u32()? as usize;
        let mut keys = Vec::with_capacity(nkeys.min(r.remaining() / 26 + 1));
        for _ in 0..nkeys {
            keys.push(Key::read(&mut r, is_large)?);
        }
        Ok(Self { keys })
    }

    /// Read a subdirectory from the decompressed payload of its key.
    pub fn read_from_payload(payload: &[u8], file_data: &[u8], is_large: bool) -> Result<Self> {
        let header = DirectoryHeader::read(&mut RBuffer::new(payload))?;
        Self::read_key_list(file_data, header, is_large)
    }

    /// All keys in stored order (every cycle included).
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Highest cycle of `name`.
    pub fn find_key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().filter(|k| k.name == name).max_by_key(|k| k.cycle)
    }

    /// One key per name (its highest cycle), ordered by first appearance.
    pub fn latest_cycles(&self) -> Vec<&Key> {
        let mut slot: HashMap<&str, usize> = HashMap::new();
        let mut out: Vec<&Key> = Vec::new();
        for key in &self.keys {
            match slot.get(key.name.as_str()) {
                Some(&i) => {
                    if key.cycle > out[i].cycle {
                        out[i] = key;
                    }
                }
                None => {
                    slot.insert(key.name.as_str(), out.len());
                    out.push(key);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str, cycle: u16) -> Key {
        Key {
            n_bytes: 0,
            version: 4,
            obj_len: 0,
            datime: 0,
            key_len: 0,
            cycle,
            seek_key: 0,
            seek_pdir: 0,
            class_name: "TH1D".into(),
            name: name.into(),
            title: String::new(),
        }
    }

    #[test]
    fn latest_cycles_keep_first_appearance_order() {
        let dir = Directory { keys: vec![key("b", 1), key("a", 2), key("b", 3), key("a", 1)] };
        let got: Vec<(&str, u16)> =
            dir.latest_cycles().iter().map(|k| (k.name.as_str(), k.cycle)).collect();
        assert_eq!(got, vec![("b", 3), ("a", 2)]);
        assert_eq!(dir.find_key("a").map(|k| k.cycle), Some(2));
        assert!(dir.find_key("c").is_none());
    }

    #[test]
    fn empty_directory_has_no_keys() {
        let dir = Directory::read_key_list(&[], DirectoryHeader { nbytes_keys: 0, seek_keys: 0 }, false)
            .unwrap();
        assert!(dir.keys().is_empty());
    }
}

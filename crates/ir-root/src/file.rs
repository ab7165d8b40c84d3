//! TFile header parsing and the top-level read interface.

use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::decompress::decompress;
use crate::directory::{Directory, DirectoryHeader};
use crate::error::{Result, RootError};
use crate::histogram::Histogram;
use crate::key::{Key, KeyInfo};
use crate::objects;
use crate::rbuffer::RBuffer;

/// `"root"` file magic.
pub(crate) const ROOT_MAGIC: &[u8; 4] = b"root";
/// File versions at or above this use 64-bit seek pointers.
pub(crate) const LARGE_FILE_VERSION: u32 = 1_000_000;

/// File bytes: memory-mapped from disk, or owned (tests, fuzzing).
enum Backing {
    Owned(Vec<u8>),
    Mmap(memmap2::Mmap),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Backing::Owned(v) => v,
            Backing::Mmap(m) => m,
        }
    }
}

/// The pieces of the file header needed to reach the top directory.
#[derive(Debug, Clone, Copy)]
struct FileHeader {
    version: u32,
    is_large: bool,
    compress: u32,
    top: DirectoryHeader,
}

/// A ROOT file opened read-only.
pub struct RootFile {
    data: Backing,
    header: FileHeader,
    path: PathBuf,
}

impl std::fmt::Debug for RootFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootFile")
            .field("path", &self.path)
            .field("len", &self.data.len())
            .field("header", &self.header)
            .finish()
    }
}

impl RootFile {
    /// Memory-map and parse a file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = fs::File::open(&path).map_err(|e| {
            RootError::Io(std::io::Error::new(e.kind(), format!("{}: {e}", path.display())))
        })?;
        // SAFETY: the mapping is only read; concurrent truncation of the file
        // by another process is outside what this reader guards against.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::from_backing(Backing::Mmap(mmap), path)
    }

    /// Parse a file held in memory.
    pub fn from_bytes(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        Self::from_backing(Backing::Owned(data), path)
    }

    fn from_backing(data: Backing, path: PathBuf) -> Result<Self> {
        if data.len() < 4 || &data[0..4] != ROOT_MAGIC {
            return Err(RootError::BadMagic);
        }
        let header = parse_header(&data)?;
        log::debug!(
            "opened {} (version {}, compress {}, {} bytes)",
            path.display(),
            header.version,
            header.compress,
            data.len()
        );
        Ok(Self { data, header, path })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ROOT version that wrote the file.
    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Top-level keys in key-list order, every cycle included.
    pub fn list_keys(&self) -> Result<Vec<KeyInfo>> {
        Ok(self.top_directory()?.keys().iter().map(KeyInfo::from).collect())
    }

    /// Every top-level histogram of a supported class, highest cycle per
    /// name, in order of first appearance in the key list.
    ///
    /// Other classes (including subdirectories) are skipped.
    pub fn histograms(&self) -> Result<Vec<Histogram>> {
        let dir = self.top_directory()?;
        let mut out = Vec::new();
        for key in dir.latest_cycles() {
            if !objects::is_supported_histogram(&key.class_name) {
                log::debug!("skipping key '{}' of class {}", key.name, key.class_name);
                continue;
            }
            let payload = self.read_key_payload(key)?;
            out.push(objects::read_histogram(&payload, &key.class_name)?);
        }
        Ok(out)
    }

    /// Read a histogram by path, e.g. `"h"` or `"dir/sub/h"`.
    pub fn get_histogram(&self, path: &str) -> Result<Histogram> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, dirs)) = parts.split_last() else {
            return Err(RootError::KeyNotFound(path.to_string()));
        };

        let mut dir = self.top_directory()?;
        for &part in dirs {
            let key = dir
                .find_key(part)
                .ok_or_else(|| RootError::KeyNotFound(format!("{part} (in path {path})")))?;
            if key.class_name != "TDirectoryFile" && key.class_name != "TDirectory" {
                return Err(RootError::Deserialization(format!(
                    "'{part}' is not a directory (class {})",
                    key.class_name
                )));
            }
            let payload = self.read_key_payload(key)?;
            dir = Directory::read_from_payload(&payload, &self.data, self.header.is_large)?;
        }

        let key = dir.find_key(leaf).ok_or_else(|| RootError::KeyNotFound(path.to_string()))?;
        let payload = self.read_key_payload(key)?;
        objects::read_histogram(&payload, &key.class_name)
    }

    fn top_directory(&self) -> Result<Directory> {
        Directory::read_key_list(&self.data, self.header.top, self.header.is_large)
    }

    fn read_key_payload(&self, key: &Key) -> Result<Vec<u8>> {
        read_key_payload_from(&self.data, key)
    }
}

/// Header layout (small files; seeks widen to u64 when `fVersion >= 1000000`):
/// ```text
///  0  "root"        4  fVersion      8  fBEGIN
/// 12  fEND         16  fSeekFree    20  fNbytesFree
/// 24  nfree        28  fNbytesName  32  fUnits (u8)
/// 33  fCompress    37  fSeekInfo    41  fNbytesInfo   45  fUUID
/// ```
/// The top TDirectory streamer sits at `fBEGIN + fNbytesName`.
fn parse_header(data: &[u8]) -> Result<FileHeader> {
    let mut r = RBuffer::at(data, 4);
    let version = r.read_u32()?;
    let is_large = version >= LARGE_FILE_VERSION;
    let begin = r.read_u32()? as usize;
    let _end = r.read_seek(is_large)?;
    let _seek_free = r.read_seek(is_large)?;
    let _nbytes_free = r.read_u32()?;
    let _nfree = r.read_u32()?;
    let nbytes_name = r.read_u32()? as usize;
    let _units = r.read_u8()?;
    let compress = r.read_u32()?;

    let dir_offset = begin
        .checked_add(nbytes_name)
        .filter(|&o| o < data.len())
        .ok_or_else(|| RootError::Deserialization("top directory offset past end of file".into()))?;
    let top = DirectoryHeader::read(&mut RBuffer::at(data, dir_offset))?;
    Ok(FileHeader { version, is_large, compress, top })
}

/// Stored object bytes of `key`, decompressed when needed.
pub(crate) fn read_key_payload_from(data: &[u8], key: &Key) -> Result<Vec<u8>> {
    let start = usize::try_from(key.seek_key)
        .map_err(|_| RootError::Deserialization(format!("seek offset too large: {}", key.seek_key)))?;
    let n_bytes = key.n_bytes as usize;
    let record = start
        .checked_add(n_bytes)
        .and_then(|end| data.get(start..end))
        .ok_or(RootError::BufferUnderflow {
            offset: start,
            need: n_bytes,
            have: data.len().saturating_sub(start),
        })?;
    let body = record.get(key.key_len as usize..).ok_or_else(|| {
        RootError::Deserialization(format!(
            "key '{}': header length {} exceeds record size {n_bytes}",
            key.name, key.key_len
        ))
    })?;

    if key.is_compressed() {
        decompress(body, key.obj_len as usize)
    } else {
        Ok(body.to_vec())
    }
}

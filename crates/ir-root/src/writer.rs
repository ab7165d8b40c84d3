//! Minimal ROOT file writer for TH1D histograms.
//!
//! Produces small-format (32-bit seek) files: header, TFile record with the
//! top directory, one keyed record per histogram or `TDirectoryFile`, and a
//! key list per directory. No StreamerInfo or free-segment records are
//! written.

use std::collections::HashMap;
use std::path::Path;

use crate::decompress::compress_zlib;
use crate::error::{Result, RootError};
use crate::file::ROOT_MAGIC;
use crate::histogram::Histogram;
use crate::key::Key;
use crate::objects;
use crate::rbuffer::WBuffer;

/// Offset of the first record (`fBEGIN`).
const BEGIN: usize = 100;
/// File format version written to the header (ROOT 6.22/06, small seeks).
const FILE_VERSION: u32 = 62206;
const KEY_VERSION: u16 = 4;
const DIRECTORY_VERSION: u16 = 5;
const DIRECTORY_CLASS: &str = "TDirectoryFile";
/// 2024-01-01 00:00:00 in ROOT's packed TDatime layout.
const DATIME: u32 = (2024 - 1995) << 26 | 1 << 22 | 1 << 17;
/// TDirectory streamer: version, two datimes, nbytes_keys, nbytes_name,
/// three seeks, UUID (u16 version + 16 bytes) and 12 bytes of padding.
const DIRECTORY_LEN: usize = 2 + 4 + 4 + 4 + 4 + 4 + 4 + 4 + 18 + 12;

struct Record {
    key: Key,
    body: Vec<u8>,
}

/// Directory contents in insertion order.
#[derive(Debug, Clone, Copy)]
enum Entry {
    Histogram(usize),
    Directory(usize),
}

#[derive(Debug, Clone, Default)]
struct DirNode {
    name: String,
    entries: Vec<Entry>,
    histograms: Vec<Histogram>,
    subdirs: Vec<DirNode>,
}

impl DirNode {
    fn named(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    /// Child directory `name`, created on first use.
    fn subdir_mut(&mut self, name: &str) -> &mut DirNode {
        let i = match self.subdirs.iter().position(|d| d.name == name) {
            Some(i) => i,
            None => {
                self.subdirs.push(DirNode::named(name));
                self.entries.push(Entry::Directory(self.subdirs.len() - 1));
                self.subdirs.len() - 1
            }
        };
        &mut self.subdirs[i]
    }

    fn histogram_count(&self) -> usize {
        self.histograms.len() + self.subdirs.iter().map(DirNode::histogram_count).sum::<usize>()
    }
}

/// Where a directory's key list ended up.
struct KeyList {
    seek_keys: usize,
    nbytes_keys: usize,
}

/// File offsets assigned while records are appended in write order.
struct Layout<'a> {
    compression: u32,
    pos: usize,
    records: Vec<Record>,
    /// Name and title stored on the top directory's key list.
    file_name: &'a str,
    title: &'a str,
}

impl Layout<'_> {
    fn push(&mut self, key: Key, body: Vec<u8>) -> usize {
        self.pos += key.key_len as usize + body.len();
        self.records.push(Record { key, body });
        self.records.len() - 1
    }

    /// Append the records of `dir` (contents first, then its key list).
    /// `seek_dir` is the offset of the key that owns the directory.
    fn place_dir(&mut self, dir: &DirNode, seek_dir: usize, is_top: bool) -> Result<KeyList> {
        let mut cycles: HashMap<&str, u16> = HashMap::new();
        let mut keys: Vec<Key> = Vec::with_capacity(dir.entries.len());

        for entry in &dir.entries {
            match *entry {
                Entry::Histogram(i) => {
                    let h = &dir.histograms[i];
                    let raw = objects::write_histogram(h);
                    let body = match self.compression {
                        0 => raw.clone(),
                        level => compress_zlib(&raw, level)?.unwrap_or_else(|| raw.clone()),
                    };
                    let cycle = cycles.entry(h.name.as_str()).or_insert(0);
                    *cycle += 1;
                    let key_len = Key::header_len("TH1D", &h.name, &h.title);
                    let key = Key {
                        n_bytes: to_u32(key_len + body.len())?,
                        version: KEY_VERSION,
                        obj_len: to_u32(raw.len())?,
                        datime: DATIME,
                        key_len: key_len as u16,
                        cycle: *cycle,
                        seek_key: self.pos as u64,
                        seek_pdir: seek_dir as u64,
                        class_name: "TH1D".into(),
                        name: h.name.clone(),
                        title: h.title.clone(),
                    };
                    keys.push(key.clone());
                    self.push(key, body);
                }
                Entry::Directory(i) => {
                    let sub = &dir.subdirs[i];
                    let cycle = cycles.entry(sub.name.as_str()).or_insert(0);
                    *cycle += 1;
                    let key_len = Key::header_len(DIRECTORY_CLASS, &sub.name, &sub.name);
                    let sub_pos = self.pos;
                    let key = Key {
                        n_bytes: to_u32(key_len + DIRECTORY_LEN)?,
                        version: KEY_VERSION,
                        obj_len: DIRECTORY_LEN as u32,
                        datime: DATIME,
                        key_len: key_len as u16,
                        cycle: *cycle,
                        seek_key: sub_pos as u64,
                        seek_pdir: seek_dir as u64,
                        class_name: DIRECTORY_CLASS.into(),
                        name: sub.name.clone(),
                        title: sub.name.clone(),
                    };
                    keys.push(key.clone());
                    // The streamer needs the child's key list offset, known
                    // only after its contents are placed.
                    let slot = self.push(key, vec![0u8; DIRECTORY_LEN]);
                    let list = self.place_dir(sub, sub_pos, false)?;
                    let mut w = WBuffer::new();
                    write_directory(&mut w, list.nbytes_keys, key_len, sub_pos, seek_dir, list.seek_keys);
                    self.records[slot].body = w.into_inner();
                }
            }
        }

        let (class, name, title) = if is_top {
            ("TFile", self.file_name, self.title)
        } else {
            ("TDirectory", dir.name.as_str(), dir.name.as_str())
        };
        let list_key_len = Key::header_len(class, name, title);
        let mut body = WBuffer::new();
        body.write_u32(keys.len() as u32);
        for key in &keys {
            key.write(&mut body);
        }
        let body = body.into_inner();
        let nbytes_keys = list_key_len + body.len();
        let seek_keys = self.pos;
        let key = Key {
            n_bytes: to_u32(nbytes_keys)?,
            version: KEY_VERSION,
            obj_len: to_u32(body.len())?,
            datime: DATIME,
            key_len: list_key_len as u16,
            cycle: 1,
            seek_key: seek_keys as u64,
            seek_pdir: seek_dir as u64,
            class_name: class.into(),
            name: name.to_string(),
            title: title.to_string(),
        };
        self.push(key, body);
        Ok(KeyList { seek_keys, nbytes_keys })
    }
}

/// Collects histograms and serializes them into a ROOT file.
#[derive(Debug, Clone)]
pub struct RootWriter {
    file_name: String,
    title: String,
    compression: u32,
    top: DirNode,
}

impl RootWriter {
    /// Writer for a file named `file_name` (stored in the TFile record).
    pub fn new(file_name: impl Into<String>) -> Self {
        Self { file_name: file_name.into(), title: String::new(), compression: 0, top: DirNode::default() }
    }

    /// Zlib level 1-9; 0 stores payloads uncompressed.
    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = level.min(9);
        self
    }

    /// Queue a top-level histogram. Writing the same name twice creates a
    /// new cycle.
    pub fn add(&mut self, h: Histogram) -> &mut Self {
        self.add_in("", h)
    }

    /// Queue a histogram inside `dir` (`"jets"`, `"jets/central"`), creating
    /// the directories on first use. An empty path is the top directory.
    pub fn add_in(&mut self, dir: &str, h: Histogram) -> &mut Self {
        let mut node = &mut self.top;
        for part in dir.split('/').filter(|s| !s.is_empty()) {
            node = node.subdir_mut(part);
        }
        node.histograms.push(h);
        node.entries.push(Entry::Histogram(node.histograms.len() - 1));
        self
    }

    /// Serialize all queued histograms.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let file_key_len = Key::header_len("TFile", &self.file_name, &self.title);
        let names_len = tstring_len(&self.file_name) + tstring_len(&self.title);

        let mut layout = Layout {
            compression: self.compression,
            pos: BEGIN + file_key_len + names_len + DIRECTORY_LEN,
            records: Vec::new(),
            file_name: &self.file_name,
            title: &self.title,
        };
        let top = layout.place_dir(&self.top, BEGIN, true)?;
        let end = layout.pos;
        to_u32(end)?;

        let mut w = WBuffer::new();
        self.write_header(&mut w, end, file_key_len + names_len);
        w.write_bytes(&vec![0u8; BEGIN - w.len()]);

        let file_obj_len = names_len + DIRECTORY_LEN;
        Key {
            n_bytes: (file_key_len + file_obj_len) as u32,
            version: KEY_VERSION,
            obj_len: file_obj_len as u32,
            datime: DATIME,
            key_len: file_key_len as u16,
            cycle: 1,
            seek_key: BEGIN as u64,
            seek_pdir: 0,
            class_name: "TFile".into(),
            name: self.file_name.clone(),
            title: self.title.clone(),
        }
        .write(&mut w);
        w.write_string(&self.file_name);
        w.write_string(&self.title);
        write_directory(&mut w, top.nbytes_keys, file_key_len + names_len, BEGIN, 0, top.seek_keys);

        for rec in &layout.records {
            debug_assert_eq!(w.len() as u64, rec.key.seek_key);
            rec.key.write(&mut w);
            w.write_bytes(&rec.body);
        }

        let bytes = w.into_inner();
        if bytes.len() != end {
            return Err(RootError::Write(format!("layout mismatch: wrote {} bytes, planned {end}", bytes.len())));
        }
        Ok(bytes)
    }

    /// Serialize and write to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        log::debug!("wrote {} histograms to {}", self.top.histogram_count(), path.as_ref().display());
        Ok(())
    }

    fn write_header(&self, w: &mut WBuffer, end: usize, nbytes_name: usize) {
        w.write_bytes(ROOT_MAGIC);
        w.write_u32(FILE_VERSION);
        w.write_u32(BEGIN as u32);
        w.write_u32(end as u32); // fEND
        w.write_u32(end as u32); // fSeekFree
        w.write_u32(0); // fNbytesFree
        w.write_u32(0); // nfree
        w.write_u32(nbytes_name as u32);
        w.write_u8(4); // fUnits
        w.write_u32(if self.compression > 0 { 100 + self.compression } else { 0 });
        w.write_u32(0); // fSeekInfo
        w.write_u32(0); // fNbytesInfo
        w.write_u16(4); // UUID version
        w.write_bytes(&[0u8; 16]);
    }
}

/// TDirectory streamer, `DIRECTORY_LEN` bytes.
fn write_directory(
    w: &mut WBuffer,
    nbytes_keys: usize,
    nbytes_name: usize,
    seek_dir: usize,
    seek_parent: usize,
    seek_keys: usize,
) {
    w.write_u16(DIRECTORY_VERSION);
    w.write_u32(DATIME);
    w.write_u32(DATIME);
    w.write_u32(nbytes_keys as u32);
    w.write_u32(nbytes_name as u32);
    w.write_u32(seek_dir as u32);
    w.write_u32(seek_parent as u32);
    w.write_u32(seek_keys as u32);
    w.write_u16(4); // UUID version
    w.write_bytes(&[0u8; 16]);
    w.write_bytes(&[0u8; 12]);
}

fn tstring_len(s: &str) -> usize {
    if s.len() < 255 { 1 + s.len() } else { 5 + s.len() }
}

fn to_u32(n: usize) -> Result<u32> {
    u32::try_from(n)
        .ok()
        .filter(|&v| v <= i32::MAX as u32)
        .ok_or_else(|| RootError::Write(format!("{n} bytes exceeds the small-file format")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::RootFile;
    use std::path::PathBuf;

    fn hist(name: &str, fills: &[f64]) -> Histogram {
        let mut h = Histogram::uniform(name, "title", 8, 0.0, 8.0).unwrap();
        for &x in fills {
            h.fill(x, 1.0);
        }
        h
    }

    #[test]
    fn empty_file_is_readable() {
        let bytes = RootWriter::new("empty.root").to_bytes().unwrap();
        let f = RootFile::from_bytes(bytes, PathBuf::from("empty.root")).unwrap();
        assert!(f.list_keys().unwrap().is_empty());
        assert!(f.histograms().unwrap().is_empty());
    }

    #[test]
    fn cycles_increment_per_name() {
        let mut w = RootWriter::new("c.root");
        w.add(hist("a", &[1.0])).add(hist("b", &[2.0])).add(hist("a", &[3.0, 3.5]));
        let f = RootFile::from_bytes(w.to_bytes().unwrap(), PathBuf::from("c.root")).unwrap();
        let keys: Vec<(String, u16)> =
            f.list_keys().unwrap().into_iter().map(|k| (k.name, k.cycle)).collect();
        assert_eq!(keys, vec![("a".into(), 1), ("b".into(), 1), ("a".into(), 2)]);
        assert_eq!(f.get_histogram("a").unwrap().entries, 2.0);
    }

    #[test]
    fn compressed_records_round_trip() {
        let fills: Vec<f64> = (0..200).map(|i| (i % 8) as f64 + 0.5).collect();
        let mut w = RootWriter::new("z.root").with_compression(6);
        w.add(hist("h", &fills));
        let bytes = w.to_bytes().unwrap();
        let f = RootFile::from_bytes(bytes, PathBuf::from("z.root")).unwrap();
        let h = f.get_histogram("h").unwrap();
        assert_eq!(h.bin_content, vec![25.0; 8]);
    }

    #[test]
    fn subdirectory_keys_and_layout() {
        let mut w = RootWriter::new("d.root");
        w.add(hist("top", &[1.0]));
        w.add_in("jets", hist("a", &[2.0, 2.5]));
        w.add_in("jets/central", hist("b", &[3.0, 3.5, 3.7]));
        w.add_in("/jets/", hist("c", &[4.0]));
        w.add(hist("last", &[5.0]));
        let f = RootFile::from_bytes(w.to_bytes().unwrap(), PathBuf::from("d.root")).unwrap();

        let keys: Vec<(String, String)> =
            f.list_keys().unwrap().into_iter().map(|k| (k.name, k.class_name)).collect();
        assert_eq!(
            keys,
            vec![
                ("top".into(), "TH1D".into()),
                ("jets".into(), "TDirectoryFile".into()),
                ("last".into(), "TH1D".into()),
            ]
        );
        assert_eq!(f.get_histogram("jets/a").unwrap().entries, 2.0);
        assert_eq!(f.get_histogram("jets/c").unwrap().entries, 1.0);
        assert_eq!(f.get_histogram("jets/central/b").unwrap().entries, 3.0);
    }
}

//! # ir-root
//!
//! Native ROOT file access for one-dimensional histograms.
//!
//! Reads `TH1D`/`TH1F`/`TH1I`/`TH1S` objects, including their stored fill
//! statistics, from `.root` files without a ROOT installation. Handles
//! zlib, LZ4, ZSTD and XZ compressed records. A small writer produces
//! `TH1D` files for fixtures.
//!
//! ## Example
//!
//! ```no_run
//! use ir_root::RootFile;
//!
//! let f = RootFile::open("input.root").unwrap();
//! for key in f.list_keys().unwrap() {
//!     println!("{} ({};{})", key.name, key.class_name, key.cycle);
//! }
//! for h in f.histograms().unwrap() {
//!     println!("{}: mean {:.3}, std dev {:.3}", h.name, h.mean(), h.std_dev());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decompress;
pub mod directory;
pub mod error;
pub mod file;
pub mod histogram;
pub mod key;
pub mod objects;
pub mod rbuffer;
pub mod writer;

pub use error::{Result, RootError};
pub use file::RootFile;
pub use histogram::{Histogram, HistogramStats};
pub use key::KeyInfo;
pub use writer::RootWriter;

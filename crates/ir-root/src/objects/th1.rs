//! TH1 streamers.
//!
//! ```text
//! TH1x                        version + byte count
//!   TH1                       version + byte count
//!     TNamed                  name, title
//!     TAttLine/Fill/Marker    skipped by byte count
//!     fNcells                 i32 (n_bins + 2)
//!     fXaxis                  TAxis: TNamed, TAttAxis, fNbins, fXmin, fXmax, fXbins ...
//!     fYaxis, fZaxis          skipped by byte count
//!     fBarOffset, fBarWidth   i16, i16
//!     fEntries, fTsumw, fTsumw2, fTsumwx, fTsumwx2
//!     fMaximum, fMinimum      (v >= 2)
//!     fNormFactor             (v >= 3)
//!     fContour, fSumw2        TArrayD
//!     fOption                 TString
//!     fFunctions              TList
//!     fBufferSize ...         (v >= 4, not needed here)
//!   TArrayD/F/I/S             fNcells bin contents incl. under/overflow
//! ```

use crate::error::{Result, RootError};
use crate::histogram::{Histogram, HistogramStats};
use crate::rbuffer::{RBuffer, WBuffer};

/// Element type of the bin-content array following the TH1 base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentArray {
    /// `TArrayD` (TH1D)
    F64,
    /// `TArrayF` (TH1F)
    F32,
    /// `TArrayI` (TH1I)
    I32,
    /// `TArrayS` (TH1S)
    I16,
}

const TH1D_VERSION: u16 = 3;
const TH1_VERSION: u16 = 8;
const TAXIS_VERSION: u16 = 10;
const TATTAXIS_VERSION: u16 = 4;
const TLIST_VERSION: u16 = 5;
/// ROOT's "unset" marker for fMaximum/fMinimum.
const UNSET: f64 = -1111.0;

struct Axis {
    n_bins: i32,
    x_min: f64,
    x_max: f64,
    edges: Vec<f64>,
}

struct Th1Base {
    name: String,
    title: String,
    n_cells: i32,
    axis: Axis,
    entries: f64,
    stats: HistogramStats,
    sumw2: Vec<f64>,
}

/// Decode a TH1D/F/I/S payload.
pub(crate) fn read_th1(data: &[u8], contents: ContentArray) -> Result<Histogram> {
    let mut r = RBuffer::new(data);
    let (_version, end) = r.read_version()?;

    let base = read_th1_base(&mut r)?;
    let raw = match contents {
        ContentArray::F64 => r.read_tarray_f64()?,
        ContentArray::F32 => r.read_tarray_f32()?,
        ContentArray::I32 => r.read_tarray_i32()?,
        ContentArray::I16 => r.read_tarray_i16()?,
    };
    r.seek_end(end, "TH1")?;
    assemble(base, raw)
}

fn read_th1_base(r: &mut RBuffer) -> Result<Th1Base> {
    let (version, end) = r.read_version()?;
    if end.is_none() {
        return Err(RootError::Deserialization("TH1 without byte count".into()));
    }
    let (name, title) = r.read_tnamed()?;
    r.skip_object("TAttLine")?;
    r.skip_object("TAttFill")?;
    r.skip_object("TAttMarker")?;

    let n_cells = r.read_i32()?;
    let axis = read_taxis(r)?;
    r.skip_object("fYaxis")?;
    r.skip_object("fZaxis")?;

    let _bar_offset = r.read_i16()?;
    let _bar_width = r.read_i16()?;
    let entries = r.read_f64()?;
    let stats = HistogramStats {
        tsumw: r.read_f64()?,
        tsumw2: r.read_f64()?,
        tsumwx: r.read_f64()?,
        tsumwx2: r.read_f64()?,
    };
    if version >= 2 {
        let _maximum = r.read_f64()?;
        let _minimum = r.read_f64()?;
    }
    if version >= 3 {
        let _norm_factor = r.read_f64()?;
    }
    let _contour = r.read_tarray_f64()?;
    let sumw2 = r.read_tarray_f64()?;
    let _option = r.read_string()?;
    r.skip_object("fFunctions")?;
    // fBuffer and the error/overflow options are not needed.
    r.seek_end(end, "TH1")?;

    Ok(Th1Base { name, title, n_cells, axis, entries, stats, sumw2 })
}

fn read_taxis(r: &mut RBuffer) -> Result<Axis> {
    let (_version, end) = r.read_version()?;
    if end.is_none() {
        return Err(RootError::Deserialization("TAxis without byte count".into()));
    }
    let _names = r.read_tnamed()?;
    r.skip_object("TAttAxis")?;
    let n_bins = r.read_i32()?;
    let x_min = r.read_f64()?;
    let x_max = r.read_f64()?;
    let edges = r.read_tarray_f64()?;
    r.seek_end(end, "TAxis")?;
    Ok(Axis { n_bins, x_min, x_max, edges })
}

fn assemble(base: Th1Base, raw: Vec<f64>) -> Result<Histogram> {
    let Th1Base { name, title, n_cells, axis, entries, stats, sumw2 } = base;
    if axis.n_bins < 1 {
        return Err(RootError::Deserialization(format!("{name}: fNbins = {}", axis.n_bins)));
    }
    let n_bins = axis.n_bins as usize;
    if n_cells as i64 != n_bins as i64 + 2 || raw.len() != n_bins + 2 {
        return Err(RootError::Deserialization(format!(
            "{name}: {} stored cells, fNcells {n_cells}, fNbins {n_bins}",
            raw.len()
        )));
    }

    let bin_edges = if axis.edges.is_empty() {
        let width = (axis.x_max - axis.x_min) / n_bins as f64;
        (0..=n_bins).map(|i| axis.x_min + i as f64 * width).collect()
    } else if axis.edges.len() == n_bins + 1 {
        axis.edges
    } else {
        return Err(RootError::Deserialization(format!(
            "{name}: {} variable edges for {n_bins} bins",
            axis.edges.len()
        )));
    };

    let sumw2 = match sumw2.len() {
        0 => None,
        n if n == n_bins + 2 => Some(sumw2[1..=n_bins].to_vec()),
        n => {
            log::warn!("{name}: ignoring fSumw2 of length {n} (expected {})", n_bins + 2);
            None
        }
    };

    Ok(Histogram {
        name,
        title,
        n_bins,
        x_min: axis.x_min,
        x_max: axis.x_max,
        bin_edges,
        bin_content: raw[1..=n_bins].to_vec(),
        sumw2,
        underflow: raw[0],
        overflow: raw[n_bins + 1],
        entries,
        stats,
    })
}

/// Encode `h` as a TH1D payload.
pub(crate) fn write_th1d(h: &Histogram) -> Vec<u8> {
    let n_cells = h.n_bins + 2;
    let mut w = WBuffer::new();
    let top = w.begin_object(TH1D_VERSION);
    let th1 = w.begin_object(TH1_VERSION);

    w.write_tnamed(&h.name, &h.title);
    let m = w.begin_object(2);
    w.write_i16(602);
    w.write_i16(1);
    w.write_i16(1);
    w.end_object(m);
    let m = w.begin_object(2);
    w.write_i16(0);
    w.write_i16(1001);
    w.end_object(m);
    let m = w.begin_object(2);
    w.write_i16(1);
    w.write_i16(1);
    w.write_f32(1.0);
    w.end_object(m);

    w.write_i32(n_cells as i32);
    let edges: &[f64] = if h.is_uniform() { &[] } else { &h.bin_edges };
    write_taxis(&mut w, "xaxis", h.n_bins, h.x_min, h.x_max, edges);
    write_taxis(&mut w, "yaxis", 1, 0.0, 1.0, &[]);
    write_taxis(&mut w, "zaxis", 1, 0.0, 1.0, &[]);

    w.write_i16(0);
    w.write_i16(1000);
    w.write_f64(h.entries);
    w.write_f64(h.stats.tsumw);
    w.write_f64(h.stats.tsumw2);
    w.write_f64(h.stats.tsumwx);
    w.write_f64(h.stats.tsumwx2);
    w.write_f64(UNSET);
    w.write_f64(UNSET);
    w.write_f64(0.0);
    w.write_tarray_f64(&[]);
    match &h.sumw2 {
        // Flow bins carry no separate sumw2; their contents stand in.
        Some(s) => w.write_tarray_f64(&with_flows(h.underflow, s, h.overflow)),
        None => w.write_tarray_f64(&[]),
    }
    w.write_string("");

    let list = w.begin_object(TLIST_VERSION);
    w.write_tobject(0x0300_0000);
    w.write_string("");
    w.write_i32(0);
    w.end_object(list);

    w.write_i32(0); // fBufferSize
    w.write_u8(0); // fBuffer: null array marker
    w.write_i32(0); // fBinStatErrOpt: kNormal
    w.write_i32(2); // fStatOverflows: kNeutral
    w.end_object(th1);

    w.write_tarray_f64(&with_flows(h.underflow, &h.bin_content, h.overflow));
    w.end_object(top);
    w.into_inner()
}

fn write_taxis(w: &mut WBuffer, name: &str, n_bins: usize, x_min: f64, x_max: f64, edges: &[f64]) {
    let axis = w.begin_object(TAXIS_VERSION);
    w.write_tnamed(name, "");

    let att = w.begin_object(TATTAXIS_VERSION);
    w.write_i32(510);
    w.write_i16(1);
    w.write_i16(1);
    w.write_i16(42);
    w.write_f32(0.005);
    w.write_f32(0.035);
    w.write_f32(0.03);
    w.write_f32(1.0);
    w.write_f32(0.035);
    w.write_i16(1);
    w.write_i16(42);
    w.end_object(att);

    w.write_i32(n_bins as i32);
    w.write_f64(x_min);
    w.write_f64(x_max);
    w.write_tarray_f64(edges);
    w.write_i32(0); // fFirst
    w.write_i32(0); // fLast
    w.write_u16(0); // fBits2
    w.write_u8(0); // fTimeDisplay
    w.write_string(""); // fTimeFormat
    w.write_u32(0); // fLabels
    w.write_u32(0); // fModLabs
    w.end_object(axis);
}

fn with_flows(under: f64, bins: &[f64], over: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(bins.len() + 2);
    out.push(under);
    out.extend_from_slice(bins);
    out.push(over);
    out
}

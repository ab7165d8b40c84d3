//! Object payload decoding and encoding, dispatched on class name.

mod th1;

use crate::error::{Result, RootError};
use crate::histogram::Histogram;

use th1::ContentArray;

/// Histogram classes this crate can decode.
pub const SUPPORTED_HISTOGRAM_CLASSES: [&str; 4] = ["TH1D", "TH1F", "TH1I", "TH1S"];

/// Whether `class_name` names a decodable histogram class.
pub fn is_supported_histogram(class_name: &str) -> bool {
    SUPPORTED_HISTOGRAM_CLASSES.contains(&class_name)
}

/// Decode a histogram from an uncompressed object payload.
pub fn read_histogram(payload: &[u8], class_name: &str) -> Result<Histogram> {
    let contents = match class_name {
        "TH1D" => ContentArray::F64,
        "TH1F" => ContentArray::F32,
        "TH1I" => ContentArray::I32,
        "TH1S" => ContentArray::I16,
        other => return Err(RootError::UnsupportedClass(other.to_string())),
    };
    th1::read_th1(payload, contents)
}

/// Encode a histogram as a TH1D payload.
pub fn write_histogram(h: &Histogram) -> Vec<u8> {
    th1::write_th1d(h)
}

#[cfg(feature = "pdf")]
pub mod pdf;
#[cfg(feature = "png")]
pub mod png;

/// Font database shared by the raster and PDF backends. Text uses the
/// generic family stack, so whatever sans-serif the host provides is used.
#[cfg(any(feature = "png", feature = "pdf"))]
pub(crate) fn usvg_options() -> usvg::Options<'static> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt
}

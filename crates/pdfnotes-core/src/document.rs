//! Capabilities the transform needs from a PDF library
//!
//! The transform only ever reads page sizes from a source and issues a small
//! set of drawing calls to a sink. Keeping those behind traits lets the
//! geometry be exercised without producing real PDFs.
//!
//! Both sides are plain owned values: a source or sink is released when it
//! goes out of scope, on the error path as much as on success.

use std::io::Write;

use crate::error::Result;
use crate::geometry::{Rect, RuledLine, Size};

/// A document whose pages can be measured and placed
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Visible size of the page at `index` (0-based), as a viewer shows it
    fn page_size(&self, index: usize) -> Result<Size>;
}

/// Stroke settings for ruled lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    /// 0.0 is black, 1.0 is white
    pub gray: f64,
    pub width: f64,
}

/// An output document built one page at a time.
///
/// Calls for a page are bracketed by `begin_page` and `finish_page`.
/// Coordinates are top-left based, in points.
pub trait PageSink {
    type Source: PageSource;

    fn begin_page(&mut self, size: Size) -> Result<()>;

    /// Draw source page `index` scaled to fit `region`, anchored at its top-left corner
    fn place_page(&mut self, source: &Self::Source, index: usize, region: Rect) -> Result<()>;

    fn draw_line(&mut self, line: &RuledLine, style: LineStyle) -> Result<()>;

    fn finish_page(&mut self) -> Result<()>;

    /// Serialize the finished document, consuming the sink
    fn write_to<W: Write>(self, writer: &mut W) -> Result<()>
    where
        Self: Sized;
}

//! Ruled note margins for PDF pages
//!
//! Every page of a source PDF is scaled onto an A4 sheet (landscape for tall
//! pages, portrait otherwise) and the uncovered strip is filled with light
//! horizontal lines for handwritten notes.
//!
//! - `geometry`: per-page layout arithmetic
//! - `document`: the capabilities the transform needs from a PDF library
//! - `backend`: those capabilities implemented with lopdf
//! - `transform`: the page transformer itself

pub mod backend;
pub mod document;
pub mod error;
pub mod geometry;
pub mod options;
pub mod paths;
pub mod transform;

pub use backend::{LopdfSink, LopdfSource};
pub use document::{LineStyle, PageSink, PageSource};
pub use error::{PdfNotesError, Result};
pub use geometry::{Orientation, PageLayout, Rect, RuledLine, Size, A4};
pub use options::{parse_spacing, NotesOptions, DEFAULT_LINE_SPACING_CM};
pub use paths::derive_output_path;
pub use transform::{compose, plan, transform_bytes, transform_file, TransformReport};

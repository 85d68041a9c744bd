//! Page Transformer
//!
//! Places every page of a source PDF onto an A4 sheet and rules the space
//! left over. The algorithm is a single linear pass: lay out a page, draw
//! it, move on. Pages never depend on each other.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::backend::{LopdfSink, LopdfSource};
use crate::document::{LineStyle, PageSink, PageSource};
use crate::error::{PdfNotesError, Result};
use crate::geometry::PageLayout;
use crate::options::NotesOptions;

/// Summary of a finished transform
#[derive(Debug, Clone, Serialize)]
pub struct TransformReport {
    pub page_count: usize,
    pub bytes_written: usize,
    pub layouts: Vec<PageLayout>,
}

impl TransformReport {
    pub fn line_count(&self) -> usize {
        self.layouts.iter().map(|l| l.lines.len()).sum()
    }
}

/// Lay out every page of `source` without drawing anything
pub fn plan<S: PageSource>(source: &S, options: &NotesOptions) -> Result<Vec<PageLayout>> {
    options.validate()?;
    (0..source.page_count())
        .map(|index| PageLayout::compute(source.page_size(index)?, options))
        .collect()
}

/// Draw every page of `source` into `sink`, in source order
pub fn compose<K: PageSink>(
    source: &K::Source,
    sink: &mut K,
    options: &NotesOptions,
) -> Result<Vec<PageLayout>> {
    let layouts = plan(source, options)?;
    let style = LineStyle {
        gray: options.line_gray,
        width: options.line_width_pt,
    };

    for (index, layout) in layouts.iter().enumerate() {
        tracing::debug!(
            page = index + 1,
            orientation = ?layout.orientation,
            scale = layout.scale,
            lines = layout.lines.len(),
            "Composing page"
        );

        sink.begin_page(layout.target)?;
        sink.place_page(source, index, layout.content)?;
        for line in &layout.lines {
            sink.draw_line(line, style)?;
        }
        sink.finish_page()?;
    }

    Ok(layouts)
}

/// Transform PDF bytes in memory, returning the new document
pub fn transform_bytes(bytes: &[u8], options: &NotesOptions) -> Result<Vec<u8>> {
    options.validate()?;
    let source = LopdfSource::from_bytes(bytes)?;
    let (output, _) = render(&source, options)?;
    Ok(output)
}

/// Transform the PDF at `input` and write the result to `output`.
///
/// The destination is replaced only once the whole document has been
/// serialized. On any failure it is left as it was, and no partial file is
/// created next to it.
pub fn transform_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &NotesOptions,
) -> Result<TransformReport> {
    let input = input.as_ref();
    let output = output.as_ref();

    // Reject bad spacing before touching the file system
    options.validate()?;

    let source = LopdfSource::open(input)?;
    let (bytes, layouts) = render(&source, options)?;
    drop(source);

    write_atomically(output, &bytes)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        pages = layouts.len(),
        bytes = bytes.len(),
        "Wrote ruled PDF"
    );

    Ok(TransformReport {
        page_count: layouts.len(),
        bytes_written: bytes.len(),
        layouts,
    })
}

fn render(source: &LopdfSource, options: &NotesOptions) -> Result<(Vec<u8>, Vec<PageLayout>)> {
    let mut sink = LopdfSink::new();
    let layouts = compose(source, &mut sink, options)?;

    let mut buffer = Vec::new();
    sink.write_to(&mut buffer)?;
    Ok((buffer, layouts))
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_error = |source: std::io::Error| PdfNotesError::DestinationWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir().map_err(write_error)?,
    };
    if path.is_dir() {
        return Err(write_error(std::io::Error::new(
            std::io::ErrorKind::Other,
            "destination is a directory",
        )));
    }

    let permissions = match std::fs::metadata(path) {
        // Replacing a file keeps its mode
        Ok(meta) => Some(meta.permissions()),
        Err(_) => new_file_permissions(),
    };

    // The temp file is removed on drop if anything below fails
    let mut file = NamedTempFile::new_in(&dir).map_err(write_error)?;
    file.write_all(bytes).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    if let Some(permissions) = permissions {
        if let Err(e) = file.as_file().set_permissions(permissions) {
            tracing::warn!(output = %path.display(), "Could not set output permissions: {}", e);
        }
    }
    file.persist(path).map_err(|e| write_error(e.error))?;

    Ok(())
}

/// NamedTempFile creates files 0600; fresh outputs get the usual 0644
#[cfg(unix)]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    None
}

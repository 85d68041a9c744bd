//! lopdf implementation of the page capabilities
//!
//! Source pages are carried over as Form XObjects: the page's decoded content
//! becomes the form stream, its resources are deep-copied into the output
//! document, and its visible box plus `/Rotate` turn into the form's BBox and
//! Matrix. The output page then draws the form with a single `cm` + `Do`.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::document::{LineStyle, PageSink, PageSource};
use crate::error::{PdfNotesError, Result};
use crate::geometry::{fit_scale, Rect, RuledLine, Size};

/// Page-tree depth after which inheritance lookups give up
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when a page has no usable MediaBox anywhere in its tree
const FALLBACK_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// A parsed input PDF
pub struct LopdfSource {
    doc: Document,
    pages: Vec<ObjectId>,
}

impl LopdfSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| PdfNotesError::SourceOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::load(&bytes, path)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::load(bytes, Path::new("<memory>"))
    }

    fn load(bytes: &[u8], path: &Path) -> Result<Self> {
        let open_error = |reason: String| PdfNotesError::SourceOpen {
            path: path.to_path_buf(),
            reason,
        };

        let doc = Document::load_mem(bytes).map_err(|e| open_error(e.to_string()))?;

        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(open_error("encrypted documents are not supported".into()));
        }

        // get_pages is keyed by 1-based page number, so values come out in order
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(open_error("document has no pages".into()));
        }

        Ok(Self { doc, pages })
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.pages.get(index).copied().ok_or_else(|| {
            PdfNotesError::Pdf(format!(
                "Page {} does not exist (document has {} pages)",
                index + 1,
                self.pages.len()
            ))
        })
    }

    fn page_geometry(&self, index: usize) -> Result<PageGeometry> {
        let page_id = self.page_id(index)?;

        let media_box = inherited(&self.doc, page_id, b"MediaBox")
            .and_then(|obj| parse_box(&self.doc, obj))
            .unwrap_or(FALLBACK_MEDIA_BOX);
        let visible_box = inherited(&self.doc, page_id, b"CropBox")
            .and_then(|obj| parse_box(&self.doc, obj))
            .and_then(|crop| intersect_boxes(crop, media_box))
            .unwrap_or(media_box);

        let rotation = inherited(&self.doc, page_id, b"Rotate")
            .and_then(|obj| resolve(&self.doc, obj).as_i64().ok())
            .map(normalize_rotation)
            .unwrap_or(0);

        Ok(PageGeometry {
            bbox: visible_box,
            rotation,
        })
    }
}

impl PageSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Result<Size> {
        Ok(self.page_geometry(index)?.visible_size())
    }
}

/// Visible box and quarter-turn rotation of a source page
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageGeometry {
    bbox: [f64; 4],
    /// Clockwise, one of 0, 90, 180, 270
    rotation: i64,
}

impl PageGeometry {
    fn visible_size(&self) -> Size {
        let [llx, lly, urx, ury] = self.bbox;
        let size = Size::new(urx - llx, ury - lly);
        if self.rotation % 180 == 0 {
            size
        } else {
            size.landscape()
        }
    }

    /// Form matrix mapping the box, turned upright, onto `(0, 0)..(w, h)`
    fn form_matrix(&self) -> [f64; 6] {
        let [llx, lly, urx, ury] = self.bbox;
        match self.rotation {
            90 => [0.0, -1.0, 1.0, 0.0, -lly, urx],
            180 => [-1.0, 0.0, 0.0, -1.0, urx, ury],
            270 => [0.0, 1.0, -1.0, 0.0, ury, -llx],
            _ => [1.0, 0.0, 0.0, 1.0, -llx, -lly],
        }
    }
}

struct PendingPage {
    size: Size,
    operations: Vec<Operation>,
    xobjects: Dictionary,
}

/// Output document under construction.
///
/// A sink composes pages from a single source document; objects shared
/// between source pages (fonts, images) are copied once.
pub struct LopdfSink {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    current: Option<PendingPage>,
    copied: HashMap<ObjectId, ObjectId>,
}

impl Default for LopdfSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LopdfSink {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            current: None,
            copied: HashMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn current_page(&mut self) -> Result<&mut PendingPage> {
        self.current
            .as_mut()
            .ok_or_else(|| PdfNotesError::Pdf("No page in progress".into()))
    }

    /// Wrap a source page as a Form XObject in the output document
    fn import_page_as_form(
        &mut self,
        source: &LopdfSource,
        page_id: ObjectId,
        geometry: &PageGeometry,
    ) -> Result<ObjectId> {
        let content = page_content(&source.doc, page_id)?;

        let mut form = Dictionary::new();
        form.set("Type", Object::Name(b"XObject".to_vec()));
        form.set("Subtype", Object::Name(b"Form".to_vec()));
        form.set("FormType", Object::Integer(1));
        form.set("BBox", Object::Array(reals(&geometry.bbox)));
        form.set("Matrix", Object::Array(reals(&geometry.form_matrix())));

        if let Some(resources) = inherited(&source.doc, page_id, b"Resources") {
            let copied = copy_object_deep(&mut self.doc, &source.doc, resources, &mut self.copied)?;
            form.set("Resources", copied);
        }

        Ok(self.doc.add_object(Stream::new(form, content)))
    }
}

impl PageSink for LopdfSink {
    type Source = LopdfSource;

    fn begin_page(&mut self, size: Size) -> Result<()> {
        if self.current.is_some() {
            return Err(PdfNotesError::Pdf(
                "Previous page was not finished".into(),
            ));
        }
        self.current = Some(PendingPage {
            size,
            operations: Vec::new(),
            xobjects: Dictionary::new(),
        });
        Ok(())
    }

    fn place_page(&mut self, source: &LopdfSource, index: usize, region: Rect) -> Result<()> {
        self.current_page()?;
        let page_id = source.page_id(index)?;
        let geometry = source.page_geometry(index)?;
        let visible = geometry.visible_size();
        let scale = fit_scale(visible, Size::new(region.width, region.height));

        let form_id = self.import_page_as_form(source, page_id, &geometry)?;
        let name = format!("P{}", self.page_ids.len() + 1);

        let page = self.current_page()?;
        // Top-left anchoring in a bottom-left coordinate system
        let x = region.x;
        let y = page.size.height - region.y - visible.height * scale;

        page.xobjects
            .set(name.as_bytes().to_vec(), Object::Reference(form_id));
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("cm", reals(&[scale, 0.0, 0.0, scale, x, y])),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn draw_line(&mut self, line: &RuledLine, style: LineStyle) -> Result<()> {
        let page = self.current_page()?;
        let y = page.size.height - line.y;
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("G", vec![real(style.gray)]),
            Operation::new("w", vec![real(style.width)]),
            Operation::new("m", vec![real(line.x_start), real(y)]),
            Operation::new("l", vec![real(line.x_end), real(y)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn finish_page(&mut self) -> Result<()> {
        let page = self
            .current
            .take()
            .ok_or_else(|| PdfNotesError::Pdf("No page in progress".into()))?;

        let content = Content {
            operations: page.operations,
        };
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let resources = Dictionary::from_iter(vec![("XObject", Object::Dictionary(page.xobjects))]);
        let page_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(reals(&[0.0, 0.0, page.size.width, page.size.height])),
            ),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Dictionary(resources)),
        ]);
        let page_id = self.doc.add_object(page_dict);
        self.page_ids.push(page_id);
        Ok(())
    }

    fn write_to<W: Write>(mut self, writer: &mut W) -> Result<()> {
        if self.current.is_some() {
            return Err(PdfNotesError::Pdf("Last page was not finished".into()));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(self.page_ids.len() as i64)),
            (
                "Kids",
                Object::Array(
                    self.page_ids
                        .iter()
                        .map(|id| Object::Reference(*id))
                        .collect(),
                ),
            ),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]);
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc.compress();
        self.doc
            .save_to(writer)
            .map_err(|e| PdfNotesError::Pdf(format!("Save failed: {}", e)))?;
        Ok(())
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn reals(values: &[f64]) -> Vec<Object> {
    values.iter().copied().map(real).collect()
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Follow a single indirect reference, leaving direct objects untouched
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Look up a page attribute, walking up `/Parent` links for inheritable keys
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value));
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Parse a rectangle array into normalized `[llx, lly, urx, ury]`
fn parse_box(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let items = obj.as_array().ok()?;
    if items.len() != 4 {
        return None;
    }
    let mut values = [0.0; 4];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = number(resolve(doc, item))?;
    }
    let [x1, y1, x2, y2] = values;
    let normalized = [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)];
    if normalized[2] - normalized[0] <= 0.0 || normalized[3] - normalized[1] <= 0.0 {
        return None;
    }
    Some(normalized)
}

fn intersect_boxes(a: [f64; 4], b: [f64; 4]) -> Option<[f64; 4]> {
    let out = [a[0].max(b[0]), a[1].max(b[1]), a[2].min(b[2]), a[3].min(b[3])];
    (out[2] > out[0] && out[3] > out[1]).then_some(out)
}

/// Map any `/Rotate` value onto 0, 90, 180 or 270; non-multiples of 90 count as 0
fn normalize_rotation(value: i64) -> i64 {
    let turned = value.rem_euclid(360);
    if turned % 90 == 0 {
        turned
    } else {
        0
    }
}

/// Decoded content of a page, with multiple streams joined by newlines
fn page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    for content_id in doc.get_page_contents(page_id) {
        let stream = doc.get_object(content_id)?.as_stream()?;
        let data = match stream.decompressed_content() {
            Ok(data) => data,
            // Unfiltered streams fail to "decompress"; take them as they are
            Err(_) if stream.dict.get(b"Filter").is_err() => stream.content.clone(),
            Err(e) => {
                return Err(PdfNotesError::Pdf(format!(
                    "Cannot decode content stream {} {} R: {}",
                    content_id.0, content_id.1, e
                )))
            }
        };
        result.extend_from_slice(&data);
        result.push(b'\n');
    }
    Ok(result)
}

/// Deep copy an object from `source` into `output`, following references.
///
/// Ids are reserved before recursing so reference cycles terminate, and the
/// cache makes objects shared between pages land in the output once.
/// `/Parent` links are dropped so a copy never drags in the source page tree.
fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            let new_id = output.new_object_id();
            cache.insert(*id, new_id);

            let copied = match source.get_object(*id) {
                Ok(referenced) => copy_object_deep(output, source, referenced, cache)?,
                // Dangling references read as null
                Err(_) => Object::Null,
            };
            output.objects.insert(new_id, copied);
            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(copy_dictionary(
            output, source, dict, cache,
        )?)),
        Object::Array(items) => {
            let mut copied = Vec::with_capacity(items.len());
            for item in items {
                copied.push(copy_object_deep(output, source, item, cache)?);
            }
            Ok(Object::Array(copied))
        }
        Object::Stream(stream) => {
            let dict = copy_dictionary(output, source, &stream.dict, cache)?;
            let mut copied = Stream::new(dict, stream.content.clone());
            copied.allows_compression = stream.allows_compression;
            Ok(Object::Stream(copied))
        }
        other => Ok(other.clone()),
    }
}

fn copy_dictionary(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut copied = Dictionary::new();
    for (key, value) in dict.iter() {
        if key.as_slice() == b"Parent" {
            continue;
        }
        copied.set(key.clone(), copy_object_deep(output, source, value, cache)?);
    }
    Ok(copied)
}

//! Synthetic PDFs and output inspection helpers

#![allow(dead_code)]

use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};

/// One source page: size in points, optional `/Rotate`
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub width: i64,
    pub height: i64,
    pub rotate: Option<i64>,
}

impl PageSpec {
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            width,
            height,
            rotate: None,
        }
    }

    pub fn rotated(mut self, degrees: i64) -> Self {
        self.rotate = Some(degrees);
        self
    }
}

/// Build a PDF whose pages print "Page N" in a Helvetica font shared by all pages
pub fn create_test_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut page_ids = Vec::new();

    for (i, spec) in pages.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(50), Object::Integer(50)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", i + 1).into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(spec.width),
                    Object::Integer(spec.height),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
        ]);
        if let Some(rotate) = spec.rotate {
            page.set("Rotate", Object::Integer(rotate));
        }
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Like `create_test_pdf`, but the MediaBox lives only on the Pages node
pub fn create_inherited_box_pdf(width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        b"0 0 m 10 10 l S".to_vec(),
    ));
    let page_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
    ]));

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(1)),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ]),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn stream_data(stream: &Stream) -> Vec<u8> {
    match stream.decompressed_content() {
        Ok(data) => data,
        Err(_) => stream.content.clone(),
    }
}

pub fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        other => panic!("not a number: {:?}", other),
    }
}

/// What an output page looks like from the outside
#[derive(Debug)]
pub struct OutputPage {
    pub width: f64,
    pub height: f64,
    pub operations: Vec<Operation>,
    /// Decoded content of the placed source page
    pub form_content: Vec<u8>,
}

impl OutputPage {
    pub fn operator_count(&self, operator: &str) -> usize {
        self.operations
            .iter()
            .filter(|op| op.operator == operator)
            .count()
    }

    /// The `cm` matrix the source page is drawn with
    pub fn placement(&self) -> Vec<f64> {
        self.operations
            .iter()
            .find(|op| op.operator == "cm")
            .map(|op| op.operands.iter().map(number).collect())
            .expect("page has no placement matrix")
    }

    /// Heights (PDF user space) of the stroked ruled lines
    pub fn line_heights(&self) -> Vec<f64> {
        self.operations
            .iter()
            .filter(|op| op.operator == "m")
            .map(|op| number(&op.operands[1]))
            .collect()
    }

    /// Horizontal extents of the stroked ruled lines
    pub fn line_extents(&self) -> Vec<(f64, f64)> {
        let starts = self.operations.iter().filter(|op| op.operator == "m");
        let ends = self.operations.iter().filter(|op| op.operator == "l");
        starts
            .zip(ends)
            .map(|(m, l)| (number(&m.operands[0]), number(&l.operands[0])))
            .collect()
    }
}

pub fn inspect_output(bytes: &[u8]) -> Vec<OutputPage> {
    let doc = Document::load_mem(bytes).expect("output is not a valid PDF");
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let page = doc.get_dictionary(page_id).unwrap();
            let media_box: Vec<f64> = page
                .get(b"MediaBox")
                .unwrap()
                .as_array()
                .unwrap()
                .iter()
                .map(number)
                .collect();

            let content = doc.get_page_content(page_id).unwrap();
            let operations = Content::decode(&content).unwrap().operations;

            let xobjects = page
                .get(b"Resources")
                .unwrap()
                .as_dict()
                .unwrap()
                .get(b"XObject")
                .unwrap()
                .as_dict()
                .unwrap();
            let (_, form_ref) = xobjects.iter().next().expect("no placed page");
            let form = doc
                .get_object(form_ref.as_reference().unwrap())
                .unwrap()
                .as_stream()
                .unwrap();

            OutputPage {
                width: media_box[2] - media_box[0],
                height: media_box[3] - media_box[1],
                operations,
                form_content: stream_data(form),
            }
        })
        .collect()
}

/// Number of objects in the document that are fonts
pub fn font_object_count(bytes: &[u8]) -> usize {
    let doc = Document::load_mem(bytes).unwrap();
    doc.objects
        .values()
        .filter(|obj| {
            obj.as_dict()
                .ok()
                .and_then(|d| d.get(b"Type").ok())
                .and_then(|t| t.as_name().ok())
                == Some(b"Font".as_slice())
        })
        .count()
}

pub fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|w| w == needle.as_bytes())
}

//! `lopdf` implementation of [`DocumentBuilder`].
//!
//! # Page tree
//!
//! The output has a single flat `Pages` node whose id is reserved when the
//! document is created. Appended source pages are re-parented to it; since
//! their original page tree is dropped, inheritable attributes (`Resources`,
//! `MediaBox`, `CropBox`, `Rotate`) are copied onto each page first.
//!
//! # Coordinate system
//!
//! PDF uses a bottom-left origin. Images are placed with a `cm` transform that
//! scales the unit square to the target rectangle; text starts at the first
//! baseline and moves down by the leading for each line.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use super::image::{ColorSpace, EmbeddedImage, ImageEncoding};
use super::text::{encode_win_ansi, wrap_text};
use super::{DocumentBuilder, Rect, TextStyle};
use crate::error::{Error, Result};

const PDF_VERSION: &str = "1.7";

/// Resource name of the text font on every text page
const FONT_RESOURCE: &str = "F1";

/// Page attributes a page may inherit from its ancestors
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when a source page has no media box at all
const LETTER_MEDIA_BOX: [i64; 4] = [0, 0, 612, 792];

fn lopdf_error(e: lopdf::Error) -> Error {
    Error::Lopdf(e.to_string())
}

fn name(value: &[u8]) -> Object {
    Object::Name(value.to_vec())
}

/// Page handle returned by [`LopdfBuilder::add_page`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LopdfPage(ObjectId);

/// Output document backed by an in-memory `lopdf::Document`.
pub struct LopdfBuilder {
    document: Document,
    /// Reserved id of the root `Pages` node
    pages_id: ObjectId,
    /// Page ids in output order
    kids: Vec<ObjectId>,
    /// Shared Helvetica font, created on first use
    font_id: Option<ObjectId>,
    /// Counter for image resource names
    image_count: u32,
}

impl LopdfBuilder {
    fn font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.document.add_object(Dictionary::from_iter([
            ("Type", name(b"Font")),
            ("Subtype", name(b"Type1")),
            ("BaseFont", name(b"Helvetica")),
            ("Encoding", name(b"WinAnsiEncoding")),
        ]));
        self.font_id = Some(id);
        id
    }

    /// Register `id` under `/Resources/<category>/<resource>` of `page`.
    fn register_resource(
        &mut self,
        page: ObjectId,
        category: &[u8],
        resource: &str,
        id: ObjectId,
    ) -> Result<()> {
        let page = self
            .document
            .get_object_mut(page)
            .and_then(Object::as_dict_mut)
            .map_err(lopdf_error)?;

        if !page.has(b"Resources") {
            page.set("Resources", Dictionary::new());
        }
        let resources = page
            .get_mut(b"Resources")
            .and_then(Object::as_dict_mut)
            .map_err(lopdf_error)?;

        if !resources.has(category) {
            resources.set(category.to_vec(), Dictionary::new());
        }
        let entries = resources
            .get_mut(category)
            .and_then(Object::as_dict_mut)
            .map_err(lopdf_error)?;

        entries.set(resource, Object::Reference(id));
        Ok(())
    }

    /// Append a content stream to a page.
    fn append_content(&mut self, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
        let content_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), content));

        let page = self
            .document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(lopdf_error)?;

        let existing_contents = page.get(b"Contents").ok().cloned();
        match existing_contents {
            Some(Object::Reference(existing_id)) => {
                page.set(
                    "Contents",
                    Object::Array(vec![
                        Object::Reference(existing_id),
                        Object::Reference(content_id),
                    ]),
                );
            }
            Some(Object::Array(mut arr)) => {
                arr.push(Object::Reference(content_id));
                page.set("Contents", Object::Array(arr));
            }
            _ => {
                page.set("Contents", Object::Reference(content_id));
            }
        }

        Ok(())
    }

    /// Add the image (and its soft mask) as XObjects, returning the image id.
    fn add_image_xobject(&mut self, image: EmbeddedImage) -> ObjectId {
        let width = i64::from(image.width());
        let height = i64::from(image.height());
        let color_space = image.color_space();
        let encoding = image.encoding();
        let inverted = image.inverted_samples();
        let (data, soft_mask) = image.into_parts();

        let image_dict = |space: ColorSpace| {
            Dictionary::from_iter([
                ("Type", name(b"XObject")),
                ("Subtype", name(b"Image")),
                ("Width", Object::Integer(width)),
                ("Height", Object::Integer(height)),
                ("ColorSpace", name(space.pdf_name())),
                ("BitsPerComponent", Object::Integer(8)),
            ])
        };

        let mask_id = soft_mask.map(|mask| {
            self.document
                .add_object(Stream::new(image_dict(ColorSpace::Gray), mask))
        });

        let mut dict = image_dict(color_space);
        if let Some(mask_id) = mask_id {
            dict.set("SMask", Object::Reference(mask_id));
        }

        let stream = match encoding {
            ImageEncoding::Dct => {
                dict.set("Filter", name(b"DCTDecode"));
                if inverted {
                    let decode = (0..color_space.components())
                        .flat_map(|_| [Object::Integer(1), Object::Integer(0)])
                        .collect();
                    dict.set("Decode", Object::Array(decode));
                }
                Stream::new(dict, data).with_compression(false)
            }
            ImageEncoding::Raw => Stream::new(dict, data),
        };

        self.document.add_object(stream)
    }
}

/// Clone a page dictionary with inheritable attributes pulled down from its
/// ancestors.
fn flattened_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc.get_dictionary(page_id).map_err(lopdf_error)?.clone();

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(parent_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITABLE_ATTRIBUTES {
            if !page.has(key)
                && let Ok(value) = node.get(key)
            {
                page.set(key.to_vec(), value.clone());
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    if !page.has(b"MediaBox") {
        page.set(
            "MediaBox",
            Object::Array(LETTER_MEDIA_BOX.iter().map(|&v| Object::Integer(v)).collect()),
        );
    }

    Ok(page)
}

impl DocumentBuilder for LopdfBuilder {
    type Page = LopdfPage;

    fn new_document() -> Self {
        let mut document = Document::with_version(PDF_VERSION);
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
            font_id: None,
            image_count: 0,
        }
    }

    fn append_all_pages(&mut self, source: &[u8]) -> Result<usize> {
        let mut source =
            Document::load_mem(source).map_err(|e| Error::PdfLoad(e.to_string()))?;

        if source.is_encrypted() {
            return Err(Error::PdfLoad("document is encrypted".to_string()));
        }

        source.renumber_objects_with(self.document.max_id + 1);

        // Prepare every page before touching the output so failures leave it unchanged
        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        let pages = page_ids
            .iter()
            .map(|&id| flattened_page(&source, id).map(|dict| (id, dict)))
            .collect::<Result<Vec<_>>>()?;

        let source_max_id = source.max_id;
        for (object_id, object) in source.objects {
            let structural = matches!(
                object.type_name().unwrap_or(b""),
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline"
            );
            if !structural {
                self.document.objects.insert(object_id, object);
            }
        }

        let appended = pages.len();
        for (page_id, mut page) in pages {
            page.set("Parent", Object::Reference(self.pages_id));
            self.document.objects.insert(page_id, Object::Dictionary(page));
            self.kids.push(page_id);
        }

        self.document.max_id = self.document.max_id.max(source_max_id);
        debug!("Appended {} source page(s), output now has {}", appended, self.kids.len());
        Ok(appended)
    }

    fn add_page(&mut self, width: f32, height: f32) -> LopdfPage {
        let page_id = self.document.add_object(Dictionary::from_iter([
            ("Type", name(b"Page")),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width),
                    Object::Real(height),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
        ]));
        self.kids.push(page_id);
        LopdfPage(page_id)
    }

    fn draw_image(&mut self, page: LopdfPage, image: EmbeddedImage, rect: Rect) -> Result<()> {
        self.image_count += 1;
        let resource = format!("Im{}", self.image_count);

        let image_id = self.add_image_xobject(image);
        self.register_resource(page.0, b"XObject", &resource, image_id)?;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(rect.width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(rect.height),
                        Object::Real(rect.x),
                        Object::Real(rect.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(resource.into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };

        let bytes = content.encode().map_err(lopdf_error)?;
        self.append_content(page.0, bytes)
    }

    fn draw_text(&mut self, page: LopdfPage, text: &str, style: &TextStyle) -> Result<()> {
        // Encode first: an unencodable character must not leave a half-drawn page
        let lines = wrap_text(text, style.font_size, style.max_width)
            .iter()
            .map(|line| encode_win_ansi(line))
            .collect::<Result<Vec<_>>>()?;

        let font_id = self.font();
        self.register_resource(page.0, b"Font", FONT_RESOURCE, font_id)?;

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
            Operation::new(
                "Tf",
                vec![name(FONT_RESOURCE.as_bytes()), Object::Real(style.font_size)],
            ),
            Operation::new("TL", vec![Object::Real(style.line_height)]),
            Operation::new("Td", vec![Object::Real(style.x), Object::Real(style.y)]),
        ];
        for (i, line) in lines.into_iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(line, StringFormat::Literal)],
            ));
        }
        operations.push(Operation::new("ET", vec![]));

        let bytes = Content { operations }.encode().map_err(lopdf_error)?;
        self.append_content(page.0, bytes)
    }

    fn discard_page(&mut self, page: LopdfPage) {
        self.kids.retain(|&id| id != page.0);
        // Content and resource objects become unreachable and are pruned on save
        self.document.objects.remove(&page.0);
    }

    fn page_count(&self) -> usize {
        self.kids.len()
    }

    fn serialize(mut self) -> Result<Vec<u8>> {
        let count = i64::try_from(self.kids.len())
            .map_err(|e| Error::PdfSave(format!("too many pages: {e}")))?;

        let pages = Dictionary::from_iter([
            ("Type", name(b"Pages")),
            (
                "Kids",
                Object::Array(self.kids.iter().map(|&id| Object::Reference(id)).collect()),
            ),
            ("Count", Object::Integer(count)),
        ]);
        self.document
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.document.add_object(Dictionary::from_iter([
            ("Type", name(b"Catalog")),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.document.trailer.set("Root", Object::Reference(catalog_id));

        self.document.prune_objects();
        self.document.renumber_objects();
        self.document.compress();

        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|e| Error::PdfSave(format!("Failed to save PDF: {e}")))?;

        Ok(output)
    }
}

// =============================================================================
// Tests
// =============================================================================

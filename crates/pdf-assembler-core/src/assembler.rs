//! Sequential assembly of a file collection into one PDF.
//!
//! Files are processed strictly in order. A file that fails is logged and
//! skipped without contributing any page; the run only fails as a whole when
//! no file contributed anything.

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::config::{TextLayoutConfig, TextOverflow};
use crate::document::text::wrap_text;
use crate::document::{DocumentBuilder, EmbeddedImage, LopdfBuilder, Rect, TextStyle};
use crate::error::{Error, Result};
use crate::input::{Category, ImageKind, InputFile};

/// Progress callback: `(files_done, files_total)`
pub type Progress<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// Whether an assembler is currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Idle,
    Processing,
}

/// What one input file contributed to the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Position in the input
    pub index: usize,
    pub name: String,
    /// Pages added (0 when skipped)
    pub pages: usize,
    /// Reason the file was skipped
    pub error: Option<String>,
}

impl FileOutcome {
    pub const fn is_skipped(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of a successful assembly run
pub struct AssembledDocument {
    /// Serialized PDF
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// One entry per input file, in input order
    pub outcomes: Vec<FileOutcome>,
}

impl AssembledDocument {
    pub fn skipped(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped())
    }
}

impl std::fmt::Debug for AssembledDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssembledDocument")
            .field("bytes_len", &self.bytes.len())
            .field("page_count", &self.page_count)
            .field("outcomes", &self.outcomes)
            .finish()
    }
}

/// Marks the assembler busy for the lifetime of one run.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl<'a> ProcessingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::AlreadyProcessing)?;
        Ok(Self(flag))
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Builds one output document from an ordered list of input files.
pub struct Assembler {
    layout: TextLayoutConfig,
    busy: AtomicBool,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(TextLayoutConfig::default())
    }
}

impl Assembler {
    pub const fn new(layout: TextLayoutConfig) -> Self {
        Self {
            layout,
            busy: AtomicBool::new(false),
        }
    }

    pub const fn layout(&self) -> &TextLayoutConfig {
        &self.layout
    }

    pub fn state(&self) -> ProcessingState {
        if self.busy.load(Ordering::Acquire) {
            ProcessingState::Processing
        } else {
            ProcessingState::Idle
        }
    }

    /// Assemble `files` into a PDF using the lopdf backend.
    pub fn assemble(&self, files: &[InputFile]) -> Result<AssembledDocument> {
        self.assemble_with::<LopdfBuilder>(files, None)
    }

    /// Like [`Assembler::assemble`], reporting progress after each file.
    pub fn assemble_with_progress(
        &self,
        files: &[InputFile],
        progress: Progress<'_>,
    ) -> Result<AssembledDocument> {
        self.assemble_with::<LopdfBuilder>(files, Some(progress))
    }

    /// Assemble with an arbitrary document backend.
    pub fn assemble_with<B: DocumentBuilder>(
        &self,
        files: &[InputFile],
        progress: Option<Progress<'_>>,
    ) -> Result<AssembledDocument> {
        if files.is_empty() {
            return Err(Error::NoFiles);
        }
        let _guard = ProcessingGuard::acquire(&self.busy)?;

        info!("Assembling {} file(s)", files.len());
        let mut builder = B::new_document();
        let mut outcomes = Vec::with_capacity(files.len());

        for (index, file) in files.iter().enumerate() {
            let before = builder.page_count();
            let outcome = match self.add_file(&mut builder, file) {
                Ok(pages) => {
                    debug!("{}: added {} page(s)", file.name(), pages);
                    FileOutcome {
                        index,
                        name: file.name().to_string(),
                        pages,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("Skipping {}: {}", file.name(), e);
                    debug_assert_eq!(builder.page_count(), before);
                    FileOutcome {
                        index,
                        name: file.name().to_string(),
                        pages: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);

            if let Some(progress) = progress {
                progress(index + 1, files.len());
            }
        }

        let page_count = builder.page_count();
        if page_count == 0 {
            warn!("None of the {} file(s) produced a page", files.len());
            return Err(Error::NoValidContent);
        }

        let bytes = builder.serialize()?;
        info!(
            "Assembled {} page(s) from {} file(s) ({} skipped)",
            page_count,
            files.len(),
            outcomes.iter().filter(|o| o.is_skipped()).count()
        );

        Ok(AssembledDocument {
            bytes,
            page_count,
            outcomes,
        })
    }

    fn add_file<B: DocumentBuilder>(&self, builder: &mut B, file: &InputFile) -> Result<usize> {
        match file.category() {
            Some(Category::Pdf) => builder.append_all_pages(file.bytes()),
            Some(Category::Image(kind)) => Self::add_image(builder, kind, file.bytes()),
            Some(Category::Text) => self.add_text(builder, file.bytes()),
            None => Err(Error::UnsupportedBatch {
                rejected: vec![format!("{} ({})", file.name(), file.media_type())],
            }),
        }
    }

    /// One page exactly the image's pixel size, image drawn edge to edge.
    fn add_image<B: DocumentBuilder>(
        builder: &mut B,
        kind: ImageKind,
        bytes: &[u8],
    ) -> Result<usize> {
        let image = EmbeddedImage::decode(kind, bytes)?;
        #[allow(clippy::cast_precision_loss)]
        let (width, height) = (image.width() as f32, image.height() as f32);

        let page = builder.add_page(width, height);
        if let Err(e) = builder.draw_image(page, image, Rect::new(0.0, 0.0, width, height)) {
            builder.discard_page(page);
            return Err(e);
        }
        Ok(1)
    }

    fn add_text<B: DocumentBuilder>(&self, builder: &mut B, bytes: &[u8]) -> Result<usize> {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::TextDecode(e.to_string()))?;
        let layout = &self.layout;
        let style = TextStyle::from(layout);

        let chunks: Vec<Cow<'_, str>> = match layout.overflow {
            TextOverflow::SinglePage => vec![Cow::Borrowed(text)],
            TextOverflow::Paginate => wrap_text(text, layout.font_size, layout.max_width)
                .chunks(layout.lines_per_page())
                .map(|lines| Cow::Owned(lines.join("\n")))
                .collect(),
        };

        let mut pages = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let page = builder.add_page(layout.page_width, layout.page_height);
            pages.push(page);
            if let Err(e) = builder.draw_text(page, chunk, &style) {
                for page in pages {
                    builder.discard_page(page);
                }
                return Err(e);
            }
        }
        Ok(pages.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Records the calls made by the assembler instead of building a PDF.
    #[derive(Default)]
    struct RecordingBuilder {
        pages: Vec<String>,
        next_id: usize,
        live: Vec<usize>,
    }

    impl DocumentBuilder for RecordingBuilder {
        type Page = usize;

        fn new_document() -> Self {
            Self::default()
        }

        fn append_all_pages(&mut self, source: &[u8]) -> Result<usize> {
            // Fake "PDF": one page per line
            let text = std::str::from_utf8(source).map_err(|e| Error::PdfLoad(e.to_string()))?;
            if !text.starts_with("PDF") {
                return Err(Error::PdfLoad("missing header".to_string()));
            }
            let pages: Vec<String> = text.lines().skip(1).map(str::to_string).collect();
            for page in &pages {
                self.live.push(self.next_id);
                self.next_id += 1;
                self.pages.push(page.clone());
            }
            Ok(pages.len())
        }

        fn add_page(&mut self, width: f32, height: f32) -> usize {
            let id = self.next_id;
            self.next_id += 1;
            self.live.push(id);
            self.pages.push(format!("page {width}x{height}"));
            id
        }

        fn draw_image(&mut self, _page: usize, _image: EmbeddedImage, _rect: Rect) -> Result<()> {
            Ok(())
        }

        fn draw_text(&mut self, page: usize, text: &str, _style: &TextStyle) -> Result<()> {
            let pos = self.live.iter().position(|&id| id == page).unwrap();
            self.pages[pos] = format!("text:{}", text.lines().next().unwrap_or(""));
            Ok(())
        }

        fn discard_page(&mut self, page: usize) {
            if let Some(pos) = self.live.iter().position(|&id| id == page) {
                self.live.remove(pos);
                self.pages.remove(pos);
            }
        }

        fn page_count(&self) -> usize {
            self.live.len()
        }

        fn serialize(self) -> Result<Vec<u8>> {
            Ok(self.pages.join("\n").into_bytes())
        }
    }

    fn pdf(name: &str, pages: &[&str]) -> InputFile {
        let body = std::iter::once("PDF").chain(pages.iter().copied()).collect::<Vec<_>>();
        InputFile::new(name, "application/pdf", body.join("\n").into_bytes())
    }

    fn text(name: &str, content: &str) -> InputFile {
        InputFile::new(name, "text/plain", content.as_bytes().to_vec())
    }

    fn run(assembler: &Assembler, files: &[InputFile]) -> Result<(Vec<String>, AssembledDocument)> {
        let doc = assembler.assemble_with::<RecordingBuilder>(files, None)?;
        let pages = String::from_utf8(doc.bytes.clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        Ok((pages, doc))
    }

    #[test]
    fn test_pages_follow_input_order() {
        let assembler = Assembler::default();
        let files = [pdf("a.pdf", &["a1", "a2"]), text("b.txt", "hello"), pdf("c.pdf", &["c1"])];
        let (pages, doc) = run(&assembler, &files).unwrap();

        assert_eq!(pages, ["a1", "a2", "text:hello", "c1"]);
        assert_eq!(doc.page_count, 4);
        assert_eq!(
            doc.outcomes.iter().map(|o| o.pages).collect::<Vec<_>>(),
            [2, 1, 1]
        );
    }

    #[test]
    fn test_failed_file_skipped() {
        let assembler = Assembler::default();
        let files = [
            pdf("good.pdf", &["g1"]),
            InputFile::new("bad.pdf", "application/pdf", b"garbage".to_vec()),
            InputFile::new("bad.png", "image/png", b"garbage".to_vec()),
            InputFile::new("anim.gif", "image/gif", b"GIF89a".to_vec()),
            InputFile::new("bad.txt", "text/plain", vec![0xFF, 0xFE, 0x00]),
        ];
        let (pages, doc) = run(&assembler, &files).unwrap();

        assert_eq!(pages, ["g1"]);
        assert_eq!(doc.skipped().count(), 4);
        assert!(doc.outcomes[0].error.is_none());
        assert!(doc.outcomes[1].error.as_deref().unwrap().contains("PDF"));
    }

    #[test]
    fn test_no_valid_content() {
        let assembler = Assembler::default();
        let files = [InputFile::new("bad.pdf", "application/pdf", b"nope".to_vec())];
        let result = run(&assembler, &files);
        assert!(matches!(result, Err(Error::NoValidContent)));
        assert_eq!(assembler.state(), ProcessingState::Idle);
    }

    #[test]
    fn test_empty_input() {
        let assembler = Assembler::default();
        assert!(matches!(run(&assembler, &[]), Err(Error::NoFiles)));
        assert_eq!(assembler.state(), ProcessingState::Idle);
    }

    #[test]
    fn test_reentry_rejected() {
        let assembler = Assembler::default();
        let reentered = AtomicBool::new(false);
        let files = [text("a.txt", "a"), text("b.txt", "b")];

        let progress = |done: usize, _total: usize| {
            if done == 1 {
                assert_eq!(assembler.state(), ProcessingState::Processing);
                let inner = assembler.assemble_with::<RecordingBuilder>(&files, None);
                assert!(matches!(inner, Err(Error::AlreadyProcessing)));
                reentered.store(true, Ordering::SeqCst);
            }
        };

        assembler
            .assemble_with::<RecordingBuilder>(&files, Some(&progress))
            .unwrap();
        assert!(reentered.load(Ordering::SeqCst));
        assert_eq!(assembler.state(), ProcessingState::Idle);
    }

    #[test]
    fn test_progress_reports_every_file() {
        let assembler = Assembler::default();
        let calls = AtomicUsize::new(0);
        let files = [text("a.txt", "a"), InputFile::new("x.pdf", "application/pdf", Vec::new())];

        let progress = |done: usize, total: usize| {
            assert_eq!(total, 2);
            calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(calls.load(Ordering::SeqCst), done);
        };
        assembler
            .assemble_with::<RecordingBuilder>(&files, Some(&progress))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_single_page_text_not_paginated() {
        let assembler = Assembler::default();
        let long = (0..200).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let (pages, _) = run(&assembler, &[text("long.txt", &long)]).unwrap();
        assert_eq!(pages, ["text:line 0"]);
    }

    #[test]
    fn test_paginated_text() {
        let layout = TextLayoutConfig {
            overflow: TextOverflow::Paginate,
            ..TextLayoutConfig::default()
        };
        let per_page = layout.lines_per_page();
        let assembler = Assembler::new(layout);

        let long = (0..per_page * 2 + 1)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let (pages, doc) = run(&assembler, &[text("long.txt", &long)]).unwrap();

        assert_eq!(doc.page_count, 3);
        assert_eq!(pages[0], "text:line 0");
        assert_eq!(pages[1], format!("text:line {per_page}"));
        assert_eq!(pages[2], format!("text:line {}", per_page * 2));
    }

    #[test]
    fn test_sequential_batches_match_combined_run() {
        let assembler = Assembler::default();
        let a = pdf("a.pdf", &["a1"]);
        let b = text("b.txt", "bee");

        let (combined, _) = run(&assembler, &[a.clone(), b.clone()]).unwrap();
        let (first, _) = run(&assembler, std::slice::from_ref(&a)).unwrap();
        let (second, _) = run(&assembler, std::slice::from_ref(&b)).unwrap();

        assert_eq!(combined, [first, second].concat());
    }
}

//! Text layer inspection without decoding text
//!
//! Scans page content streams for text-showing operators (Tj/TJ/'/") and
//! image placements so the extractor can tell when a whole document looks
//! scanned.

use flate2::read::ZlibDecoder;
use lopdf::{Document, Object, ObjectId, Stream};
use std::io::Read;

/// Summary of the text layer across a loaded document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextLayerReport {
    /// Number of pages in the document
    pub page_count: u32,
    /// Pages (1-indexed) with at least one text operator
    pub pages_with_text: Vec<u32>,
    /// Number of pages placing at least one XObject image
    pub pages_with_images: u32,
}

impl TextLayerReport {
    /// True when no page has a text layer but at least one page has images
    pub fn looks_scanned(&self) -> bool {
        self.pages_with_text.is_empty() && self.pages_with_images > 0
    }
}

/// Page content analysis result
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PageAnalysis {
    pub text_operator_count: u32,
    pub has_images: bool,
}

/// Inspect every page of a loaded document
pub fn inspect_text_layer(doc: &Document) -> TextLayerReport {
    let pages = doc.get_pages();
    let mut report = TextLayerReport {
        page_count: pages.len() as u32,
        ..Default::default()
    };

    for (&page_num, &page_id) in pages.iter() {
        let analysis = analyze_page_content(doc, page_id);
        if analysis.text_operator_count > 0 {
            report.pages_with_text.push(page_num);
        }
        if analysis.has_images {
            report.pages_with_images += 1;
        }
    }

    report
}

/// Analyze a page's content streams for text operators and images
pub(crate) fn analyze_page_content(doc: &Document, page_id: ObjectId) -> PageAnalysis {
    let mut analysis = PageAnalysis::default();

    for content_id in doc.get_page_contents(page_id) {
        if let Ok(Object::Stream(stream)) = doc.get_object(content_id) {
            let content = stream_bytes(stream);
            let (ops, imgs) = scan_content_for_text_operators(&content);
            analysis.text_operator_count += ops;
            analysis.has_images = analysis.has_images || imgs;
        }
    }

    analysis
}

/// Decoded bytes of a content stream
///
/// lopdf handles the common filters; a bare zlib stream with a broken
/// /Filter entry is retried with flate2 before falling back to raw bytes.
fn stream_bytes(stream: &Stream) -> Vec<u8> {
    if let Ok(data) = stream.decompressed_content() {
        return data;
    }

    let mut decoder = ZlibDecoder::new(stream.content.as_slice());
    let mut inflated = Vec::new();
    if decoder.read_to_end(&mut inflated).is_ok() && !inflated.is_empty() {
        return inflated;
    }

    stream.content.clone()
}

/// Fast scan of content stream bytes for text operators
///
/// Counts "Tj", "TJ", "'" and "\"" operators and flags "Do" (XObject
/// placement). Operators must be followed by whitespace or end of stream.
pub(crate) fn scan_content_for_text_operators(content: &[u8]) -> (u32, bool) {
    let mut text_ops = 0u32;
    let mut has_images = false;

    let ends_operator = |idx: usize| idx >= content.len() || content[idx].is_ascii_whitespace();
    let starts_operator = |idx: usize| {
        idx == 0
            || content[idx - 1].is_ascii_whitespace()
            || content[idx - 1] == b')'
            || content[idx - 1] == b']'
            || content[idx - 1] == b'>'
    };

    let mut i = 0;
    while i < content.len() {
        let b = content[i];

        if b == b'T' && i + 1 < content.len() {
            let next = content[i + 1];
            if (next == b'j' || next == b'J') && ends_operator(i + 2) {
                text_ops += 1;
            }
        }

        // ' and " only count after a closing literal or hex string
        if (b == b'\'' || b == b'"') && i > 0 && ends_operator(i + 1) {
            let mut j = i;
            while j > 0 && content[j - 1].is_ascii_whitespace() {
                j -= 1;
            }
            if j > 0 && (content[j - 1] == b')' || content[j - 1] == b'>') {
                text_ops += 1;
            }
        }

        if b == b'D'
            && i + 1 < content.len()
            && content[i + 1] == b'o'
            && starts_operator(i)
            && ends_operator(i + 2)
        {
            has_images = true;
        }

        i += 1;
    }

    (text_ops, has_images)
}

//! Batch PDF analysis: text extraction, publisher format detection and
//! pairwise similarity
//!
//! This crate provides:
//! - Text extraction from PDFs, reading the embedded text layer first and
//!   falling back to rasterization + OCR for scanned documents
//! - Heuristic detection of the publisher/venue format of a paper
//! - TF-IDF cosine similarity across a batch of documents
//! - A batch pipeline producing a serializable report

pub mod batch;
pub mod classifier;
pub mod detector;
pub mod extractor;
pub mod report;
pub mod similarity;
pub mod stop_words;

pub use batch::{
    analyze_paths, analyze_paths_with, analyze_uploads, analyze_uploads_with, is_pdf_filename,
    UploadedFile,
};
pub use classifier::{classify, Classification, FormatTag};
pub use detector::{inspect_text_layer, TextLayerReport};
pub use extractor::{
    ExtractionConfig, ExtractionStrategy, OcrStrategy, TextExtractor, TextLayerStrategy,
};
pub use report::{AnalysisReport, DocumentResult, SimilarityEntry};
pub use similarity::{score, SimilarityMatrix};

#[derive(Debug, thiserror::Error)]
pub enum PaperError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Page rasterization failed: {0}")]
    Rasterize(String),
    #[error("OCR failed: {0}")]
    Ocr(String),
    #[error("External tool unavailable: {0}")]
    ToolUnavailable(String),
}

impl From<lopdf::Error> for PaperError {
    fn from(e: lopdf::Error) -> Self {
        PaperError::Parse(e.to_string())
    }
}

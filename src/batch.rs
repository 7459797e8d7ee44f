//! Batch pipeline: extract and classify every PDF, then score similarity
//!
//! Uploaded bytes are written into a per-batch temporary directory that is
//! removed when the batch finishes, whether or not extraction succeeded.
//! Nothing here returns an error; failures degrade to empty text.

use crate::classifier::classify;
use crate::extractor::TextExtractor;
use crate::report::{AnalysisReport, DocumentResult};
use crate::similarity::score;
use crate::PaperError;
use std::path::{Path, PathBuf};

/// A file received from the upload boundary
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Whether `name` ends in ".pdf", ignoring case
pub fn is_pdf_filename(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

/// Analyze uploaded files with the default extractor
pub fn analyze_uploads(files: &[UploadedFile]) -> AnalysisReport {
    analyze_uploads_with(&TextExtractor::default(), files)
}

/// Analyze uploaded files. Non-PDF uploads are skipped silently.
pub fn analyze_uploads_with(extractor: &TextExtractor, files: &[UploadedFile]) -> AnalysisReport {
    let workdir = match tempfile::Builder::new()
        .prefix("paper-inspector-batch")
        .tempdir()
    {
        Ok(dir) => Some(dir),
        Err(e) => {
            log::warn!("cannot create batch working directory: {}", e);
            None
        }
    };

    let mut batch = Batch::default();
    for file in files {
        if !is_pdf_filename(&file.filename) {
            log::debug!("skipping non-PDF upload {:?}", file.filename);
            continue;
        }

        let text = match workdir.as_ref().map(|dir| store_upload(dir.path(), file)) {
            Some(Ok(path)) => extractor.extract(&path),
            Some(Err(e)) => {
                log::warn!("cannot store upload {:?}: {}", file.filename, e);
                String::new()
            }
            None => String::new(),
        };
        batch.push(&file.filename, text);
    }

    batch.finish()
}

/// Analyze PDF files already on disk with the default extractor
pub fn analyze_paths<P: AsRef<Path>>(paths: &[P]) -> AnalysisReport {
    analyze_paths_with(&TextExtractor::default(), paths)
}

/// Analyze PDF files already on disk, named by their final path component
pub fn analyze_paths_with<P: AsRef<Path>>(extractor: &TextExtractor, paths: &[P]) -> AnalysisReport {
    let mut batch = Batch::default();
    for path in paths {
        let path = path.as_ref();
        let name = display_name(path);
        if !is_pdf_filename(&name) {
            log::debug!("skipping non-PDF file {}", path.display());
            continue;
        }
        batch.push(&name, extractor.extract(path));
    }
    batch.finish()
}

/// Write an upload under `dir`, keeping only the final component of its name
fn store_upload(dir: &Path, file: &UploadedFile) -> Result<PathBuf, PaperError> {
    let name = display_name(Path::new(&file.filename));
    if name.is_empty() {
        return Err(PaperError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "upload has no usable file name",
        )));
    }
    let path = dir.join(name);
    std::fs::write(&path, &file.bytes)?;
    Ok(path)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Documents processed so far, in upload order
#[derive(Default)]
struct Batch {
    filenames: Vec<String>,
    texts: Vec<String>,
    results: Vec<DocumentResult>,
}

impl Batch {
    fn push(&mut self, filename: &str, text: String) {
        let classification = classify(&text);
        log::debug!(
            "{}: {} ({}%), {} chars",
            filename,
            classification.format,
            classification.confidence,
            text.len()
        );
        self.results.push(DocumentResult::new(filename, classification));
        self.filenames.push(filename.to_string());
        self.texts.push(text);
    }

    fn finish(self) -> AnalysisReport {
        let matrix = score(&self.texts);
        let similarity = AnalysisReport::similarity_entries(&self.filenames, matrix.as_ref());
        log::info!(
            "analyzed {} document(s), {} similarity pair(s)",
            self.results.len(),
            similarity.len()
        );
        AnalysisReport {
            results: self.results,
            similarity,
        }
    }
}

//! Text extraction from PDF with OCR fallback
//!
//! Extraction runs an ordered chain of strategies over a shared text buffer.
//! The embedded text layer is read first through lopdf; if that yields
//! nothing, pages are rasterized with `pdftoppm` and recognized with
//! `tesseract`.

use crate::detector::inspect_text_layer;
use crate::PaperError;
use lopdf::Document;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Configuration for text extraction
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Path to the `pdftoppm` binary (default: "pdftoppm", relies on PATH)
    pub pdftoppm_path: String,
    /// Path to the `tesseract` binary (default: "tesseract", relies on PATH)
    pub tesseract_path: String,
    /// Tesseract language (default: "eng")
    pub language: String,
    /// Rasterization resolution in DPI (default: 200)
    pub dpi: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pdftoppm_path: "pdftoppm".to_string(),
            tesseract_path: "tesseract".to_string(),
            language: "eng".to_string(),
            dpi: 200,
        }
    }
}

/// One way of turning a PDF into text.
///
/// Implementations append page text to `out` as they go, so whatever was
/// read before an error is kept by the caller.
pub trait ExtractionStrategy {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    fn extract_into(&self, path: &Path, out: &mut String) -> Result<(), PaperError>;
}

/// Reads the embedded text layer page by page
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayerStrategy;

impl ExtractionStrategy for TextLayerStrategy {
    fn name(&self) -> &'static str {
        "text-layer"
    }

    fn extract_into(&self, path: &Path, out: &mut String) -> Result<(), PaperError> {
        let doc = Document::load(path)?;
        let report = inspect_text_layer(&doc);

        if report.looks_scanned() {
            log::debug!(
                "{}: no text operators on {} image page(s), looks scanned",
                path.display(),
                report.pages_with_images
            );
        }

        for page_num in doc.get_pages().keys().copied() {
            let page_text = doc.extract_text(&[page_num])?;
            if !page_text.is_empty() {
                out.push_str(&page_text);
                out.push('\n');
            }
        }

        Ok(())
    }
}

/// Rasterizes every page and runs OCR on the images
#[derive(Debug, Clone)]
pub struct OcrStrategy {
    config: ExtractionConfig,
}

impl OcrStrategy {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Render all pages of `path` to PNG files inside `dir`, in page order
    fn rasterize(&self, path: &Path, dir: &Path) -> Result<Vec<PathBuf>, PaperError> {
        let output = run_tool(
            Command::new(&self.config.pdftoppm_path)
                .arg("-png")
                .arg("-r")
                .arg(self.config.dpi.to_string())
                .arg(path.as_os_str())
                .arg(dir.join("page").as_os_str()),
            &self.config.pdftoppm_path,
        )?;

        if !output.status.success() {
            return Err(PaperError::Rasterize(format!(
                "pdftoppm exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut images: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")))
            .filter_map(|p| page_index(&p).map(|n| (n, p)))
            .collect();
        images.sort_by_key(|(n, _)| *n);

        Ok(images.into_iter().map(|(_, p)| p).collect())
    }

    fn recognize(&self, image: &Path) -> Result<String, PaperError> {
        let output = run_tool(
            Command::new(&self.config.tesseract_path)
                .arg(image.as_os_str())
                .arg("stdout")
                .arg("-l")
                .arg(&self.config.language),
            &self.config.tesseract_path,
        )?;

        if !output.status.success() {
            return Err(PaperError::Ocr(format!(
                "tesseract exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ExtractionStrategy for OcrStrategy {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn extract_into(&self, path: &Path, out: &mut String) -> Result<(), PaperError> {
        // Page images are removed when `workdir` drops, on every return path
        let workdir = tempfile::Builder::new()
            .prefix("paper-inspector-ocr")
            .tempdir()?;

        let images = self.rasterize(path, workdir.path())?;
        log::debug!("{}: rasterized {} page(s) for OCR", path.display(), images.len());

        for image in &images {
            let text = self.recognize(image)?;
            out.push_str(&text);
            out.push('\n');
        }

        Ok(())
    }
}

/// Spawn an external tool, mapping a missing binary to `ToolUnavailable`
fn run_tool(command: &mut Command, tool: &str) -> Result<Output, PaperError> {
    command.output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            PaperError::ToolUnavailable(format!("'{}' not found on PATH", tool))
        } else {
            PaperError::Io(e)
        }
    })
}

/// Page number from a pdftoppm output name such as `page-07.png`
fn page_index(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let (_, number) = stem.rsplit_once('-')?;
    number.parse().ok()
}

/// Ordered chain of extraction strategies
pub struct TextExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl TextExtractor {
    /// Text layer first, then OCR
    pub fn new(config: ExtractionConfig) -> Self {
        Self::with_strategies(vec![
            Box::new(TextLayerStrategy),
            Box::new(OcrStrategy::new(config)),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Extract the plain text of the PDF at `path`.
    ///
    /// Never fails: strategy errors are logged and whatever text was read
    /// before the error is kept. Later strategies only run while the text
    /// gathered so far is blank. The result is trimmed and may be empty.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> String {
        let path = path.as_ref();
        let mut text = String::new();

        for strategy in &self.strategies {
            if !text.trim().is_empty() {
                break;
            }
            match strategy.extract_into(path, &mut text) {
                Ok(()) => log::debug!(
                    "{}: {} strategy produced {} chars",
                    path.display(),
                    strategy.name(),
                    text.trim().len()
                ),
                Err(e) => log::warn!(
                    "{}: {} extraction failed: {}",
                    path.display(),
                    strategy.name(),
                    e
                ),
            }
        }

        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Fixed {
        text: &'static str,
        fail: bool,
        calls: Rc<Cell<u32>>,
    }

    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn extract_into(&self, _path: &Path, out: &mut String) -> Result<(), PaperError> {
            self.calls.set(self.calls.get() + 1);
            out.push_str(self.text);
            if self.fail {
                Err(PaperError::Parse("broken".into()))
            } else {
                Ok(())
            }
        }
    }

    /// Two-step chain, returning the call counter of the second step
    fn chain(
        first: (&'static str, bool),
        second: (&'static str, bool),
    ) -> (TextExtractor, Rc<Cell<u32>>) {
        let second_calls = Rc::new(Cell::new(0));
        let extractor = TextExtractor::with_strategies(vec![
            Box::new(Fixed {
                text: first.0,
                fail: first.1,
                calls: Rc::new(Cell::new(0)),
            }),
            Box::new(Fixed {
                text: second.0,
                fail: second.1,
                calls: Rc::clone(&second_calls),
            }),
        ]);
        (extractor, second_calls)
    }

    #[test]
    fn test_first_strategy_wins() {
        let (extractor, second) = chain(("  embedded text \n", false), ("ocr text", false));
        assert_eq!(extractor.extract("doc.pdf"), "embedded text");
        assert_eq!(second.get(), 0);
    }

    #[test]
    fn test_blank_output_falls_through() {
        let (extractor, second) = chain((" \n\t", false), ("recognized\n", false));
        assert_eq!(extractor.extract("doc.pdf"), "recognized");
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_partial_text_kept_on_failure() {
        let (extractor, second) = chain(("page one\n", true), ("ocr", false));
        assert_eq!(extractor.extract("doc.pdf"), "page one");
        assert_eq!(second.get(), 0);
    }

    #[test]
    fn test_all_strategies_fail() {
        let (extractor, second) = chain(("", true), ("", true));
        assert_eq!(extractor.extract("doc.pdf"), "");
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_page_index() {
        assert_eq!(page_index(Path::new("/tmp/x/page-1.png")), Some(1));
        assert_eq!(page_index(Path::new("/tmp/x/page-012.png")), Some(12));
        assert_eq!(page_index(Path::new("/tmp/x/cover.png")), None);
    }

    #[test]
    fn test_missing_ocr_tool_is_reported() {
        let config = ExtractionConfig {
            pdftoppm_path: "definitely-not-a-real-pdftoppm".into(),
            ..Default::default()
        };
        let strategy = OcrStrategy::new(config);
        let mut out = String::new();
        let err = strategy
            .extract_into(Path::new("missing.pdf"), &mut out)
            .unwrap_err();
        assert!(matches!(err, PaperError::ToolUnavailable(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_config_default() {
        let config = ExtractionConfig::default();
        assert_eq!(config.language, "eng");
        assert_eq!(config.dpi, 200);
    }

    /// Write an executable shell script standing in for an external tool
    #[cfg(unix)]
    fn fake_tool(dir: &Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// pdftoppm stand-in: writes pages 1, 2 and 10 next to the output prefix,
    /// plus a file that is not a page image
    #[cfg(unix)]
    fn fake_config(dir: &Path, tesseract_body: &str) -> ExtractionConfig {
        let pdftoppm = fake_tool(
            dir,
            "pdftoppm",
            r#"prefix="$5"
for n in 10 2 1; do : > "$prefix-$n.png"; done
: > "$(dirname "$prefix")/notes.txt""#,
        );
        let tesseract = fake_tool(dir, "tesseract", tesseract_body);
        ExtractionConfig {
            pdftoppm_path: pdftoppm,
            tesseract_path: tesseract,
            ..Default::default()
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_ocr_reads_pages_in_numeric_order() {
        let tools = tempfile::tempdir().unwrap();
        let config = fake_config(tools.path(), r#"printf '%s' "$(basename "$1" .png)""#);
        let strategy = OcrStrategy::new(config);

        let mut out = String::new();
        strategy
            .extract_into(Path::new("scan.pdf"), &mut out)
            .unwrap();
        assert_eq!(out, "page-1\npage-2\npage-10\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_ocr_failure_keeps_earlier_pages() {
        let tools = tempfile::tempdir().unwrap();
        let config = fake_config(
            tools.path(),
            r#"case "$1" in *page-2.png) echo "cannot read image" >&2; exit 1;; esac
printf '%s' "$(basename "$1" .png)""#,
        );

        let strategy = OcrStrategy::new(config.clone());
        let mut out = String::new();
        let err = strategy
            .extract_into(Path::new("scan.pdf"), &mut out)
            .unwrap_err();
        assert!(matches!(err, PaperError::Ocr(ref msg) if msg.contains("cannot read image")));
        assert_eq!(out, "page-1\n");

        let extractor = TextExtractor::with_strategies(vec![Box::new(OcrStrategy::new(config))]);
        assert_eq!(extractor.extract("scan.pdf"), "page-1");
    }

    #[cfg(unix)]
    #[test]
    fn test_rasterize_failure_is_reported() {
        let tools = tempfile::tempdir().unwrap();
        let config = ExtractionConfig {
            pdftoppm_path: fake_tool(tools.path(), "pdftoppm", "echo 'Syntax Error' >&2; exit 99"),
            ..Default::default()
        };
        let mut out = String::new();
        let err = OcrStrategy::new(config)
            .extract_into(Path::new("scan.pdf"), &mut out)
            .unwrap_err();
        assert!(matches!(err, PaperError::Rasterize(ref msg) if msg.contains("99")));
        assert!(out.is_empty());
    }
}

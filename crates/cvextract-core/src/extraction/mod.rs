pub mod pdftoppm;
pub mod pdftotext;
pub mod workspace;

use crate::error::CvError;
use crate::normalize::normalize_text;
use std::path::{Path, PathBuf};
use workspace::Workspace;

/// Text layer of a single PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

/// A rasterized page written into a [`Workspace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub page_number: usize,
    pub path: PathBuf,
}

/// Trait for native PDF text extraction backends.
pub trait TextExtractor: Send + Sync {
    /// Extract the text layer from PDF bytes, one PageText per page in document order.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, CvError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Trait for PDF-to-image backends used when a PDF has no usable text layer.
pub trait PageRasterizer: Send + Sync {
    /// Render every page into `workspace`, clearing stale page images first.
    ///
    /// Returns exactly one image per page, ordered and numbered from 1.
    fn rasterize(&self, pdf_path: &Path, workspace: &Workspace) -> Result<Vec<PageImage>, CvError>;

    fn backend_name(&self) -> &str;
}

/// Check that `path` exists and carries a `.pdf` extension (any case).
pub fn validate_pdf_path(path: &Path) -> Result<(), CvError> {
    if !has_pdf_extension(path) {
        return Err(CvError::InvalidInput(format!(
            "'{}' is not a PDF file",
            path.display()
        )));
    }
    if !path.exists() {
        return Err(CvError::InvalidInput(format!(
            "'{}' does not exist",
            path.display()
        )));
    }
    Ok(())
}

pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Extract and normalize the native text layer of the PDF at `path`.
pub fn extract_native(path: &Path, extractor: &dyn TextExtractor) -> Result<String, CvError> {
    validate_pdf_path(path)?;

    // The file may vanish between the check above and this read.
    let pdf_bytes = read_pdf(path)?;

    let pages = extractor.extract_pages(&pdf_bytes)?;
    tracing::debug!(
        path = %path.display(),
        backend = extractor.backend_name(),
        pages = pages.len(),
        "native text extracted"
    );

    Ok(normalize_text(&join_pages(&pages)))
}

/// Read the PDF bytes, mapping a missing file to [`CvError::NotFound`].
fn read_pdf(path: &Path) -> Result<Vec<u8>, CvError> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CvError::NotFound(path.to_path_buf())
        } else {
            CvError::Io(e)
        }
    })
}

/// Concatenate page texts in page order, each followed by a newline.
pub fn join_pages(pages: &[PageText]) -> String {
    let mut ordered: Vec<&PageText> = pages.iter().collect();
    ordered.sort_by_key(|p| p.page_number);

    let mut out = String::new();
    for page in ordered {
        out.push_str(&page.text);
        out.push('\n');
    }
    out
}

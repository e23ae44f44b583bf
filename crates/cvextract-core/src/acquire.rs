//! Text acquisition: native text layer first, page OCR when the PDF is flat.
//!
//! ```text
//! Start -> NativeAttempt -> Accepted
//!                        -> FlattenAttempt -> Accepted | Failed
//! ```
//!
//! There are no retries across states. Native text is normalized; OCR text is
//! returned exactly as transcribed, one page per line group.

use crate::config::ExtractionConfig;
use crate::error::CvError;
use crate::extraction::workspace::Workspace;
use crate::extraction::{
    extract_native, validate_pdf_path, PageImage, PageRasterizer, TextExtractor,
};
use crate::llm::VisionClient;
use crate::normalize::{is_flat, non_whitespace_len};
use futures_util::{StreamExt, TryStreamExt};
use std::path::Path;
use std::sync::Arc;

/// Which path produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Native,
    Ocr { pages: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredText {
    pub text: String,
    pub source: TextSource,
}

pub struct Acquirer {
    extractor: Arc<dyn TextExtractor>,
    rasterizer: Arc<dyn PageRasterizer>,
    vision: Arc<dyn VisionClient>,
    flat_threshold: usize,
    ocr_concurrency: usize,
}

impl Acquirer {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        rasterizer: Arc<dyn PageRasterizer>,
        vision: Arc<dyn VisionClient>,
        config: &ExtractionConfig,
    ) -> Self {
        Acquirer {
            extractor,
            rasterizer,
            vision,
            flat_threshold: config.flat_threshold,
            ocr_concurrency: config.ocr_concurrency.max(1),
        }
    }

    /// Recover plain text from the PDF at `path`.
    ///
    /// `workspace` is only touched when the PDF turns out to be flat; it is
    /// cleared before any page image is written.
    pub async fn get_content(&self, path: &Path, workspace: &Workspace) -> Result<AcquiredText, CvError> {
        validate_pdf_path(path)?;

        let native = {
            let extractor = Arc::clone(&self.extractor);
            let path = path.to_path_buf();
            run_blocking(move || extract_native(&path, extractor.as_ref())).await?
        };

        let chars = non_whitespace_len(&native);
        if !is_flat(&native, self.flat_threshold) {
            tracing::info!(path = %path.display(), chars, "native text accepted");
            return Ok(AcquiredText {
                text: native,
                source: TextSource::Native,
            });
        }

        tracing::info!(
            path = %path.display(),
            chars,
            threshold = self.flat_threshold,
            "detected flat/image PDF, falling back to page OCR"
        );

        let images = {
            let rasterizer = Arc::clone(&self.rasterizer);
            let path = path.to_path_buf();
            // Non-owning handle: dropping it never removes the directory.
            let workspace = Workspace::at(workspace.path());
            run_blocking(move || rasterizer.rasterize(&path, &workspace)).await?
        };

        let text = self.transcribe_pages(&images).await?;
        tracing::info!(path = %path.display(), pages = images.len(), "page OCR complete");

        Ok(AcquiredText {
            text,
            source: TextSource::Ocr {
                pages: images.len(),
            },
        })
    }

    /// Transcribe every page and concatenate in page order, each page
    /// followed by a newline. Up to `ocr_concurrency` requests run at once;
    /// `buffered` yields results in input order regardless of completion order.
    async fn transcribe_pages(&self, images: &[PageImage]) -> Result<String, CvError> {
        let mut ordered: Vec<&PageImage> = images.iter().collect();
        ordered.sort_by_key(|image| image.page_number);
        let total = ordered.len();

        let pages: Vec<String> = futures_util::stream::iter(ordered)
            .map(|image| async move {
                tracing::debug!(page = image.page_number, total, "transcribing page");
                self.vision.transcribe(image).await
            })
            .buffered(self.ocr_concurrency)
            .try_collect()
            .await?;

        let mut text = String::new();
        for page in pages {
            text.push_str(&page);
            text.push('\n');
        }
        Ok(text)
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, CvError>
where
    F: FnOnce() -> Result<T, CvError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CvError::Io(std::io::Error::other(e)))?
}

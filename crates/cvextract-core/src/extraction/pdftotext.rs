use crate::error::{CvError, POPPLER_HINT};
use crate::extraction::{PageText, TextExtractor};
use std::io::Write;
use std::process::Command;

/// Text extraction backend using pdftotext (from poppler-utils).
///
/// Runs in raw reading order, without `-layout`: the text comes out in
/// whatever order the embedded text layer stores it.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, CvError> {
        // Write PDF bytes to a temp file
        let mut tmpfile = tempfile::Builder::new().suffix(".pdf").tempfile()?;
        tmpfile.write_all(pdf_bytes)?;
        tmpfile.flush()?;

        let output = Command::new("pdftotext")
            .arg("-enc")
            .arg("UTF-8")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CvError::DependencyMissing {
                        tool: "pdftotext",
                        hint: POPPLER_HINT,
                    }
                } else {
                    CvError::Io(e)
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(CvError::ExtractionFailed { code, stderr });
        }

        Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Split pdftotext output into pages.
///
/// pdftotext terminates every page with a form feed, so the final segment
/// after the last `\x0c` is not a page.
fn split_pages(text: &str) -> Vec<PageText> {
    let mut segments: Vec<&str> = text.split('\x0c').collect();
    if segments.len() > 1 && segments.last().is_some_and(|s| s.trim().is_empty()) {
        segments.pop();
    }

    segments
        .into_iter()
        .enumerate()
        .map(|(i, page_text)| PageText {
            page_number: i + 1,
            text: page_text.to_string(),
        })
        .collect()
}

use crate::error::CvError;
use crate::extraction::workspace::{Workspace, IMAGE_EXT, RENDER_PREFIX};
use crate::extraction::{PageImage, PageRasterizer};
use std::path::Path;
use std::process::Command;

pub const DEFAULT_DPI: u32 = 150;

/// Rasterization backend using pdftoppm (from poppler-utils).
pub struct PdftoppmRasterizer {
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(dpi: u32) -> Self {
        PdftoppmRasterizer { dpi }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Check if pdftoppm is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftoppm")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf_path: &Path, workspace: &Workspace) -> Result<Vec<PageImage>, CvError> {
        workspace.clear()?;

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf_path)
            .arg(workspace.path().join(RENDER_PREFIX))
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CvError::ConversionUnavailable
                } else {
                    CvError::Io(e)
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(CvError::ConversionFailed { code, stderr });
        }

        let images = collect_page_images(workspace, RENDER_PREFIX)?;
        tracing::info!(
            pdf = %pdf_path.display(),
            pages = images.len(),
            dpi = self.dpi,
            workspace = %workspace.path().display(),
            "rendered pages to images"
        );
        Ok(images)
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}

/// Rename `{prefix}-{n}.png` render outputs to `{n}.png` and return them in
/// page order.
///
/// pdftoppm zero-pads the page number depending on the page count
/// (`render-7.png`, `render-07.png`, ...), and directory listings are not
/// sorted, so the order comes from the parsed number alone. The pages must
/// form a contiguous 1..=N run.
pub fn collect_page_images(workspace: &Workspace, prefix: &str) -> Result<Vec<PageImage>, CvError> {
    let mut rendered: Vec<(usize, std::path::PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(workspace.path())? {
        let path = entry?.path();
        if let Some(page_number) = parse_page_number(&path, prefix) {
            rendered.push((page_number, path));
        }
    }
    rendered.sort_by_key(|(n, _)| *n);

    if rendered.is_empty() {
        return Err(CvError::ConversionFailed {
            code: 0,
            stderr: "pdftoppm produced no images".into(),
        });
    }

    let mut images = Vec::with_capacity(rendered.len());
    for (expected, (page_number, from)) in (1..).zip(rendered) {
        if page_number != expected {
            return Err(CvError::ConversionFailed {
                code: 0,
                stderr: format!("missing rendered image for page {expected}"),
            });
        }
        let to = workspace.page_path(page_number, IMAGE_EXT);
        std::fs::rename(&from, &to)?;
        images.push(PageImage {
            page_number,
            path: to,
        });
    }
    Ok(images)
}

fn parse_page_number(path: &Path, prefix: &str) -> Option<usize> {
    if path.extension()? != IMAGE_EXT {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(prefix)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

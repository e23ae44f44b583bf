use crate::error::CvError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name prefix handed to the renderer before pages are renamed to `{n}.png`.
pub const RENDER_PREFIX: &str = "render";
pub const IMAGE_EXT: &str = "png";

/// Scratch directory that holds page images during a flattening run.
///
/// A temporary workspace is removed when dropped. A fixed workspace lives at
/// a configured path and survives the process. In both, [`Workspace::clear`]
/// drops the previous run's page images at the start of every run.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    temp: Option<TempDir>,
}

impl Workspace {
    /// Fresh, private directory removed on drop.
    pub fn temporary() -> Result<Self, CvError> {
        let temp = tempfile::Builder::new().prefix("cvextract-").tempdir()?;
        Ok(Workspace {
            root: temp.path().to_path_buf(),
            temp: Some(temp),
        })
    }

    /// Workspace at a fixed path. The directory is created lazily.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Workspace {
            root: path.into(),
            temp: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Create the directory if needed and remove the page images left by a
    /// previous run (`{n}.png` and `render-{n}.png`).
    ///
    /// Anything else in the directory is left alone, so pointing a fixed
    /// workspace at a directory with other content never deletes that content.
    pub fn clear(&self) -> Result<(), CvError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)?;
            return Ok(());
        }

        let mut removed = 0usize;
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if name.to_str().is_some_and(is_page_image_name) {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(workspace = %self.root.display(), removed, "cleared stale page images");
        }
        Ok(())
    }

    /// Path of the image for a 1-based page number.
    pub fn page_path(&self, page_number: usize, ext: &str) -> PathBuf {
        self.root.join(format!("{page_number}.{ext}"))
    }
}

/// `7.png` or `render-07.png`.
fn is_page_image_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(IMAGE_EXT).and_then(|s| s.strip_suffix('.')) else {
        return false;
    };
    let digits = match stem.strip_prefix(RENDER_PREFIX) {
        Some(rest) => match rest.strip_prefix('-') {
            Some(d) => d,
            None => return false,
        },
        None => stem,
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_is_removed_on_drop() {
        let ws = Workspace::temporary().unwrap();
        let root = ws.path().to_path_buf();
        std::fs::write(ws.page_path(1, "png"), b"png").unwrap();
        assert!(root.exists());
        drop(ws);
        assert!(!root.exists());
    }

    #[test]
    fn test_clear_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::at(dir.path().join("work").join("images"));
        assert!(!ws.path().exists());
        ws.clear().unwrap();
        assert!(ws.path().is_dir());
        assert!(!ws.is_temporary());
    }

    #[test]
    fn test_clear_removes_only_page_images() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::at(dir.path());
        std::fs::write(ws.page_path(1, IMAGE_EXT), b"a").unwrap();
        std::fs::write(ws.page_path(12, IMAGE_EXT), b"b").unwrap();
        std::fs::write(dir.path().join("render-03.png"), b"c").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();
        std::fs::write(dir.path().join("logo.png"), b"keep").unwrap();
        std::fs::create_dir(dir.path().join("INPUT")).unwrap();
        std::fs::write(dir.path().join("INPUT").join("cv.pdf"), b"%PDF").unwrap();
        std::fs::create_dir(dir.path().join("7.png")).unwrap();

        ws.clear().unwrap();

        let mut left: Vec<String> = std::fs::read_dir(ws.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["7.png", "INPUT", "logo.png", "notes.txt"]);
        assert!(dir.path().join("INPUT").join("cv.pdf").exists());
    }

    #[test]
    fn test_page_image_names() {
        assert!(is_page_image_name("1.png"));
        assert!(is_page_image_name("render-007.png"));
        assert!(!is_page_image_name("render.png"));
        assert!(!is_page_image_name("renderx-1.png"));
        assert!(!is_page_image_name("cv.pdf"));
        assert!(!is_page_image_name(".png"));
        assert!(!is_page_image_name("1.png.bak"));
    }

    #[test]
    fn test_page_path_naming() {
        let ws = Workspace::at("/tmp/ws");
        assert_eq!(ws.page_path(3, "png"), PathBuf::from("/tmp/ws/3.png"));
    }
}

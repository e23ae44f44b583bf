use crate::acquire::{AcquiredText, Acquirer};
use crate::config::Config;
use crate::error::CvError;
use crate::extraction::has_pdf_extension;
use crate::extraction::workspace::Workspace;
use crate::llm::ChatClient;
use crate::model::{to_pretty_json, CandidateProfile};
use crate::profile::extract_profile;
use crate::validate::validate_profile;
use futures_util::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A document that could not be processed.
#[derive(Debug, Clone)]
pub struct Skipped {
    pub file: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub found: usize,
    pub written: Vec<PathBuf>,
    pub skipped: Vec<Skipped>,
}

enum WorkspacePolicy {
    /// Each document gets its own temporary directory.
    PerDocument,
    /// One fixed directory; flattening runs are serialized through the lock.
    Shared(Mutex<Workspace>),
}

pub struct BatchRunner {
    acquirer: Acquirer,
    chat: Arc<dyn ChatClient>,
    workspace: WorkspacePolicy,
    output_dir: PathBuf,
    workers: usize,
}

impl BatchRunner {
    pub fn new(acquirer: Acquirer, chat: Arc<dyn ChatClient>, config: &Config) -> Self {
        let workspace = match &config.extraction.workspace_dir {
            Some(dir) => WorkspacePolicy::Shared(Mutex::new(Workspace::at(dir))),
            None => WorkspacePolicy::PerDocument,
        };
        BatchRunner {
            acquirer,
            chat,
            workspace,
            output_dir: config.batch.output_dir.clone(),
            workers: config.batch.workers.max(1),
        }
    }

    /// Process every PDF in `input_dir`, writing one JSON file per document.
    pub async fn run_dir(&self, input_dir: &Path) -> Result<BatchReport, CvError> {
        let inputs = discover_inputs(input_dir)?;
        tracing::info!(dir = %input_dir.display(), count = inputs.len(), "found input file(s)");
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(self.run(&inputs).await)
    }

    /// Process `inputs`. A failing document is logged and skipped; the batch
    /// always runs to the end.
    pub async fn run(&self, inputs: &[PathBuf]) -> BatchReport {
        let results: Vec<(&PathBuf, Result<PathBuf, CvError>)> = futures_util::stream::iter(inputs)
            .map(|path| async move { (path, self.process(path).await) })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let mut report = BatchReport {
            found: inputs.len(),
            ..BatchReport::default()
        };
        for (path, result) in results {
            match result {
                Ok(written) => report.written.push(written),
                Err(e) => {
                    if e.is_missing_dependency() {
                        tracing::error!(file = %path.display(), error = %e, "missing system dependency, skipping document");
                    } else {
                        tracing::warn!(file = %path.display(), error = %e, "skipping document");
                    }
                    report.skipped.push(Skipped {
                        file: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        report.written.sort();
        report.skipped.sort_by(|a, b| a.file.cmp(&b.file));
        report
    }

    /// Run one document through acquisition, profile extraction, validation
    /// and output. Returns the path of the written JSON file.
    pub async fn process(&self, path: &Path) -> Result<PathBuf, CvError> {
        let file_name = file_name(path)?;
        tracing::info!(file = %file_name, "processing");

        let acquired = self.acquire(path).await?;
        let profile = self.parse(&file_name, &acquired.text).await?;
        let written = write_profile(&self.output_dir, &file_name, &profile)?;

        tracing::info!(file = %file_name, output = %written.display(), "result saved");
        Ok(written)
    }

    /// Acquisition only, with the configured workspace policy.
    pub async fn acquire(&self, path: &Path) -> Result<AcquiredText, CvError> {
        match &self.workspace {
            WorkspacePolicy::PerDocument => {
                let workspace = Workspace::temporary()?;
                self.acquirer.get_content(path, &workspace).await
            }
            WorkspacePolicy::Shared(lock) => {
                let workspace = lock.lock().await;
                self.acquirer.get_content(path, &workspace).await
            }
        }
    }

    /// Profile extraction plus field validation.
    pub async fn parse(&self, file_name: &str, content: &str) -> Result<CandidateProfile, CvError> {
        let profile = extract_profile(self.chat.as_ref(), file_name, content).await?;
        Ok(validate_profile(self.chat.as_ref(), profile).await)
    }
}

/// Regular files directly inside `dir` with a `.pdf` extension (any case),
/// sorted by path.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>, CvError> {
    if !dir.is_dir() {
        return Err(CvError::InvalidInput(format!(
            "input directory '{}' does not exist",
            dir.display()
        )));
    }

    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_pdf_extension(&path) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// `name.pdf` -> `<output_dir>/name.pdf.json`.
pub fn output_path(output_dir: &Path, file_name: &str) -> PathBuf {
    output_dir.join(format!("{file_name}.json"))
}

/// Write the profile atomically: a temp file in `output_dir`, then a rename.
pub fn write_profile(
    output_dir: &Path,
    file_name: &str,
    profile: &CandidateProfile,
) -> Result<PathBuf, CvError> {
    let json = to_pretty_json(profile)?;
    let target = output_path(output_dir, file_name);

    let mut tmp = tempfile::NamedTempFile::new_in(output_dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.persist(&target).map_err(|e| CvError::Io(e.error))?;
    Ok(target)
}

fn file_name(path: &Path) -> Result<String, CvError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CvError::InvalidInput(format!("'{}' has no file name", path.display())))
}
